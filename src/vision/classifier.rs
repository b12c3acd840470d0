// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Binary image classifier
//!
//! `ImageClassifier` runs decode -> resize -> crop -> normalize -> infer ->
//! softmax -> decide. The model itself sits behind `InferenceBackend`;
//! `OnnxClassifierModel` is the ONNX Runtime implementation.

use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use image::DynamicImage;

use super::activation::{self, Activation};
use super::decision::DecisionPolicy;
use super::error::ClassificationError;
use super::image_utils::decode_image_bytes;
use super::preprocessing::{preprocess, NormalizedTensor};
use crate::config::{ModelConfig, PipelineConfig};

/// Runs the model: normalized tensor in, raw logits out
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, ClassificationError>;

    /// Human readable model name for logs and health output
    fn name(&self) -> &str {
        "classifier"
    }
}

/// ONNX classification model
///
/// Loaded once at startup. Runs on CPU; calls are serialized through the
/// session mutex.
#[derive(Clone)]
pub struct OnnxClassifierModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model output name
    output_name: String,
    /// File stem of the model artifact
    model_name: String,
}

impl std::fmt::Debug for OnnxClassifierModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifierModel")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifierModel {
    /// Load the classifier from an ONNX file
    ///
    /// # Errors
    /// Returns `ClassificationError::Inference` if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn load(config: &ModelConfig) -> Result<Self, ClassificationError> {
        let model_path: &Path = config.model_path.as_ref();

        if !model_path.exists() {
            return Err(ClassificationError::Inference(format!(
                "classifier model not found: {}",
                model_path.display()
            )));
        }

        info!("Loading classifier model from {}", model_path.display());

        let session = Session::builder()?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?
            .commit_from_file(model_path)
            .map_err(|e| {
                ClassificationError::Inference(format!(
                    "failed to load classifier model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        let input_name = match &config.input_name {
            Some(name) => name.clone(),
            None => session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| {
                    ClassificationError::Inference("classifier model has no inputs".to_string())
                })?,
        };

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                ClassificationError::Inference("classifier model has no outputs".to_string())
            })?;

        if let Some(input) = session.inputs.first() {
            debug!("Classifier model input type: {:?}", input.input_type);
        }

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        info!(
            "✅ Classifier model loaded (input: {}, output: {})",
            input_name, output_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            model_name,
        })
    }
}

impl InferenceBackend for OnnxClassifierModel {
    fn infer(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, ClassificationError> {
        let input_value = Value::from_array(tensor.as_array().to_owned())?;

        let mut session = self.session.lock().map_err(|_| {
            ClassificationError::Inference("classifier session lock poisoned".to_string())
        })?;

        let outputs = session.run(ort::inputs![&self.input_name => input_value])?;

        let output_tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = output_tensor.shape().to_vec();

        // Accept [N] or [1, N]
        let batch_ok = match shape.len() {
            1 => true,
            2 => shape[0] == 1,
            _ => false,
        };
        if !batch_ok {
            return Err(ClassificationError::Inference(format!(
                "unexpected output shape: {:?}, expected [1, N]",
                shape
            )));
        }

        let logits: Vec<f32> = output_tensor.iter().copied().collect();
        if logits.is_empty() {
            return Err(ClassificationError::Inference(
                "model returned an empty output".to_string(),
            ));
        }

        Ok(logits)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    /// Raw model output
    pub logits: Vec<f32>,
    /// Softmax of `logits`
    pub probabilities: Vec<f32>,
    pub processing_time_ms: u64,
}

impl ClassificationResult {
    /// Every activation applied to the raw logits
    pub fn diagnostics(&self) -> Vec<(Activation, Vec<f32>)> {
        Activation::ALL
            .iter()
            .map(|a| (*a, a.apply(&self.logits)))
            .collect()
    }

    pub fn argmax(&self) -> Option<usize> {
        activation::argmax(&self.probabilities)
    }
}

/// Full classification pipeline around an injected backend
pub struct ImageClassifier {
    backend: Arc<dyn InferenceBackend>,
    config: PipelineConfig,
    policy: DecisionPolicy,
}

impl std::fmt::Debug for ImageClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClassifier")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ImageClassifier {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: PipelineConfig) -> Self {
        let policy = config.decision_policy();
        Self {
            backend,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Classify PNG-encoded bytes
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<ClassificationResult, ClassificationError> {
        let (image, info) = decode_image_bytes(bytes)?;
        debug!(
            "Decoded image: {}x{}, {} bytes",
            info.width, info.height, info.size_bytes
        );
        self.classify_image(&image)
    }

    /// Classify an already decoded image
    pub fn classify_image(
        &self,
        image: &DynamicImage,
    ) -> Result<ClassificationResult, ClassificationError> {
        let start = Instant::now();

        let tensor = preprocess(image, &self.config)?;
        let logits = self.backend.infer(&tensor)?;
        let probabilities = activation::softmax(&logits);
        let label = self.policy.decide(&probabilities)?.to_string();

        let result = ClassificationResult {
            label,
            logits,
            probabilities,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        for (activation, values) in result.diagnostics() {
            debug!("{}: {:?}", activation, values);
        }

        Ok(result)
    }
}
