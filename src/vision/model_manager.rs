// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classifier model manager: owns the loaded model for the process lifetime

use std::sync::Arc;
use tokio::sync::RwLock;

use super::classifier::{ImageClassifier, InferenceBackend, OnnxClassifierModel};
use crate::config::{ModelConfig, PipelineConfig};

/// Information about the loaded classifier
#[derive(Debug, Clone)]
pub struct ClassifierModelInfo {
    /// Model name
    pub name: String,
    /// Path the model was loaded from
    pub path: String,
    /// Whether the model is available
    pub available: bool,
}

/// Manager for the classification model
///
/// Loaded once at startup and shared read-only by every request. A failed
/// load leaves the manager empty so the server still starts and reports the
/// failure per request.
pub struct ClassifierModelManager {
    classifier: RwLock<Option<Arc<ImageClassifier>>>,
    model_path: String,
}

impl ClassifierModelManager {
    /// Load the ONNX model and build the pipeline around it
    pub async fn new(model_config: &ModelConfig, pipeline: PipelineConfig) -> Self {
        let model_path = model_config.model_path.display().to_string();

        let classifier = match OnnxClassifierModel::load(model_config) {
            Ok(model) => {
                tracing::info!("✅ Classifier model loaded from {}", model_path);
                Some(Arc::new(ImageClassifier::new(Arc::new(model), pipeline)))
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load classifier model from {}: {}", model_path, e);
                None
            }
        };

        Self {
            classifier: RwLock::new(classifier),
            model_path,
        }
    }

    /// Wrap an already constructed backend
    pub fn with_backend(backend: Arc<dyn InferenceBackend>, pipeline: PipelineConfig) -> Self {
        let model_path = backend.name().to_string();
        Self {
            classifier: RwLock::new(Some(Arc::new(ImageClassifier::new(backend, pipeline)))),
            model_path,
        }
    }

    /// Manager with no model, every classification fails
    pub fn empty() -> Self {
        Self {
            classifier: RwLock::new(None),
            model_path: String::new(),
        }
    }

    /// Get the classifier if loaded
    pub async fn get_classifier(&self) -> Option<Arc<ImageClassifier>> {
        self.classifier.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.classifier.read().await.is_some()
    }

    pub async fn model_info(&self) -> ClassifierModelInfo {
        let guard = self.classifier.read().await;
        ClassifierModelInfo {
            name: guard
                .as_ref()
                .map(|c| c.backend_name().to_string())
                .unwrap_or_else(|| "classifier".to_string()),
            path: self.model_path.clone(),
            available: guard.is_some(),
        }
    }

    /// Release the model; in-flight requests keep their own `Arc`
    pub async fn shutdown(&self) {
        if self.classifier.write().await.take().is_some() {
            tracing::info!("Classifier model released");
        }
    }
}
