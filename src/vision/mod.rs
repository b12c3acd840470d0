// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for binary image classification
//!
//! This module provides:
//! - PNG decoding and the resize / crop / normalize preprocessing pipeline
//! - Activation functions and the threshold decision policy
//! - The ONNX classifier and the manager that owns it
//!
//! Inference runs on CPU.

pub mod activation;
pub mod classifier;
pub mod decision;
pub mod error;
pub mod image_utils;
pub mod model_manager;
pub mod preprocessing;

pub use classifier::{ClassificationResult, ImageClassifier, InferenceBackend, OnnxClassifierModel};
pub use decision::{ClassLabels, DecisionPolicy};
pub use error::ClassificationError;
pub use image_utils::{decode_image_bytes, detect_format, ImageInfo};
pub use model_manager::{ClassifierModelInfo, ClassifierModelManager};
pub use preprocessing::{NormalizationMode, NormalizedTensor, ResizeFilter, ResizePolicy};
