// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::http_server::{create_router, AppState};
pub use config::{AppConfig, ConfigError, ModelConfig, PipelineConfig, ServerConfig};
pub use vision::{
    ClassificationError, ClassificationResult, ClassifierModelManager, DecisionPolicy,
    ImageClassifier, InferenceBackend, OnnxClassifierModel,
};
