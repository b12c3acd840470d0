// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Kolam classifier service

use crate::config::PIPELINE_CONFIG_VERSION;

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-binary-classifier-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "png-upload",
    "center-crop",
    "imagenet-normalization",
    "stable-softmax",
    "configurable-threshold",
    "onnx-runtime-cpu",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Kolam Classifier {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
        "pipelineConfigVersion": PIPELINE_CONFIG_VERSION,
    })
}
