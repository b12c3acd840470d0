// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification response types

use serde::{Deserialize, Serialize};

/// Response from POST /classify
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifyResponse {
    /// Predicted label ("kolam" or "bukan kolam" by default)
    pub result: String,
}

impl ClassifyResponse {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            result: label.into(),
        }
    }
}

/// Loaded model details reported by GET /health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelStatus {
    pub name: String,
    pub path: String,
}

/// Response from GET /health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
    /// Present only while a model is loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelStatus>,
    /// Build string, date, features and pipeline config version
    pub build: serde_json::Value,
}
