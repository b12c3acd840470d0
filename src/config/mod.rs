// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Layers, lowest priority first: built-in defaults, an optional TOML file,
//! `CLASSIFY_*` environment variables, then command line flags (applied by
//! the binary).

pub mod pipeline;

pub use pipeline::{PipelineConfig, PIPELINE_CONFIG_VERSION};

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::vision::image_utils::MAX_IMAGE_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Location and session options for the ONNX model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the exported .onnx file
    pub model_path: PathBuf,
    /// Input tensor name (first model input when unset)
    pub input_name: Option<String>,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./saved_model/model.onnx"),
            input_name: None,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file; missing tables use defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load defaults, then the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `CLASSIFY_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CLASSIFY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env(&lookup, "CLASSIFY_PORT")? {
            self.server.port = port;
        }
        if let Some(max) = parse_env(&lookup, "CLASSIFY_MAX_UPLOAD_BYTES")? {
            self.server.max_upload_bytes = max;
        }
        if let Some(path) = lookup("CLASSIFY_MODEL_PATH") {
            self.model.model_path = PathBuf::from(path);
        }
        if let Some(threshold) = parse_env(&lookup, "CLASSIFY_THRESHOLD")? {
            self.pipeline.threshold = threshold;
        }
        if let Some(filter) = parse_env(&lookup, "CLASSIFY_RESIZE_FILTER")? {
            self.pipeline.resize_filter = filter;
        }
        if let Some(mode) = parse_env(&lookup, "CLASSIFY_NORMALIZATION")? {
            self.pipeline.normalization = mode;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.server.max_upload_bytes > MAX_IMAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "max_upload_bytes {} exceeds the decoder limit of {} bytes",
                self.server.max_upload_bytes, MAX_IMAGE_SIZE
            )));
        }
        if self.model.intra_threads == 0 {
            return Err(ConfigError::Invalid(
                "intra_threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv {
                var: var.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
