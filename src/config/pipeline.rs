// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Versioned preprocessing and decision settings
//!
//! One `PipelineConfig` fully determines the tensor a given image produces
//! and the label a given probability vector maps to.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::vision::decision::{ClassLabels, DecisionPolicy, DEFAULT_THRESHOLD};
use crate::vision::preprocessing::{
    NormalizationMode, ResizeFilter, ResizePolicy, CLASSIFIER_INPUT_SIZE,
};

/// Current pipeline config layout
pub const PIPELINE_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: u32,
    pub target_size: u32,
    pub resize_filter: ResizeFilter,
    pub resize_policy: ResizePolicy,
    pub normalization: NormalizationMode,
    pub threshold: f32,
    pub labels: ClassLabels,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: PIPELINE_CONFIG_VERSION,
            target_size: CLASSIFIER_INPUT_SIZE,
            resize_filter: ResizeFilter::default(),
            resize_policy: ResizePolicy::default(),
            normalization: NormalizationMode::default(),
            threshold: DEFAULT_THRESHOLD,
            labels: ClassLabels::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != PIPELINE_CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported pipeline config version {} (expected {})",
                self.version, PIPELINE_CONFIG_VERSION
            )));
        }
        if self.target_size == 0 {
            return Err(ConfigError::Invalid(
                "target_size must be greater than 0".to_string(),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        if self.labels.positive.trim().is_empty() || self.labels.negative.trim().is_empty() {
            return Err(ConfigError::Invalid("labels must not be empty".to_string()));
        }
        if self.labels.positive == self.labels.negative {
            return Err(ConfigError::Invalid(format!(
                "labels must differ, both are '{}'",
                self.labels.positive
            )));
        }
        Ok(())
    }

    pub fn decision_policy(&self) -> DecisionPolicy {
        DecisionPolicy::new(self.threshold, self.labels.clone())
    }
}
