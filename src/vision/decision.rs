// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Threshold decision turning a two-class probability vector into a label

use serde::{Deserialize, Serialize};

use super::error::ClassificationError;

/// Threshold the deployed model was calibrated with
pub const DEFAULT_THRESHOLD: f32 = 0.2694;

/// Number of classes the policy decides between
pub const CLASS_COUNT: usize = 2;

/// Label strings for the two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabels {
    /// Returned when `v[1]` is below the threshold
    pub positive: String,
    /// Returned otherwise
    pub negative: String,
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            positive: "kolam".to_string(),
            negative: "bukan kolam".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    threshold: f32,
    labels: ClassLabels,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, ClassLabels::default())
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f32, labels: ClassLabels) -> Self {
        Self { threshold, labels }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Pick a label from a post-softmax probability vector
    ///
    /// `v[1] < threshold` selects the positive label.
    pub fn decide(&self, probabilities: &[f32]) -> Result<&str, ClassificationError> {
        if probabilities.len() != CLASS_COUNT {
            return Err(ClassificationError::InvalidVector {
                expected: CLASS_COUNT,
                actual: probabilities.len(),
            });
        }

        if probabilities[1] < self.threshold {
            Ok(&self.labels.positive)
        } else {
            Ok(&self.labels.negative)
        }
    }
}
