// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error taxonomy for the classification pipeline
//!
//! Every stage returns one of these variants. Only decode failures are the
//! caller's fault; the HTTP layer maps everything else to a server error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Bytes are not a decodable PNG image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Source image cannot be scaled (zero width or height)
    #[error("Failed to resize image: {0}")]
    Resize(String),

    /// Image is smaller than the crop target or not the expected size
    #[error("Failed to crop image: {0}")]
    Crop(String),

    /// Model missing, session failure or tensor shape mismatch
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Probability vector has the wrong length for the decision policy
    #[error("Invalid probability vector: expected length {expected}, got {actual}")]
    InvalidVector { expected: usize, actual: usize },
}

impl ClassificationError {
    /// True when the failure was caused by the uploaded data itself
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassificationError::Decode(_))
    }
}

impl From<ort::Error> for ClassificationError {
    fn from(e: ort::Error) -> Self {
        ClassificationError::Inference(e.to_string())
    }
}
