// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification API endpoint module
//!
//! Provides POST /classify for binary classification of uploaded PNG images
//! and GET /health for service status.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{classify_handler, health_handler};
pub use request::{read_image_upload, ImageUpload, IMAGE_FIELD};
pub use response::{ClassifyResponse, HealthResponse, ModelStatus};
