// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction

use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::api::errors::ApiError;

/// Form field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Uploaded image part
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Read the `image` part from a multipart body
///
/// Other parts are skipped. A body without an `image` part, or one whose
/// `image` part is empty, is a validation error.
pub async fn read_image_upload(multipart: &mut Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(no_image());
        }

        return Ok(ImageUpload {
            bytes,
            file_name,
            content_type,
        });
    }

    Err(no_image())
}

fn no_image() -> ApiError {
    ApiError::ValidationError {
        field: IMAGE_FIELD.to_string(),
        message: "No image uploaded".to_string(),
    }
}
