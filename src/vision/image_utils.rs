// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading for the classification pipeline

use image::{DynamicImage, ImageFormat};

use super::error::ClassificationError;

/// Maximum image size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw PNG bytes (for multipart uploads)
///
/// # Arguments
/// * `bytes` - Raw image bytes
///
/// # Returns
/// * `Ok((DynamicImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ClassificationError::Decode)` - Empty, oversized, non-PNG or corrupt data
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ClassificationError> {
    if bytes.is_empty() {
        return Err(ClassificationError::Decode("image data is empty".to_string()));
    }

    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ClassificationError::Decode(format!(
            "image data is too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_IMAGE_SIZE
        )));
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ClassificationError::Decode(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect the image format from magic bytes
///
/// Only PNG is accepted; anything else is reported as a decode failure so
/// the caller can answer with a client error.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ClassificationError> {
    match bytes {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Ok(ImageFormat::Png),

        [0xFF, 0xD8, 0xFF, ..] => Err(ClassificationError::Decode(
            "unsupported image format: jpeg (expected png)".to_string(),
        )),

        [0x47, 0x49, 0x46, 0x38, ..] => Err(ClassificationError::Decode(
            "unsupported image format: gif (expected png)".to_string(),
        )),

        _ => Err(ClassificationError::Decode(
            "unsupported image format (expected png)".to_string(),
        )),
    }
}
