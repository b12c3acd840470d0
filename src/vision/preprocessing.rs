// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the binary classifier
//!
//! Steps:
//! 1. Resize to the target square with the configured filter and policy
//! 2. Center crop to target x target
//! 3. Normalize each 16-bit channel value and lay it out as NHWC [1, H, W, 3]

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::error::ClassificationError;
use crate::config::PipelineConfig;

/// Target size the classifier was trained with
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// Mean values for normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Largest 16-bit channel value
const CHANNEL_MAX: f32 = 65535.0;

/// Mitchell-Netravali kernel support (in source pixels at scale 1)
const MITCHELL_SUPPORT: f32 = 2.0;

/// Interpolation filter used by the resizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    /// Cubic with B = C = 1/3
    MitchellNetravali,
    Lanczos3,
}

impl Default for ResizeFilter {
    fn default() -> Self {
        // The decision threshold was calibrated on Mitchell-resized inputs
        Self::MitchellNetravali
    }
}

impl ResizeFilter {
    /// Matching `image` filter, if the crate provides one
    fn image_filter(self) -> Option<image::imageops::FilterType> {
        use image::imageops::FilterType;
        match self {
            ResizeFilter::Nearest => Some(FilterType::Nearest),
            ResizeFilter::Bilinear => Some(FilterType::Triangle),
            ResizeFilter::CatmullRom => Some(FilterType::CatmullRom),
            ResizeFilter::Lanczos3 => Some(FilterType::Lanczos3),
            ResizeFilter::MitchellNetravali => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Bilinear => "bilinear",
            ResizeFilter::CatmullRom => "catmull_rom",
            ResizeFilter::MitchellNetravali => "mitchell_netravali",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "bilinear" | "triangle" => Ok(ResizeFilter::Bilinear),
            "catmull_rom" => Ok(ResizeFilter::CatmullRom),
            "mitchell_netravali" | "mitchell" => Ok(ResizeFilter::MitchellNetravali),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter '{}'", other)),
        }
    }
}

/// How the source is scaled before cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Scale directly to target x target (aspect ratio not preserved)
    Exact,
    /// Scale the shorter edge to target, keeping aspect ratio
    ShorterEdge,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::Exact
    }
}

/// Pixel value normalization applied by the tensor builder
///
/// The two modes produce different tensors for the same pixel, so a pipeline
/// uses exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// (value / 65535 - mean[c]) / std[c]
    ImageNet,
    /// (value >> 8) / 255, no standardization
    UnitScale,
}

impl Default for NormalizationMode {
    fn default() -> Self {
        Self::ImageNet
    }
}

impl FromStr for NormalizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "imagenet" | "image_net" => Ok(NormalizationMode::ImageNet),
            "unit_scale" | "unit" => Ok(NormalizationMode::UnitScale),
            other => Err(format!("unknown normalization mode '{}'", other)),
        }
    }
}

impl NormalizationMode {
    /// Normalize one 16-bit channel value
    pub fn normalize(&self, value: u16, channel: usize) -> f32 {
        match self {
            NormalizationMode::ImageNet => {
                (value as f32 / CHANNEL_MAX - MEAN[channel]) / STD[channel]
            }
            NormalizationMode::UnitScale => (value >> 8) as f32 / 255.0,
        }
    }

    /// Map a normalized value back to the [0, 1] scaled channel value
    pub fn denormalize(&self, value: f32, channel: usize) -> f32 {
        match self {
            NormalizationMode::ImageNet => value * STD[channel] + MEAN[channel],
            NormalizationMode::UnitScale => value,
        }
    }
}

/// Float input tensor for the classifier, shape [1, H, W, 3] (NHWC, RGB)
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    /// Wrap an array after checking the batch/channel layout and values
    pub fn new(array: Array4<f32>) -> Result<Self, ClassificationError> {
        let shape = array.shape();
        if shape[0] != 1 || shape[3] != 3 || shape[1] == 0 || shape[2] == 0 {
            return Err(ClassificationError::Inference(format!(
                "invalid tensor shape: {:?}, expected [1, H, W, 3]",
                shape
            )));
        }
        if array.iter().any(|v| !v.is_finite()) {
            return Err(ClassificationError::Inference(
                "tensor contains non-finite values".to_string(),
            ));
        }
        Ok(Self(array))
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn into_array(self) -> Array4<f32> {
        self.0
    }
}

/// Run the full preprocessing pipeline on a decoded image
pub fn preprocess(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<NormalizedTensor, ClassificationError> {
    let resized = resize(
        image,
        config.target_size,
        config.resize_filter,
        config.resize_policy,
    )?;
    let cropped = center_crop(&resized, config.target_size)?;
    build_tensor(&cropped, config.target_size, config.normalization)
}

/// Output dimensions for a resize under the given policy
pub fn resized_dimensions(
    width: u32,
    height: u32,
    target: u32,
    policy: ResizePolicy,
) -> (u32, u32) {
    match policy {
        ResizePolicy::Exact => (target, target),
        ResizePolicy::ShorterEdge => {
            if width <= height {
                let new_h = (height as f64 * target as f64 / width as f64).round() as u32;
                (target, new_h.max(target))
            } else {
                let new_w = (width as f64 * target as f64 / height as f64).round() as u32;
                (new_w.max(target), target)
            }
        }
    }
}

/// Scale an image so both dimensions are at least `target`
///
/// The result is always a 16-bit RGB image.
pub fn resize(
    image: &DynamicImage,
    target: u32,
    filter: ResizeFilter,
    policy: ResizePolicy,
) -> Result<DynamicImage, ClassificationError> {
    let (orig_w, orig_h) = image.dimensions();

    if orig_w == 0 || orig_h == 0 {
        return Err(ClassificationError::Resize(format!(
            "source image has zero dimension: {}x{}",
            orig_w, orig_h
        )));
    }
    if target == 0 {
        return Err(ClassificationError::Resize(
            "target size must be > 0".to_string(),
        ));
    }

    let (new_w, new_h) = resized_dimensions(orig_w, orig_h, target, policy);
    let rgb16 = DynamicImage::ImageRgb16(premultiplied_rgb16(image));

    let resized = match filter.image_filter() {
        Some(filter_type) => rgb16.resize_exact(new_w, new_h, filter_type),
        None => mitchell_resize(&rgb16, new_w, new_h),
    };

    Ok(resized)
}

/// Top-left corner of a centered target x target region
pub fn crop_origin(width: u32, height: u32, target: u32) -> Result<(u32, u32), ClassificationError> {
    if width < target || height < target {
        return Err(ClassificationError::Crop(format!(
            "image {}x{} is smaller than crop target {}",
            width, height, target
        )));
    }
    Ok(((width - target) / 2, (height - target) / 2))
}

/// Extract the centered target x target region
pub fn center_crop(image: &DynamicImage, target: u32) -> Result<DynamicImage, ClassificationError> {
    let (width, height) = image.dimensions();
    let (x, y) = crop_origin(width, height, target)?;
    Ok(image.crop_imm(x, y, target, target))
}

/// Convert a cropped image into the normalized NHWC tensor
pub fn build_tensor(
    image: &DynamicImage,
    target: u32,
    mode: NormalizationMode,
) -> Result<NormalizedTensor, ClassificationError> {
    let (width, height) = image.dimensions();
    if width != target || height != target {
        return Err(ClassificationError::Crop(format!(
            "tensor input must be {}x{}, got {}x{}",
            target, target, width, height
        )));
    }

    let rgb = premultiplied_rgb16(image);
    let size = target as usize;
    let mut tensor = Array4::zeros((1, size, size, 3));

    for y in 0..size {
        for x in 0..size {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, y, x, c]] = mode.normalize(pixel[c], c);
            }
        }
    }

    NormalizedTensor::new(tensor)
}

/// 16-bit RGB with color channels scaled by alpha, then alpha dropped
///
/// Matches reading pixels as alpha-premultiplied values: a fully
/// transparent pixel becomes black whatever its stored color.
pub fn premultiplied_rgb16(image: &DynamicImage) -> ImageBuffer<Rgb<u16>, Vec<u16>> {
    if !image.color().has_alpha() {
        return image.to_rgb16();
    }

    let rgba = image.to_rgba16();
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |v: u16| (v as u32 * a as u32 / 65535) as u16;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

fn mitchell_kernel(x: f32) -> f32 {
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;

    let x = x.abs();
    if x < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * x * x * x
            + (-18.0 + 12.0 * B + 6.0 * C) * x * x
            + (6.0 - 2.0 * B))
            / 6.0
    } else if x < 2.0 {
        ((-B - 6.0 * C) * x * x * x
            + (6.0 * B + 30.0 * C) * x * x
            + (-12.0 * B - 48.0 * C) * x
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// Per output sample: first source index and normalized weights
///
/// The first index may be negative and the window may run past the end;
/// samplers clamp indices so edge pixels are repeated.
fn axis_weights(src_len: u32, dst_len: u32) -> Vec<(i64, Vec<f32>)> {
    let ratio = src_len as f32 / dst_len as f32;
    // Widen the kernel when downscaling so every source pixel contributes
    let scale = ratio.max(1.0);
    let support = MITCHELL_SUPPORT * scale;

    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * ratio;
            let left = (center - support).floor() as i64;
            let right = (center + support).ceil() as i64;

            let mut weights: Vec<f32> = (left..right)
                .map(|j| mitchell_kernel((j as f32 + 0.5 - center) / scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum != 0.0 {
                for w in weights.iter_mut() {
                    *w /= sum;
                }
            }
            (left, weights)
        })
        .collect()
}

fn clamp_index(index: i64, len: u32) -> usize {
    index.clamp(0, len as i64 - 1) as usize
}

/// Separable Mitchell-Netravali resample on 16-bit RGB data
///
/// Out-of-range taps repeat the edge pixel. Output stays at 16 bits even
/// for 8-bit sources; no intermediate rounding to 8 bits is applied.
fn mitchell_resize(image: &DynamicImage, new_w: u32, new_h: u32) -> DynamicImage {
    let src = premultiplied_rgb16(image);
    let (src_w, src_h) = src.dimensions();
    let nw = new_w as usize;

    // Horizontal pass: src_w x src_h -> new_w x src_h
    let x_weights = axis_weights(src_w, new_w);
    let mut horizontal = vec![[0f32; 3]; nw * src_h as usize];
    for y in 0..src_h as usize {
        for (x, (start, weights)) in x_weights.iter().enumerate() {
            let mut acc = [0f32; 3];
            for (k, w) in weights.iter().enumerate() {
                let sx = clamp_index(start + k as i64, src_w);
                let p = src.get_pixel(sx as u32, y as u32);
                for c in 0..3 {
                    acc[c] += p[c] as f32 * w;
                }
            }
            horizontal[y * nw + x] = acc;
        }
    }

    // Vertical pass: new_w x src_h -> new_w x new_h
    let y_weights = axis_weights(src_h, new_h);
    let mut out: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::new(new_w, new_h);
    for (y, (start, weights)) in y_weights.iter().enumerate() {
        for x in 0..nw {
            let mut acc = [0f32; 3];
            for (k, w) in weights.iter().enumerate() {
                let sy = clamp_index(start + k as i64, src_h);
                let p = horizontal[sy * nw + x];
                for c in 0..3 {
                    acc[c] += p[c] * w;
                }
            }
            let px = acc.map(|v| v.round().clamp(0.0, CHANNEL_MAX) as u16);
            out.put_pixel(x as u32, y as u32, Rgb(px));
        }
    }

    DynamicImage::ImageRgb16(out)
}
