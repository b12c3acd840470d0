// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end preprocessing tests
//!
//! PNG bytes in, normalized NHWC tensor out, for 8-bit and 16-bit sources
//! under each resize filter and both normalization modes.

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use kolam_classifier::config::PipelineConfig;
use kolam_classifier::vision::activation::softmax;
use kolam_classifier::vision::preprocessing::{preprocess, MEAN, STD};
use kolam_classifier::vision::{
    decode_image_bytes, ClassificationError, NormalizationMode, ResizeFilter, ResizePolicy,
};
use std::io::Cursor;

fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn solid_rgb8(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb(rgb),
    )))
}

fn solid_rgb16(width: u32, height: u32, rgb: [u16; 3]) -> Vec<u8> {
    let buffer: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::from_pixel(width, height, Rgb(rgb));
    encode_png(&DynamicImage::ImageRgb16(buffer))
}

fn tensor_for(bytes: &[u8], config: &PipelineConfig) -> Vec<f32> {
    let (image, _) = decode_image_bytes(bytes).unwrap();
    let tensor = preprocess(&image, config).unwrap();
    assert_eq!(tensor.shape(), [1, 224, 224, 3]);
    tensor.into_array().iter().copied().collect()
}

#[test]
fn test_default_pipeline_on_8bit_png() {
    let bytes = solid_rgb8(300, 300, [255, 255, 255]);
    let values = tensor_for(&bytes, &PipelineConfig::default());

    assert_eq!(values.len(), 224 * 224 * 3);
    for (i, v) in values.iter().take(3).enumerate() {
        let expected = (1.0 - MEAN[i]) / STD[i];
        assert!((v - expected).abs() < 1e-3, "channel {}: {} vs {}", i, v, expected);
    }
}

#[test]
fn test_16bit_png_keeps_full_precision() {
    let bytes = solid_rgb16(256, 256, [32768, 0, 65535]);
    let values = tensor_for(&bytes, &PipelineConfig::default());

    let expected_r = (32768.0 / 65535.0 - MEAN[0]) / STD[0];
    let expected_g = (0.0 - MEAN[1]) / STD[1];
    let expected_b = (1.0 - MEAN[2]) / STD[2];
    let center = (112 * 224 + 112) * 3;
    assert!((values[center] - expected_r).abs() < 1e-3);
    assert!((values[center + 1] - expected_g).abs() < 1e-3);
    assert!((values[center + 2] - expected_b).abs() < 1e-3);
}

#[test]
fn test_unit_scale_mode_uses_high_byte() {
    let config = PipelineConfig {
        normalization: NormalizationMode::UnitScale,
        ..PipelineConfig::default()
    };
    let bytes = solid_rgb8(224, 224, [200, 100, 0]);
    let values = tensor_for(&bytes, &config);

    assert!((values[0] - 200.0 / 255.0).abs() < 1e-6);
    assert!((values[1] - 100.0 / 255.0).abs() < 1e-6);
    assert_eq!(values[2], 0.0);
}

#[test]
fn test_every_filter_and_policy_produces_model_shape() {
    let bytes = encode_png(&DynamicImage::ImageRgb8(RgbImage::from_fn(320, 240, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })));

    for filter in [
        ResizeFilter::Nearest,
        ResizeFilter::Bilinear,
        ResizeFilter::CatmullRom,
        ResizeFilter::MitchellNetravali,
        ResizeFilter::Lanczos3,
    ] {
        for policy in [ResizePolicy::Exact, ResizePolicy::ShorterEdge] {
            let config = PipelineConfig {
                resize_filter: filter,
                resize_policy: policy,
                ..PipelineConfig::default()
            };
            let values = tensor_for(&bytes, &config);
            assert!(values.iter().all(|v| v.is_finite()), "{} / {:?}", filter, policy);
        }
    }
}

#[test]
fn test_filters_give_different_tensors_on_detailed_input() {
    let bytes = encode_png(&DynamicImage::ImageRgb8(RgbImage::from_fn(301, 301, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })));

    let nearest = tensor_for(
        &bytes,
        &PipelineConfig {
            resize_filter: ResizeFilter::Nearest,
            ..PipelineConfig::default()
        },
    );
    let mitchell = tensor_for(&bytes, &PipelineConfig::default());
    assert_ne!(nearest, mitchell);
}

#[test]
fn test_non_png_is_rejected_before_preprocessing() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([1, 2, 3])));
    let mut jpeg = Vec::new();
    img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();

    let err = decode_image_bytes(&jpeg).unwrap_err();
    assert!(matches!(err, ClassificationError::Decode(_)));
}

#[test]
fn test_threshold_boundary() {
    let policy = PipelineConfig::default().decision_policy();

    // Exactly at the threshold is the negative class
    assert_eq!(policy.decide(&[0.7306, 0.2694]).unwrap(), "bukan kolam");
    assert_eq!(policy.decide(&[0.7307, 0.2693]).unwrap(), "kolam");

    let probabilities = softmax(&[1.5, 0.2]);
    assert_eq!(policy.decide(&probabilities).unwrap(), "kolam");
}
