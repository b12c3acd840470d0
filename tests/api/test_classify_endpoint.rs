// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Classification endpoint tests
//!
//! Drives the router in-process with multipart bodies and checks:
//! - Successful uploads return `{"result": label}`
//! - Client mistakes return 400 with `{"error": msg}`
//! - Missing model and pipeline failures return 500
//! - Unknown routes return 404

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use kolam_classifier::api::http_server::{create_router, AppState};
use kolam_classifier::config::PipelineConfig;
use kolam_classifier::vision::preprocessing::NormalizedTensor;
use kolam_classifier::vision::{ClassificationError, ClassifierModelManager, InferenceBackend};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "kolam-test-boundary";

/// Backend that returns fixed logits
struct StaticBackend {
    logits: Vec<f32>,
}

impl InferenceBackend for StaticBackend {
    fn infer(&self, tensor: &NormalizedTensor) -> Result<Vec<f32>, ClassificationError> {
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        Ok(self.logits.clone())
    }
}

/// Backend that panics inside the worker
struct PanickingBackend;

impl InferenceBackend for PanickingBackend {
    fn infer(&self, _tensor: &NormalizedTensor) -> Result<Vec<f32>, ClassificationError> {
        panic!("model crashed");
    }
}

fn app_with(backend: Arc<dyn InferenceBackend>) -> Router {
    let manager = ClassifierModelManager::with_backend(backend, PipelineConfig::default());
    create_router(AppState::new(Arc::new(manager), 10 * 1024 * 1024))
}

fn app_returning(logits: Vec<f32>) -> Router {
    app_with(Arc::new(StaticBackend { logits }))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn classify_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_classify_returns_positive_label() {
    // softmax([3, 0])[1] ~= 0.047 < 0.2694
    let app = app_returning(vec![3.0, 0.0]);
    let (status, json) = send(app, classify_request(multipart_body("image", &png_bytes(300, 300)))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({ "result": "kolam" }));
}

#[tokio::test]
async fn test_classify_returns_negative_label() {
    // softmax([0, 1])[1] ~= 0.73 >= 0.2694
    let app = app_returning(vec![0.0, 1.0]);
    let (status, json) = send(app, classify_request(multipart_body("image", &png_bytes(640, 480)))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["result"], "bukan kolam");
}

#[tokio::test]
async fn test_missing_image_field_is_bad_request() {
    let app = app_returning(vec![0.0, 0.0]);
    let (status, json) = send(app, classify_request(multipart_body("photo", &png_bytes(224, 224)))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image uploaded");
}

#[tokio::test]
async fn test_non_multipart_request_is_bad_request() {
    let app = app_returning(vec![0.0, 0.0]);
    let req = Request::builder()
        .method("POST")
        .uri("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_undecodable_image_is_bad_request() {
    let app = app_returning(vec![0.0, 0.0]);
    let (status, json) = send(app, classify_request(multipart_body("image", b"definitely not a png"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("decode"));
}

#[tokio::test]
async fn test_model_not_loaded_is_server_error() {
    let app = create_router(AppState::new(
        Arc::new(ClassifierModelManager::empty()),
        10 * 1024 * 1024,
    ));
    let (status, json) = send(app, classify_request(multipart_body("image", &png_bytes(224, 224)))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Classifier model not loaded");
}

#[tokio::test]
async fn test_wrong_output_length_is_server_error() {
    let app = app_returning(vec![0.2, 0.3, 0.5]);
    let (status, json) = send(app, classify_request(multipart_body("image", &png_bytes(224, 224)))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("expected length 2"));
}

#[tokio::test]
async fn test_worker_panic_is_isolated() {
    let app = app_with(Arc::new(PanickingBackend));
    let (status, json) = send(app.clone(), classify_request(multipart_body("image", &png_bytes(224, 224)))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());

    // The server keeps answering after a failed request
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app_returning(vec![0.0, 0.0]);
    let req = Request::builder().uri("/predict").body(Body::empty()).unwrap();
    let (status, json) = send(app, req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("/predict"));
}
