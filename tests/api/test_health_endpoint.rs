// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use kolam_classifier::api::http_server::{create_router, AppState};
use kolam_classifier::config::PipelineConfig;
use kolam_classifier::vision::preprocessing::NormalizedTensor;
use kolam_classifier::vision::{ClassificationError, ClassifierModelManager, InferenceBackend};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct NoopBackend;

impl InferenceBackend for NoopBackend {
    fn infer(&self, _tensor: &NormalizedTensor) -> Result<Vec<f32>, ClassificationError> {
        Ok(vec![0.0, 0.0])
    }

    fn name(&self) -> &str {
        "noop"
    }
}

async fn health(manager: ClassifierModelManager) -> (StatusCode, Value) {
    let app = create_router(AppState::new(Arc::new(manager), 1024 * 1024));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_with_model() {
    let manager =
        ClassifierModelManager::with_backend(Arc::new(NoopBackend), PipelineConfig::default());
    let (status, json) = health(manager).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["modelLoaded"], true);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["model"]["name"], "noop");
    assert_eq!(json["model"]["path"], "noop");
    assert_eq!(json["build"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["build"]["pipelineConfigVersion"], 1);
    assert!(json["build"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| *f == "stable-softmax"));
}

#[tokio::test]
async fn test_health_without_model() {
    let (status, json) = health(ClassifierModelManager::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["modelLoaded"], false);
    assert!(json.get("model").is_none());
    assert!(json["build"]["date"].is_string());
}

#[tokio::test]
async fn test_health_after_shutdown() {
    let manager =
        ClassifierModelManager::with_backend(Arc::new(NoopBackend), PipelineConfig::default());
    manager.shutdown().await;
    let (_, json) = health(manager).await;

    assert_eq!(json["modelLoaded"], false);
}
