// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classification endpoint handlers

use axum::{extract::State, Json};
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use super::request::read_image_upload;
use super::response::{ClassifyResponse, HealthResponse, ModelStatus};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::version::{get_version_info, VERSION_NUMBER};

/// POST /classify - Classify an uploaded PNG image
///
/// # Request
/// `multipart/form-data` with a field named `image` holding PNG bytes.
///
/// # Response
/// - `result`: predicted label
///
/// # Errors
/// - 400 Bad Request: missing `image` field, malformed multipart, undecodable image
/// - 500 Internal Server Error: model not loaded or classification failed
pub async fn classify_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    // 1. Read the upload
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejected multipart request: {}", e);
        ApiError::InvalidRequest(format!("Malformed multipart body: {}", e))
    })?;
    let upload = read_image_upload(&mut multipart).await.map_err(|e| {
        warn!("Classification upload rejected: {}", e);
        e
    })?;

    debug!(
        "Received upload {:?} ({:?}), {} bytes",
        upload.file_name,
        upload.content_type,
        upload.bytes.len()
    );

    // 2. Get the classifier
    let classifier = state.model_manager.get_classifier().await.ok_or_else(|| {
        warn!("Classifier model not loaded");
        ApiError::InternalError("Classifier model not loaded".to_string())
    })?;

    // 3. Run the pipeline off the async runtime
    let bytes = upload.bytes;
    let outcome = tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes))
        .await
        .map_err(|e| {
            warn!("Classification task failed: {}", e);
            ApiError::InternalError("Classification worker failed".to_string())
        })?;

    let result = outcome.map_err(|e| {
        warn!("Classification failed: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Classified image as '{}' in {}ms",
        result.label, result.processing_time_ms
    );

    Ok(Json(ClassifyResponse::new(result.label)))
}

/// GET /health - Service status
///
/// Reports whether a model is loaded, which one, and the build info.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let info = state.model_manager.model_info().await;
    let model = info.available.then(|| ModelStatus {
        name: info.name,
        path: info.path,
    });

    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: info.available,
        version: VERSION_NUMBER.to_string(),
        model,
        build: get_version_info(),
    })
}
