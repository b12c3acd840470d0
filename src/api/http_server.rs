// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::classify::{classify_handler, health_handler};
use super::errors::ApiError;
use crate::vision::ClassifierModelManager;

/// Multipart framing allowance on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub model_manager: Arc<ClassifierModelManager>,
    /// Largest accepted image upload
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(model_manager: Arc<ClassifierModelManager>, max_upload_bytes: usize) -> Self {
        Self {
            model_manager,
            max_upload_bytes,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Classification endpoint
        .route("/classify", post(classify_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(state: AppState, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = addr
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address '{}'", addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
