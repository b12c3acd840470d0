// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use crate::api::http_server::{start_server, AppState};
use crate::config::AppConfig;
use crate::version;
use crate::vision::ClassifierModelManager;

/// Load the model and serve until Ctrl+C
pub async fn run(config: AppConfig) -> Result<()> {
    info!("🚀 Starting {}", version::get_version_string());
    info!(
        "Pipeline: {}x{} {} / {:?}, normalization {:?}, threshold {}",
        config.pipeline.target_size,
        config.pipeline.target_size,
        config.pipeline.resize_filter,
        config.pipeline.resize_policy,
        config.pipeline.normalization,
        config.pipeline.threshold
    );

    let model_manager = Arc::new(
        ClassifierModelManager::new(&config.model, config.pipeline.clone()).await,
    );
    if !model_manager.is_loaded().await {
        warn!("Serving without a model; /classify will return errors");
    }

    let state = AppState::new(model_manager.clone(), config.server.max_upload_bytes);
    let addr = config.server.bind_address();

    info!("Press Ctrl+C to shutdown...");
    start_server(state, &addr, shutdown_signal()).await?;

    model_manager.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
