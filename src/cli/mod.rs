// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod classify;
pub mod serve;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::vision::{NormalizationMode, ResizeFilter};

/// Kolam image classifier
#[derive(Parser, Debug)]
#[command(name = "kolam-classifier")]
#[command(version)]
#[command(about = "Binary PNG image classifier served over HTTP", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "CLASSIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Path to the ONNX model
    #[arg(long, global = true)]
    pub model_path: Option<PathBuf>,

    /// Decision threshold on the second class probability
    #[arg(long, global = true)]
    pub threshold: Option<f32>,

    /// Resampling filter (nearest, bilinear, catmull_rom, mitchell_netravali, lanczos3)
    #[arg(long, global = true)]
    pub resize_filter: Option<ResizeFilter>,

    /// Pixel normalization (image_net, unit_scale)
    #[arg(long, global = true)]
    pub normalization: Option<NormalizationMode>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Classify a local PNG file and print diagnostics
    Classify(classify::ClassifyArgs),
}

impl Cli {
    /// Resolve configuration: defaults, file, environment, then flags
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;
        self.apply_overrides(&mut config);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.model_path {
            config.model.model_path = path.clone();
        }
        if let Some(threshold) = self.threshold {
            config.pipeline.threshold = threshold;
        }
        if let Some(filter) = self.resize_filter {
            config.pipeline.resize_filter = filter;
        }
        if let Some(mode) = self.normalization {
            config.pipeline.normalization = mode;
        }
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    match cli.command {
        None | Some(Commands::Serve) => serve::run(config).await,
        Some(Commands::Classify(args)) => classify::run(args, config).await,
    }
}
