// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::vision::{ClassificationResult, ImageClassifier, OnnxClassifierModel};

/// Arguments for the classify command
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// PNG file to classify
    pub image: PathBuf,
}

/// Classify one file and print the label with every activation
pub async fn run(args: ClassifyArgs, config: AppConfig) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read {}", args.image.display()))?;

    let model = OnnxClassifierModel::load(&config.model).context("failed to load model")?;
    let classifier = ImageClassifier::new(Arc::new(model), config.pipeline);

    let result = tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes))
        .await
        .context("classification task failed")?
        .with_context(|| format!("failed to classify {}", args.image.display()))?;

    print!("{}", format_report(&result));
    Ok(())
}

/// Human readable report of a classification
pub fn format_report(result: &ClassificationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Result: {}", result.label);
    let _ = writeln!(out, "Logits: {:?}", result.logits);
    for (activation, values) in result.diagnostics() {
        let _ = writeln!(out, "{}: {:?}", activation, values);
    }
    let _ = writeln!(out, "Processing time: {}ms", result.processing_time_ms);
    out
}
