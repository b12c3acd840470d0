// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Activation functions applied to raw model outputs
//!
//! Only `softmax` feeds the decision policy. The others are diagnostics and
//! are never substituted for it.

use std::fmt;
use std::str::FromStr;

/// Numerically stable softmax: exp(v_i - max) / sum(exp(v_j - max))
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Element-wise logistic function, entries do not sum to 1
pub fn sigmoid(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|&v| 1.0 / (1.0 + (-v).exp())).collect()
}

/// Element-wise max(0, v)
pub fn relu(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|&v| v.max(0.0)).collect()
}

pub fn relu_in_place(values: &mut [f32]) {
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}

/// Element-wise hyperbolic tangent
pub fn tanh(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|&v| v.tanh()).collect()
}

/// Index of the largest entry, first one wins on ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Named activation, used when a caller picks one for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Softmax,
    Sigmoid,
    Relu,
    Tanh,
}

impl Activation {
    pub const ALL: [Activation; 4] = [
        Activation::Softmax,
        Activation::Sigmoid,
        Activation::Relu,
        Activation::Tanh,
    ];

    pub fn apply(&self, logits: &[f32]) -> Vec<f32> {
        match self {
            Activation::Softmax => softmax(logits),
            Activation::Sigmoid => sigmoid(logits),
            Activation::Relu => relu(logits),
            Activation::Tanh => tanh(logits),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Softmax => "softmax",
            Activation::Sigmoid => "sigmoid",
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "softmax" => Ok(Activation::Softmax),
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            other => Err(format!("unknown activation '{}'", other)),
        }
    }
}
