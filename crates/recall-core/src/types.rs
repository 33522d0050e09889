// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by adapters, configuration, and the memory core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Input for an embedding adapter.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector per entry.
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of the returned vectors (0 when unknown).
    pub dimensions: usize,
}

/// Which embedding provider the caller asked for.
///
/// `Auto` probes the local endpoints before settling on the remote one;
/// the other variants force a specific backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum ProviderPreference {
    #[default]
    #[serde(rename = "auto")]
    #[strum(to_string = "auto")]
    Auto,
    #[serde(rename = "remote")]
    #[strum(to_string = "remote")]
    Remote,
    #[serde(rename = "ollama", alias = "local-a")]
    #[strum(to_string = "ollama", serialize = "local-a")]
    Ollama,
    #[serde(rename = "lmstudio", alias = "local-b")]
    #[strum(to_string = "lmstudio", serialize = "local-b")]
    LmStudio,
}

/// A concrete embedding backend, the outcome of provider resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum EmbeddingBackend {
    /// OpenAI-compatible hosted endpoint.
    #[serde(rename = "remote")]
    #[strum(to_string = "remote")]
    Remote,
    /// Local Ollama daemon.
    #[serde(rename = "ollama")]
    #[strum(to_string = "ollama")]
    Ollama,
    /// Local LM Studio server.
    #[serde(rename = "lmstudio")]
    #[strum(to_string = "lmstudio")]
    LmStudio,
}
