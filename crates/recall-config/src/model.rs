// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Recall memory subsystem.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use recall_core::ProviderPreference;
use serde::{Deserialize, Serialize};

/// Top-level Recall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecallConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Durable vector cache settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Candidate retrieval and scoring settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Durable vector cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Enable the durable vector cache. When false the store runs in
    /// unsupported mode and every operation is a no-op.
    #[serde(default = "default_storage_enabled")]
    pub enabled: bool,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Namespace of the vector cache inside the database.
    #[serde(default = "default_storage_name")]
    pub storage_name: String,

    /// Byte budget for stored vectors (sum of `dimension * 4`).
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_storage_enabled(),
            database_path: default_database_path(),
            storage_name: default_storage_name(),
            max_bytes: default_max_bytes(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_storage_enabled() -> bool {
    true
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recall").join("recall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_storage_name() -> String {
    "vector-cache".to_string()
}

fn default_max_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_wal_mode() -> bool {
    true
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Provider preference: `auto`, `remote`, `ollama` (`local-a`) or `lmstudio` (`local-b`).
    #[serde(default)]
    pub provider: ProviderPreference,

    /// Embedding model name sent with every request.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible remote endpoint.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Base URL of the local Ollama daemon.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Base URL of the local LM Studio server.
    #[serde(default = "default_lmstudio_url")]
    pub lmstudio_url: String,

    /// API key for the remote endpoint. `None` sends no Authorization header.
    /// Read from config or `RECALL_EMBEDDING_API_KEY`, never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Timeout for each local endpoint probe, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for a single embedding request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Dimensionality of the lexical fallback vectors.
    #[serde(default = "default_fallback_dimensions")]
    pub fallback_dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderPreference::default(),
            model: default_embedding_model(),
            remote_url: default_remote_url(),
            ollama_url: default_ollama_url(),
            lmstudio_url: default_lmstudio_url(),
            api_key: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_dimensions: default_fallback_dimensions(),
        }
    }
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_remote_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_lmstudio_url() -> String {
    "http://127.0.0.1:1234".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    800
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fallback_dimensions() -> usize {
    256
}

/// Candidate retrieval and scoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Maximum number of store matches returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a store match (-1.0 to 1.0).
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Blend vector similarity into candidate scores.
    #[serde(default = "default_use_vectors")]
    pub use_vectors: bool,

    /// Maximum number of scored candidates returned. 0 means unlimited.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            use_vectors: default_use_vectors(),
            limit: default_limit(),
        }
    }
}

fn default_top_k() -> usize {
    12
}

fn default_min_similarity() -> f32 {
    0.18
}

fn default_use_vectors() -> bool {
    true
}

fn default_limit() -> usize {
    8
}
