// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider resolution and HTTP vector requests.
//!
//! Resolution is a small state machine. A forced preference selects its
//! backend directly; `auto` probes Ollama, then LM Studio, each bounded by
//! the probe timeout, and falls back to the remote endpoint. The selection is
//! resolved once and cached by [`HttpEmbeddingProvider`].

use std::time::Duration;

use async_trait::async_trait;
use recall_config::model::EmbeddingConfig;
use recall_core::{
    EmbeddingAdapter, EmbeddingBackend, EmbeddingInput, EmbeddingOutput, HealthStatus,
    PluginAdapter, ProviderPreference, RecallError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Longest error body excerpt kept in a [`RecallError::ProviderHttp`].
const ERROR_BODY_LIMIT: usize = 200;

/// Base URLs and probe budget used during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointHints {
    pub remote_url: String,
    pub ollama_url: String,
    pub lmstudio_url: String,
    pub probe_timeout: Duration,
}

impl EndpointHints {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            remote_url: config.remote_url.clone(),
            ollama_url: config.ollama_url.clone(),
            lmstudio_url: config.lmstudio_url.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        }
    }

    fn base_url(&self, backend: EmbeddingBackend) -> &str {
        match backend {
            EmbeddingBackend::Remote => &self.remote_url,
            EmbeddingBackend::Ollama => &self.ollama_url,
            EmbeddingBackend::LmStudio => &self.lmstudio_url,
        }
    }
}

/// The backend chosen for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSelection {
    pub provider: EmbeddingBackend,
    pub base_url: String,
}

/// States of provider resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    ForcedRemote,
    ForcedLocalA,
    ForcedLocalB,
    ProbingLocalA,
    ProbingLocalB,
    FallbackRemote,
}

impl ResolveState {
    /// Entry state for a preference.
    pub fn initial(preference: ProviderPreference) -> Self {
        match preference {
            ProviderPreference::Auto => ResolveState::ProbingLocalA,
            ProviderPreference::Remote => ResolveState::ForcedRemote,
            ProviderPreference::Ollama => ResolveState::ForcedLocalA,
            ProviderPreference::LmStudio => ResolveState::ForcedLocalB,
        }
    }

    /// Backend this state selects or probes.
    pub fn backend(self) -> EmbeddingBackend {
        match self {
            ResolveState::ForcedRemote | ResolveState::FallbackRemote => EmbeddingBackend::Remote,
            ResolveState::ForcedLocalA | ResolveState::ProbingLocalA => EmbeddingBackend::Ollama,
            ResolveState::ForcedLocalB | ResolveState::ProbingLocalB => EmbeddingBackend::LmStudio,
        }
    }

    /// State to move to when this state's probe fails. `None` for terminal
    /// states, which select their backend unconditionally.
    pub fn on_probe_failure(self) -> Option<Self> {
        match self {
            ResolveState::ProbingLocalA => Some(ResolveState::ProbingLocalB),
            ResolveState::ProbingLocalB => Some(ResolveState::FallbackRemote),
            ResolveState::ForcedRemote
            | ResolveState::ForcedLocalA
            | ResolveState::ForcedLocalB
            | ResolveState::FallbackRemote => None,
        }
    }
}

/// Resolve which backend to use for `preference`.
///
/// Only `auto` touches the network. Probe failures and timeouts advance the
/// state machine; cancellation aborts resolution.
pub async fn resolve_provider(
    client: &reqwest::Client,
    preference: ProviderPreference,
    hints: &EndpointHints,
    cancel: &CancellationToken,
) -> Result<ProviderSelection, RecallError> {
    let mut state = ResolveState::initial(preference);
    loop {
        let backend = state.backend();
        let base_url = hints.base_url(backend);
        let Some(next) = state.on_probe_failure() else {
            info!(%preference, provider = %backend, base_url, "embedding provider selected");
            return Ok(ProviderSelection {
                provider: backend,
                base_url: base_url.to_string(),
            });
        };

        match probe(client, backend, base_url, hints.probe_timeout, cancel).await {
            Ok(()) => {
                info!(%preference, provider = %backend, base_url, "embedding provider detected");
                return Ok(ProviderSelection {
                    provider: backend,
                    base_url: base_url.to_string(),
                });
            }
            Err(RecallError::Cancelled) => return Err(RecallError::Cancelled),
            Err(e) if e.is_provider_error() => {
                debug!(from = ?state, to = ?next, error = %e, "provider probe failed");
                state = next;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Check that the backend's listing endpoint answers with success within
/// `timeout`.
async fn probe(
    client: &reqwest::Client,
    backend: EmbeddingBackend,
    base_url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(), RecallError> {
    let url = probe_endpoint(backend, base_url);
    let request = tokio::time::timeout(timeout, client.get(&url).send());
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RecallError::Cancelled),
        outcome = request => outcome,
    };
    match outcome {
        Ok(Ok(response)) if response.status().is_success() => Ok(()),
        Ok(Ok(response)) => Err(RecallError::ProviderHttp {
            status: response.status().as_u16(),
            message: format!("probe of {url} rejected"),
        }),
        Ok(Err(e)) => Err(RecallError::Provider {
            message: format!("probe of {url} failed: {e}"),
            source: Some(Box::new(e)),
        }),
        Err(_) => Err(RecallError::Timeout { duration: timeout }),
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

fn probe_endpoint(backend: EmbeddingBackend, base_url: &str) -> String {
    let base = trim_base(base_url);
    match backend {
        EmbeddingBackend::Ollama => format!("{base}/api/tags"),
        EmbeddingBackend::LmStudio | EmbeddingBackend::Remote => {
            if has_version_suffix(base) {
                format!("{base}/models")
            } else {
                format!("{base}/v1/models")
            }
        }
    }
}

fn embeddings_endpoint(backend: EmbeddingBackend, base_url: &str) -> String {
    let base = trim_base(base_url);
    match backend {
        EmbeddingBackend::Ollama => format!("{base}/api/embeddings"),
        EmbeddingBackend::LmStudio | EmbeddingBackend::Remote => {
            if base.ends_with("/embeddings") {
                base.to_string()
            } else if has_version_suffix(base) {
                format!("{base}/embeddings")
            } else {
                format!("{base}/v1/embeddings")
            }
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// One embedding request.
#[derive(Debug, Clone, Copy)]
pub struct VectorRequest<'a> {
    pub selection: &'a ProviderSelection,
    pub model: &'a str,
    pub text: &'a str,
    /// Bearer key sent to the remote backend only.
    pub api_key: Option<&'a str>,
}

/// Request one vector from the selected backend.
///
/// Single attempt, no retry. Fails with `InvalidInput` for blank text,
/// `ProviderHttp` for a non-success status, `ProviderEmpty` when no vector
/// can be extracted, `Provider` for transport errors and `Cancelled` when
/// `cancel` fires first.
pub async fn request_vector(
    client: &reqwest::Client,
    request: VectorRequest<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<f32>, RecallError> {
    if request.text.trim().is_empty() {
        return Err(RecallError::InvalidInput("embedding text is empty".into()));
    }

    let backend = request.selection.provider;
    let url = embeddings_endpoint(backend, &request.selection.base_url);
    let builder = match backend {
        EmbeddingBackend::Ollama => client.post(&url).json(&OllamaRequest {
            model: request.model,
            prompt: request.text,
        }),
        EmbeddingBackend::LmStudio => client.post(&url).json(&OpenAiRequest {
            model: request.model,
            input: request.text,
        }),
        EmbeddingBackend::Remote => {
            let builder = client.post(&url).json(&OpenAiRequest {
                model: request.model,
                input: request.text,
            });
            match request.api_key {
                Some(key) if !key.is_empty() => builder.bearer_auth(key),
                _ => builder,
            }
        }
    };

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RecallError::Cancelled),
        result = builder.send() => result.map_err(|e| RecallError::Provider {
            message: format!("embedding request to {url} failed: {e}"),
            source: Some(Box::new(e)),
        })?,
    };
    let status = response.status();
    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RecallError::Cancelled),
        result = response.bytes() => result.map_err(|e| RecallError::Provider {
            message: format!("failed to read embedding response: {e}"),
            source: Some(Box::new(e)),
        })?,
    };

    debug!(provider = %backend, status = %status, bytes = body.len(), "embedding response received");

    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        let message: String = text.chars().take(ERROR_BODY_LIMIT).collect();
        return Err(RecallError::ProviderHttp {
            status: status.as_u16(),
            message,
        });
    }

    let vector = match backend {
        EmbeddingBackend::Ollama => serde_json::from_slice::<OllamaResponse>(&body)
            .map(|r| r.embedding)
            .ok(),
        EmbeddingBackend::LmStudio | EmbeddingBackend::Remote => {
            serde_json::from_slice::<OpenAiResponse>(&body)
                .ok()
                .and_then(|r| r.data.into_iter().next())
                .map(|d| d.embedding)
        }
    };

    match vector {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RecallError::ProviderEmpty(format!(
            "{backend} response from {url} carried no embedding"
        ))),
    }
}

/// Embedding adapter over the resolved HTTP backend.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    preference: ProviderPreference,
    hints: EndpointHints,
    model: String,
    api_key: Option<String>,
    selection: OnceCell<ProviderSelection>,
    cancel: CancellationToken,
}

impl HttpEmbeddingProvider {
    /// Creates a provider from the `[embedding]` config section.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RecallError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RecallError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            preference: config.provider,
            hints: EndpointHints::from_config(config),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            selection: OnceCell::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Requests and probes abort with `Cancelled` once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The resolved backend, probing on first use.
    pub async fn selection(&self) -> Result<&ProviderSelection, RecallError> {
        self.selection
            .get_or_try_init(|| resolve_provider(&self.client, self.preference, &self.hints, &self.cancel))
            .await
    }

    /// Request one vector through the resolved backend.
    pub async fn request(&self, text: &str) -> Result<Vec<f32>, RecallError> {
        let selection = self.selection().await?;
        request_vector(
            &self.client,
            VectorRequest {
                selection,
                model: &self.model,
                text,
                api_key: self.api_key.as_deref(),
            },
            &self.cancel,
        )
        .await
    }
}

#[async_trait]
impl PluginAdapter for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        "http-embedding"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        match self.selection().await {
            Ok(selection) if self.preference == ProviderPreference::Auto
                && selection.provider == EmbeddingBackend::Remote =>
            {
                Ok(HealthStatus::Degraded(
                    "no local embedding server found, using remote".into(),
                ))
            }
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for HttpEmbeddingProvider {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.request(text).await?);
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}
