// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding adapter for deterministic testing.
//!
//! `MockEmbedder` implements `EmbeddingAdapter` with scripted outcomes,
//! enabling fast, CI-runnable tests without a running embedding server.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use recall_core::{
    EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter, RecallError,
};

/// Vector returned when nothing else is scripted.
pub const DEFAULT_MOCK_VECTOR: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// One scripted embedding outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedEmbedding {
    /// Return this vector.
    Vector(Vec<f32>),
    /// Fail with `ProviderHttp` carrying this status.
    HttpError(u16),
    /// Succeed with no vector.
    Empty,
}

/// A mock embedder returning scripted outcomes.
///
/// Per-text vectors take priority; otherwise outcomes are popped from a FIFO
/// queue. When the queue is empty, [`DEFAULT_MOCK_VECTOR`] is returned.
#[derive(Default)]
pub struct MockEmbedder {
    script: Mutex<VecDeque<ScriptedEmbedding>>,
    by_text: Mutex<HashMap<String, Vec<f32>>>,
    calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    /// Create a new mock embedder with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock embedder pre-loaded with the given outcomes.
    pub fn with_script(script: Vec<ScriptedEmbedding>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            ..Self::default()
        }
    }

    /// Always answer `text` with `vector`.
    pub async fn set_vector(&self, text: &str, vector: Vec<f32>) {
        self.by_text.lock().await.insert(text.to_string(), vector);
    }

    /// Add an outcome to the end of the queue.
    pub async fn push(&self, outcome: ScriptedEmbedding) {
        self.script.lock().await.push_back(outcome);
    }

    /// Texts embedded so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn next_outcome(&self, text: &str) -> ScriptedEmbedding {
        if let Some(v) = self.by_text.lock().await.get(text) {
            return ScriptedEmbedding::Vector(v.clone());
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedEmbedding::Vector(DEFAULT_MOCK_VECTOR.to_vec()))
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in input.texts {
            self.calls.lock().await.push(text.clone());
            match self.next_outcome(&text).await {
                ScriptedEmbedding::Vector(v) => embeddings.push(v),
                ScriptedEmbedding::Empty => embeddings.push(Vec::new()),
                ScriptedEmbedding::HttpError(status) => {
                    return Err(RecallError::ProviderHttp {
                        status,
                        message: "scripted failure".to_string(),
                    });
                }
            }
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_vector_when_script_empty() {
        let embedder = MockEmbedder::new();
        assert_eq!(
            embedder.embed_text("anything").await.unwrap(),
            DEFAULT_MOCK_VECTOR.to_vec()
        );
    }

    #[tokio::test]
    async fn scripted_outcomes_returned_in_order() {
        let embedder = MockEmbedder::with_script(vec![
            ScriptedEmbedding::Vector(vec![0.5]),
            ScriptedEmbedding::HttpError(502),
            ScriptedEmbedding::Empty,
        ]);

        assert_eq!(embedder.embed_text("a").await.unwrap(), vec![0.5]);
        let err = embedder.embed_text("b").await.unwrap_err();
        assert_eq!(err.http_status(), Some(502));
        let err = embedder.embed_text("c").await.unwrap_err();
        assert!(matches!(err, RecallError::ProviderEmpty(_)));
        // Script exhausted, falls back to the default.
        assert_eq!(
            embedder.embed_text("d").await.unwrap(),
            DEFAULT_MOCK_VECTOR.to_vec()
        );
        assert_eq!(embedder.calls().await, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn per_text_vectors_take_priority() {
        let embedder = MockEmbedder::with_script(vec![ScriptedEmbedding::HttpError(500)]);
        embedder.set_vector("pinned", vec![0.0, 1.0]).await;
        assert_eq!(embedder.embed_text("pinned").await.unwrap(), vec![0.0, 1.0]);
        // The queued failure is still pending.
        assert!(embedder.embed_text("other").await.is_err());
    }
}
