// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential chunk embedding with a deterministic lexical fallback.
//!
//! Each chunk is embedded with the primary adapter when one is configured.
//! Any failure, or an empty/non-finite vector, falls back to the lexical
//! embedder for that chunk without retrying the primary. Chunks are handled
//! one at a time and their hooks run before the next chunk starts, so hook
//! indices always match output positions.

use std::sync::Arc;

use async_trait::async_trait;
use recall_core::{EmbeddingAdapter, RecallError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::lexical::LexicalEmbedder;
use crate::store::VectorStore;
use crate::types::{Chunk, NewVector, is_usable_vector};

/// Registration hook: persists an embedded chunk.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    async fn register(&self, chunk: &Chunk) -> Result<(), RecallError>;
}

/// Longest content excerpt kept in stored metadata, in characters.
pub const CONTENT_EXCERPT_CHARS: usize = 1024;

/// Registers embedded chunks into a [`VectorStore`].
///
/// Metadata carries `agent_id`, `round`, `turn`, `ts` and `summary` so
/// retrieval results can be traced back to the conversation, plus a
/// `content` excerpt for lexical scoring.
pub struct VectorStoreSink {
    store: Arc<VectorStore>,
}

impl VectorStoreSink {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChunkSink for VectorStoreSink {
    async fn register(&self, chunk: &Chunk) -> Result<(), RecallError> {
        let Some(embedding) = chunk.embedding.clone() else {
            return Ok(());
        };
        let metadata = serde_json::json!({
            "agent_id": chunk.agent_id,
            "round": chunk.round,
            "turn": chunk.turn,
            "ts": chunk.ts,
            "summary": chunk.summary,
            "content": content_excerpt(&chunk.content),
        });
        self.store
            .put_many(vec![NewVector {
                id: chunk.id.clone(),
                embedding,
                metadata: Some(metadata),
            }])
            .await?;
        Ok(())
    }
}

/// The first [`CONTENT_EXCERPT_CHARS`] characters of `content`.
fn content_excerpt(content: &str) -> &str {
    match content.char_indices().nth(CONTENT_EXCERPT_CHARS) {
        Some((end, _)) => &content[..end],
        None => content,
    }
}

/// Where a chunk's vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSource {
    Primary,
    Lexical,
}

/// Optional per-chunk side effects, run in field order.
#[derive(Default)]
pub struct EmbedHooks<'a> {
    pub sink: Option<&'a dyn ChunkSink>,
    pub after_each: Option<&'a mut (dyn FnMut(usize, &Chunk) + Send)>,
}

/// Drives the primary embedder over chunks with lexical fallback.
pub struct ChunkEmbedder {
    primary: Option<Arc<dyn EmbeddingAdapter>>,
    fallback: LexicalEmbedder,
    cancel: CancellationToken,
}

impl ChunkEmbedder {
    /// Creates an embedder using `primary`, falling back to `fallback`.
    pub fn new(primary: Arc<dyn EmbeddingAdapter>, fallback: LexicalEmbedder) -> Self {
        Self {
            primary: Some(primary),
            fallback,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates an embedder that only produces lexical vectors.
    pub fn lexical_only(fallback: LexicalEmbedder) -> Self {
        Self {
            primary: None,
            fallback,
            cancel: CancellationToken::new(),
        }
    }

    /// Primary calls in flight when `token` is cancelled fall back to lexical.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Resolve a vector for `text`, reporting which embedder produced it.
    pub async fn resolve_vector(&self, text: &str) -> (Vec<f32>, VectorSource) {
        if let Some(primary) = &self.primary {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(RecallError::Cancelled),
                r = primary.embed_text(text) => r,
            };
            match result {
                Ok(vector) if is_usable_vector(&vector) => return (vector, VectorSource::Primary),
                Ok(_) => {
                    warn!(
                        adapter = primary.name(),
                        "primary embedder returned an unusable vector, using lexical fallback"
                    );
                }
                Err(e) => {
                    warn!(
                        adapter = primary.name(),
                        error = %e,
                        "primary embedder failed, using lexical fallback"
                    );
                }
            }
        }
        (self.fallback.embed(text), VectorSource::Lexical)
    }

    /// Embed chunks without side effects.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        self.embed_chunks_with(chunks, EmbedHooks::default()).await
    }

    /// Embed chunks, running the registration hook then `after_each` for
    /// every produced chunk before moving to the next one.
    ///
    /// Chunks with blank content are dropped, so the output may be shorter
    /// than the input. Hook failures are logged and do not stop the batch.
    pub async fn embed_chunks_with(&self, chunks: &[Chunk], mut hooks: EmbedHooks<'_>) -> Vec<Chunk> {
        let mut out = Vec::with_capacity(chunks.len());
        let mut dropped = 0usize;
        let mut fallbacks = 0usize;

        for chunk in chunks {
            if chunk.content.trim().is_empty() {
                dropped += 1;
                continue;
            }

            let (vector, source) = self.resolve_vector(&chunk.content).await;
            if source == VectorSource::Lexical {
                fallbacks += 1;
            }
            let mut enriched = chunk.clone();
            enriched.embedding = Some(vector);

            let index = out.len();
            if let Some(sink) = hooks.sink
                && let Err(e) = sink.register(&enriched).await
            {
                warn!(chunk_id = %enriched.id, error = %e, "chunk registration failed");
            }
            if let Some(after_each) = hooks.after_each.as_mut() {
                after_each(index, &enriched);
            }
            out.push(enriched);
        }

        debug!(
            embedded = out.len(),
            dropped, fallbacks, "chunk embedding complete"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter};
    use std::sync::Mutex;

    /// Fails for any text containing "fail", returns an empty vector for
    /// "empty", otherwise a fixed vector.
    struct Scripted;

    #[async_trait]
    impl PluginAdapter for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        async fn health_check(&self) -> Result<HealthStatus, RecallError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl EmbeddingAdapter for Scripted {
        async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, RecallError> {
            let text = &input.texts[0];
            if text.contains("fail") {
                return Err(RecallError::ProviderHttp {
                    status: 500,
                    message: "boom".into(),
                });
            }
            let v = if text.contains("empty") { vec![] } else { vec![1.0, 2.0] };
            Ok(EmbeddingOutput {
                embeddings: vec![v],
                dimensions: 2,
            })
        }
    }

    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl ChunkSink for Recording {
        async fn register(&self, chunk: &Chunk) -> Result<(), RecallError> {
            self.0.lock().unwrap().push(chunk.id.clone());
            if chunk.id == "reject" {
                return Err(RecallError::Internal("sink rejected".into()));
            }
            Ok(())
        }
    }

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.into(),
            content: content.into(),
            ..Chunk::default()
        }
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_lexical_for_that_text() {
        let lexical = LexicalEmbedder::new(32);
        let embedder = ChunkEmbedder::new(Arc::new(Scripted), lexical);
        let out = embedder
            .embed_chunks(&[chunk("a", "works fine"), chunk("b", "this will fail")])
            .await;

        assert_eq!(out[0].embedding, Some(vec![1.0, 2.0]));
        assert_eq!(out[1].embedding, Some(lexical.embed("this will fail")));
    }

    #[tokio::test]
    async fn empty_primary_vector_falls_back() {
        let lexical = LexicalEmbedder::new(16);
        let embedder = ChunkEmbedder::new(Arc::new(Scripted), lexical);
        let (vector, source) = embedder.resolve_vector("empty please").await;
        assert_eq!(source, VectorSource::Lexical);
        assert_eq!(vector, lexical.embed("empty please"));
    }

    #[tokio::test]
    async fn cancelled_token_uses_fallback() {
        let token = CancellationToken::new();
        token.cancel();
        let embedder = ChunkEmbedder::new(Arc::new(Scripted), LexicalEmbedder::new(8))
            .with_cancellation(token);
        let (_, source) = embedder.resolve_vector("works").await;
        assert_eq!(source, VectorSource::Lexical);
    }

    #[tokio::test]
    async fn blank_chunks_are_dropped_and_indices_match_output() {
        let embedder = ChunkEmbedder::lexical_only(LexicalEmbedder::new(8));
        let sink = Recording(Mutex::new(Vec::new()));
        let mut seen = Vec::new();
        let mut after_each = |i: usize, c: &Chunk| seen.push((i, c.id.clone()));

        let input = [chunk("a", "alpha"), chunk("blank", "   "), chunk("reject", "beta"), chunk("c", "gamma")];
        let out = embedder
            .embed_chunks_with(
                &input,
                EmbedHooks {
                    sink: Some(&sink),
                    after_each: Some(&mut after_each),
                },
            )
            .await;

        let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "reject", "c"]);
        assert_eq!(
            seen,
            vec![(0, "a".to_string()), (1, "reject".to_string()), (2, "c".to_string())]
        );
        assert_eq!(*sink.0.lock().unwrap(), vec!["a", "reject", "c"]);
        assert!(input.iter().all(|c| c.embedding.is_none()), "input must not be mutated");
    }

    #[tokio::test]
    async fn store_sink_persists_metadata() {
        let db = recall_storage::Database::open_in_memory().await.unwrap();
        let store = Arc::new(VectorStore::with_database(
            db,
            crate::store::VectorStoreOptions {
                storage_name: "chunks".into(),
                max_bytes: 1 << 20,
                database_path: None,
                wal_mode: false,
            },
        ));
        let sink = VectorStoreSink::new(Arc::clone(&store));
        let embedder = ChunkEmbedder::lexical_only(LexicalEmbedder::new(16));

        let mut c = chunk("t1", "ship the cache");
        c.agent_id = "planner".into();
        c.turn = 4;
        embedder
            .embed_chunks_with(
                &[c],
                EmbedHooks {
                    sink: Some(&sink),
                    after_each: None,
                },
            )
            .await;

        let record = store.get_by_id("t1").await.unwrap().unwrap();
        let metadata = record.metadata.unwrap();
        assert_eq!(metadata["agent_id"], "planner");
        assert_eq!(metadata["turn"], 4);
        assert_eq!(metadata["round"], 0);
        assert_eq!(metadata["content"], "ship the cache");
    }

    #[test]
    fn content_excerpt_is_bounded_on_char_boundaries() {
        assert_eq!(content_excerpt("short"), "short");
        let long = "é".repeat(CONTENT_EXCERPT_CHARS + 10);
        let excerpt = content_excerpt(&long);
        assert_eq!(excerpt.chars().count(), CONTENT_EXCERPT_CHARS);
        assert!(long.starts_with(excerpt));
    }
}
