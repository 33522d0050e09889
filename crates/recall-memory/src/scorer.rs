// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate ranking by a weighted blend of vector and lexical scores.
//!
//! The combined score is `vector * 0.8 + lexical * 0.2` when a vector score
//! is available, and the lexical score alone otherwise. Candidates whose
//! combined score is not positive are not matches and are dropped. A failed
//! vector resolution only removes that candidate's vector score.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use recall_core::RecallError;
use tracing::debug;

use crate::store::VectorStore;
use crate::types::{Chunk, ScoredCandidate, cosine_similarity, is_usable_vector};

/// Weight of the vector similarity in the combined score.
pub const VECTOR_WEIGHT: f32 = 0.8;

/// Weight of the lexical score in the combined score.
pub const LEXICAL_WEIGHT: f32 = 0.2;

/// Similarity between a query vector and a candidate vector.
pub type SimilarityFn = fn(&[f32], &[f32]) -> f32;

type LexicalFn<'a, T> = Box<dyn Fn(&T) -> f32 + Send + Sync + 'a>;
type DiagnosticFn<'a, T> = Box<dyn Fn(&RecallError, &T) + Send + Sync + 'a>;

/// Looks up the vector of a candidate.
#[async_trait]
pub trait VectorResolver<T: Sync>: Send + Sync {
    async fn resolve(&self, candidate: &T) -> Result<Vec<f32>, RecallError>;
}

/// Resolves candidates from a [`VectorStore`] by id.
pub struct StoreResolver<F> {
    store: Arc<VectorStore>,
    id_of: F,
}

impl<F> StoreResolver<F> {
    /// `id_of` maps a candidate to its store id.
    pub fn new(store: Arc<VectorStore>, id_of: F) -> Self {
        Self { store, id_of }
    }
}

#[async_trait]
impl<T, F> VectorResolver<T> for StoreResolver<F>
where
    T: Sync,
    F: Fn(&T) -> String + Send + Sync,
{
    async fn resolve(&self, candidate: &T) -> Result<Vec<f32>, RecallError> {
        let id = (self.id_of)(candidate);
        match self.store.get_by_id(&id).await? {
            Some(record) => Ok(record.vector),
            None => Err(RecallError::InvalidInput(format!("no stored vector for {id}"))),
        }
    }
}

/// Reuses the embedding a chunk already carries.
pub struct ChunkVectorResolver;

#[async_trait]
impl VectorResolver<Chunk> for ChunkVectorResolver {
    async fn resolve(&self, candidate: &Chunk) -> Result<Vec<f32>, RecallError> {
        candidate
            .embedding
            .clone()
            .ok_or_else(|| RecallError::InvalidInput(format!("chunk {} has no embedding", candidate.id)))
    }
}

/// Combine a vector score and a lexical score.
pub fn combined_score(vector_score: Option<f32>, lexical_score: f32) -> f32 {
    match vector_score {
        Some(v) => v * VECTOR_WEIGHT + lexical_score * LEXICAL_WEIGHT,
        None => lexical_score,
    }
}

/// Ranks candidates of an opaque type `T`.
pub struct RetrievalScorer<'a, T: Sync> {
    lexical: Option<LexicalFn<'a, T>>,
    use_vectors: bool,
    query_vector: Option<Vec<f32>>,
    resolver: Option<&'a dyn VectorResolver<T>>,
    similarity: Option<SimilarityFn>,
    on_resolve_error: Option<DiagnosticFn<'a, T>>,
    limit: usize,
}

impl<T: Sync> Default for RetrievalScorer<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Sync> RetrievalScorer<'a, T> {
    /// A scorer with no lexical scorer, vectors enabled, cosine similarity
    /// and no limit.
    pub fn new() -> Self {
        Self {
            lexical: None,
            use_vectors: true,
            query_vector: None,
            resolver: None,
            similarity: Some(cosine_similarity),
            on_resolve_error: None,
            limit: 0,
        }
    }

    pub fn with_lexical(mut self, scorer: impl Fn(&T) -> f32 + Send + Sync + 'a) -> Self {
        self.lexical = Some(Box::new(scorer));
        self
    }

    /// Score candidates against `query` through `resolver`.
    pub fn with_vectors(mut self, query: Vec<f32>, resolver: &'a dyn VectorResolver<T>) -> Self {
        self.query_vector = Some(query);
        self.resolver = Some(resolver);
        self
    }

    pub fn use_vectors(mut self, enabled: bool) -> Self {
        self.use_vectors = enabled;
        self
    }

    /// Replace the similarity function. `None` disables vector scoring.
    pub fn with_similarity(mut self, similarity: Option<SimilarityFn>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Called with the error and candidate whenever resolution fails.
    pub fn on_resolve_error(mut self, callback: impl Fn(&RecallError, &T) + Send + Sync + 'a) -> Self {
        self.on_resolve_error = Some(Box::new(callback));
        self
    }

    /// Keep at most `limit` results. 0 keeps all.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Score, filter, rank and truncate `candidates`.
    pub async fn score(&self, candidates: Vec<T>) -> Vec<ScoredCandidate<T>> {
        let vector_inputs = match (&self.query_vector, self.resolver, self.similarity) {
            (Some(query), Some(resolver), Some(similarity))
                if self.use_vectors && is_usable_vector(query) =>
            {
                Some((query.as_slice(), resolver, similarity))
            }
            _ => None,
        };

        let total = candidates.len();
        let mut unresolved = 0usize;
        let mut scored = Vec::with_capacity(total);

        for entry in candidates {
            let lexical_score = self
                .lexical
                .as_ref()
                .map(|f| f(&entry))
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);

            let vector_score = match vector_inputs {
                Some((query, resolver, similarity)) => {
                    match self.vector_score(&entry, query, resolver, similarity).await {
                        Ok(score) => Some(score),
                        Err(e) => {
                            unresolved += 1;
                            if let Some(callback) = &self.on_resolve_error {
                                callback(&e, &entry);
                            }
                            None
                        }
                    }
                }
                None => None,
            };

            let score = combined_score(vector_score, lexical_score);
            // NaN fails this comparison too.
            if !(score > 0.0) {
                continue;
            }
            scored.push(ScoredCandidate {
                entry,
                score,
                vector_score,
                lexical_score,
            });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        if self.limit > 0 {
            scored.truncate(self.limit);
        }

        debug!(
            candidates = total,
            kept = scored.len(),
            unresolved,
            vectors = vector_inputs.is_some(),
            "candidates scored"
        );
        scored
    }

    async fn vector_score(
        &self,
        entry: &T,
        query: &[f32],
        resolver: &dyn VectorResolver<T>,
        similarity: SimilarityFn,
    ) -> Result<f32, RecallError> {
        let vector = resolver.resolve(entry).await?;
        if !is_usable_vector(&vector) {
            return Err(RecallError::InvalidInput(
                "resolved vector is empty or non-finite".into(),
            ));
        }
        let score = similarity(query, &vector);
        if score.is_finite() {
            Ok(score)
        } else {
            Err(RecallError::InvalidInput("similarity is not finite".into()))
        }
    }
}
