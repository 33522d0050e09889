// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval memory core for the Recall agent memory.
//!
//! Turns conversation chunks into vectors, keeps them in a size-bounded
//! SQLite cache and ranks retrieval candidates by blending vector similarity
//! with lexical overlap.
//!
//! ## Architecture
//!
//! - **VectorStore**: normalized vectors, linear similarity scan, LRU eviction
//!   under a byte budget, no-op mode when storage is unavailable
//! - **ChunkEmbedder**: per-chunk primary embedding with lexical fallback and
//!   registration/post-processing hooks
//! - **RetrievalScorer**: `0.8 * vector + 0.2 * lexical` ranking over opaque
//!   candidates
//! - **HttpEmbeddingProvider**: Ollama / LM Studio / remote resolution and
//!   embedding requests
//! - **LexicalEmbedder**: deterministic token-hash vectors

pub mod chunks;
pub mod embedder;
pub mod lexical;
pub mod provider;
pub mod scorer;
pub mod store;
pub mod types;

pub use chunks::{board_entries_to_chunks, merge_embeddings};
pub use embedder::{
    CONTENT_EXCERPT_CHARS, ChunkEmbedder, ChunkSink, EmbedHooks, VectorSource, VectorStoreSink,
};
pub use lexical::{LexicalEmbedder, lexical_overlap_score};
pub use provider::{
    EndpointHints, HttpEmbeddingProvider, ProviderSelection, ResolveState, VectorRequest,
    request_vector, resolve_provider,
};
pub use scorer::{ChunkVectorResolver, RetrievalScorer, StoreResolver, VectorResolver, combined_score};
pub use store::{VectorStore, VectorStoreOptions};
pub use types::*;
