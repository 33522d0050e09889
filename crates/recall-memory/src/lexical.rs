// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic lexical vectors and token-overlap scoring.
//!
//! The lexical embedder is the fallback when the embedding provider fails:
//! it hashes each token into a fixed-size signed bag-of-words vector, so the
//! same text always yields the same vector without any network access.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::types::normalize;

/// Default dimensionality of lexical vectors.
pub const DEFAULT_LEXICAL_DIMENSIONS: usize = 256;

/// Split text into lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Pure, deterministic text-to-vector fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalEmbedder {
    dimensions: usize,
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_LEXICAL_DIMENSIONS)
    }
}

impl LexicalEmbedder {
    /// Creates an embedder producing `dimensions`-long vectors (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed `text` as a normalized signed token-hash vector.
    ///
    /// Text without tokens yields the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        normalize(&v).unwrap_or(v)
    }
}

/// Fraction of distinct query tokens that also occur in `text`.
///
/// Returns 0 when the query has no tokens.
pub fn lexical_overlap_score(query: &str, text: &str) -> f32 {
    let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
    if query_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens: HashSet<String> = tokenize(text).into_iter().collect();
    let hits = query_tokens
        .iter()
        .filter(|t| text_tokens.contains(*t))
        .count();
    hits as f32 / query_tokens.len() as f32
}
