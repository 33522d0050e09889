// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types and vector math for the retrieval core.

use serde::{Deserialize, Serialize};

/// Default number of matches returned by [`crate::VectorStore::get`].
pub const DEFAULT_TOP_K: usize = 12;

/// Default similarity floor for [`crate::VectorStore::get`].
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.18;

/// A stored vector with its bookkeeping fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    /// Unique key within the store namespace.
    pub id: String,
    /// L2-normalized vector (unscaled if all zeros).
    pub vector: Vec<f32>,
    /// Caller-defined payload.
    pub metadata: Option<serde_json::Value>,
    /// Monotonic access stamp in milliseconds since the Unix epoch.
    pub last_access: i64,
    /// `vector.len() * 4`.
    pub byte_size: usize,
}

/// A vector to be written by [`crate::VectorStore::put_many`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewVector {
    pub id: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// One ranked result of a similarity scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub similarity: f32,
    pub metadata: Option<serde_json::Value>,
}

/// Options for a similarity scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GetOptions {
    pub top_k: usize,
    pub min_similarity: f32,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

/// Size report of a vector store.
///
/// `supported = false` means no durable backend is available and the store
/// is running as a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSize {
    pub entry_count: u64,
    pub total_bytes: u64,
    pub supported: bool,
}

/// A unit of conversational memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub turn: u32,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A raw transcript or board entry as produced by the conversation board.
///
/// Every field is optional; [`crate::board_entries_to_chunks`] fills the
/// gaps. `content` stays a raw JSON value so entries with non-text content
/// survive deserialization and are dropped later by the embedder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub turn: Option<u32>,
    #[serde(default, alias = "agent", alias = "agent_id")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// A candidate with its retrieval scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate<T> {
    pub entry: T,
    /// Combined score, always positive.
    pub score: f32,
    pub vector_score: Option<f32>,
    pub lexical_score: f32,
}

/// Returns true if `v` is non-empty and every component is finite.
pub fn is_usable_vector(v: &[f32]) -> bool {
    !v.is_empty() && v.iter().all(|x| x.is_finite())
}

/// L2-normalize a vector.
///
/// Returns `None` for empty or non-finite input. The all-zero vector is
/// returned unscaled.
pub fn normalize(v: &[f32]) -> Option<Vec<f32>> {
    if !is_usable_vector(v) {
        return None;
    }
    let sum_sq: f64 = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    if sum_sq == 0.0 {
        return Some(v.to_vec());
    }
    let scale = 1.0 / sum_sq.sqrt();
    Some(v.iter().map(|&x| (f64::from(x) * scale) as f32).collect())
}

/// Dot product over the overlapping prefix of `a` and `b`.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity over the overlapping prefix of `a` and `b`.
///
/// Returns 0 when either side has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}
