// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types and the BLOB codec for persisted vectors.

/// One row of the `vector_cache` table.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRow {
    pub id: String,
    pub vector: Vec<f32>,
    pub dimension: usize,
    /// Opaque JSON text supplied by the caller.
    pub metadata: Option<String>,
    /// Monotonic access stamp in milliseconds.
    pub last_access: i64,
    /// `dimension * 4`.
    pub byte_size: i64,
}

/// A vector about to be written. `dimension` and `byte_size` are derived
/// from `vector` at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVectorRow {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Option<String>,
}

/// Result of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvictionOutcome {
    /// Ids removed, in eviction order.
    pub evicted: Vec<String>,
    /// Namespace size after the pass.
    pub remaining: RowStats,
}

/// Aggregate size of one namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub count: u64,
    pub total_bytes: u64,
}

/// Serialize an f32 vector into a little-endian byte BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize a little-endian byte BLOB into an f32 vector.
///
/// Returns `None` when the length is not a multiple of four.
pub fn blob_to_vec(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}
