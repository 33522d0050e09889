// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion helpers between board entries, chunks and embeddings.

use crate::types::{BoardEntry, Chunk};

/// Agent id assigned to entries that do not name one.
pub const UNKNOWN_AGENT: &str = "unknown";

/// Convert raw board entries into chunks.
///
/// Gaps are filled positionally: a missing id becomes `board-{index}`, a
/// missing turn becomes `index + 1`, a missing agent becomes `"unknown"` and
/// a missing round becomes 0. Non-text content becomes an empty string, which
/// the embedder later drops.
pub fn board_entries_to_chunks(entries: &[BoardEntry]) -> Vec<Chunk> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| Chunk {
            id: entry
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("board-{index}")),
            content: match &entry.content {
                Some(serde_json::Value::String(text)) => text.clone(),
                _ => String::new(),
            },
            round: entry.round.unwrap_or(0),
            turn: entry.turn.unwrap_or(index as u32 + 1),
            agent_id: entry
                .agent_id
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| UNKNOWN_AGENT.to_string()),
            ts: entry.ts,
            summary: entry.summary.clone(),
            embedding: None,
        })
        .collect()
}

/// Positionally merge externally computed embeddings onto `chunks`.
///
/// `None` or a missing index leaves the chunk's existing embedding as is.
/// The input is not modified.
pub fn merge_embeddings(chunks: &[Chunk], embeddings: &[Option<Vec<f32>>]) -> Vec<Chunk> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut merged = chunk.clone();
            if let Some(Some(embedding)) = embeddings.get(i) {
                merged.embedding = Some(embedding.clone());
            }
            merged
        })
        .collect()
}
