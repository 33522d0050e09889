// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall index` command implementation.
//!
//! Reads a JSON array of board entries, converts them to chunks, embeds
//! each chunk and registers it in the vector store.

use std::path::Path;

use recall_config::model::RecallConfig;
use recall_core::RecallError;
use recall_memory::{
    BoardEntry, Chunk, EmbedHooks, StoreSize, VectorStoreSink, board_entries_to_chunks,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::{build_embedder, open_store};

/// Structured index output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub entries: usize,
    pub embedded: usize,
    pub skipped: usize,
    pub store: StoreSize,
}

/// Parse a board export. Accepts a bare array or `{"entries": [...]}`.
pub fn parse_board(content: &str) -> Result<Vec<BoardEntry>, RecallError> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Board {
        Bare(Vec<BoardEntry>),
        Wrapped { entries: Vec<BoardEntry> },
    }

    match serde_json::from_str::<Board>(content) {
        Ok(Board::Bare(entries)) | Ok(Board::Wrapped { entries }) => Ok(entries),
        Err(e) => Err(RecallError::InvalidInput(format!("invalid board file: {e}"))),
    }
}

/// Run the `recall index` command.
pub async fn run_index(
    config: &RecallConfig,
    path: &Path,
    lexical_only: bool,
    json: bool,
    cancel: &CancellationToken,
) -> Result<(), RecallError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        RecallError::InvalidInput(format!("failed to read {}: {e}", path.display()))
    })?;
    let entries = parse_board(&content)?;
    let chunks = board_entries_to_chunks(&entries);

    let store = open_store(config).await?;
    let embedder = build_embedder(config, lexical_only, cancel)?;
    let sink = VectorStoreSink::new(store.clone());
    let mut progress = |index: usize, chunk: &Chunk| {
        debug!(index, chunk_id = %chunk.id, "chunk indexed");
    };

    let embedded = embedder
        .embed_chunks_with(
            &chunks,
            EmbedHooks {
                sink: Some(&sink),
                after_each: Some(&mut progress),
            },
        )
        .await;

    let report = IndexReport {
        entries: entries.len(),
        embedded: embedded.len(),
        skipped: entries.len() - embedded.len(),
        store: store.size().await?,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!(
            "indexed {} of {} entries ({} skipped), store holds {} vectors / {} bytes",
            report.embedded,
            report.entries,
            report.skipped,
            report.store.entry_count,
            report.store.total_bytes
        );
    }
    Ok(())
}
