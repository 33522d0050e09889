// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by the subcommands: store and embedder construction.

use std::sync::Arc;

use recall_config::model::RecallConfig;
use recall_core::RecallError;
use recall_memory::{
    ChunkEmbedder, HttpEmbeddingProvider, LexicalEmbedder, VectorStore, VectorStoreOptions,
};
use tokio_util::sync::CancellationToken;

/// Open the configured vector store.
///
/// A disabled store opens in unsupported mode and never fails.
pub async fn open_store(config: &RecallConfig) -> Result<Arc<VectorStore>, RecallError> {
    let store = Arc::new(VectorStore::new(VectorStoreOptions::from_config(&config.storage)));
    store.open().await?;
    Ok(store)
}

/// Build the chunk embedder: the configured HTTP provider with lexical
/// fallback, or lexical vectors only.
pub fn build_embedder(
    config: &RecallConfig,
    lexical_only: bool,
    cancel: &CancellationToken,
) -> Result<ChunkEmbedder, RecallError> {
    let lexical = LexicalEmbedder::new(config.embedding.fallback_dimensions);
    if lexical_only {
        return Ok(ChunkEmbedder::lexical_only(lexical));
    }
    let provider = HttpEmbeddingProvider::new(&config.embedding)?.with_cancellation(cancel.clone());
    Ok(ChunkEmbedder::new(Arc::new(provider), lexical).with_cancellation(cancel.clone()))
}

/// Cancel `token` on Ctrl-C so in-flight provider calls fall back quickly.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling provider calls");
            token.cancel();
        }
    });
}
