// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall provider` command implementation.
//!
//! Resolves the embedding backend the same way indexing would and prints
//! the selection.

use recall_config::model::RecallConfig;
use recall_core::{HealthStatus, PluginAdapter, RecallError};
use recall_memory::HttpEmbeddingProvider;
use tokio_util::sync::CancellationToken;

/// Run the `recall provider` command.
pub async fn run_provider(
    config: &RecallConfig,
    json: bool,
    cancel: &CancellationToken,
) -> Result<(), RecallError> {
    let provider = HttpEmbeddingProvider::new(&config.embedding)?.with_cancellation(cancel.clone());
    let selection = provider.selection().await?.clone();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&selection).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!(
        "provider: {} ({}) model={}",
        selection.provider, selection.base_url, config.embedding.model
    );
    if let HealthStatus::Degraded(reason) = provider.health_check().await? {
        println!("note: {reason}");
    }
    Ok(())
}
