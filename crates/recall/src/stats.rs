// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall stats` and `recall evict` command implementations.

use recall_config::model::RecallConfig;
use recall_core::RecallError;
use recall_memory::StoreSize;
use serde::Serialize;

use crate::context::open_store;

/// Structured stats output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub storage_name: String,
    pub database_path: Option<String>,
    pub max_bytes: u64,
    #[serde(flatten)]
    pub size: StoreSize,
}

/// Format a byte count for humans.
fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Run the `recall stats` command.
pub async fn run_stats(config: &RecallConfig, json: bool) -> Result<(), RecallError> {
    let store = open_store(config).await?;
    let options = store.options();
    let response = StatsResponse {
        storage_name: options.storage_name.clone(),
        database_path: options.database_path.clone(),
        max_bytes: options.max_bytes,
        size: store.size().await?,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  recall stats");
    println!("  {}", "-".repeat(35));
    if !response.size.supported {
        println!("    Store:    disabled (no durable storage)");
        println!();
        return Ok(());
    }
    println!("    Store:    {}", response.storage_name);
    if let Some(path) = &response.database_path {
        println!("    Path:     {path}");
    }
    println!("    Vectors:  {}", response.size.entry_count);
    println!(
        "    Bytes:    {} of {}",
        format_bytes(response.size.total_bytes),
        format_bytes(response.max_bytes)
    );
    println!();
    Ok(())
}

/// Run the `recall evict` command.
pub async fn run_evict(config: &RecallConfig) -> Result<(), RecallError> {
    let store = open_store(config).await?;
    let evicted = store.evict_if_needed().await?;
    let size = store.size().await?;
    println!(
        "evicted {evicted} vectors, {} remain ({} bytes)",
        size.entry_count, size.total_bytes
    );
    Ok(())
}
