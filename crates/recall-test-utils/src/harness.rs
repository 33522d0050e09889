// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `StoreHarness` assembles a file-backed vector store in a temp directory,
//! a mock primary embedder and the chunk embedding pipeline around them.

use std::sync::Arc;

use recall_config::model::StorageConfig;
use recall_core::RecallError;
use recall_memory::{
    ChunkEmbedder, LexicalEmbedder, VectorStore, VectorStoreOptions, VectorStoreSink,
};

use crate::mock_embedder::MockEmbedder;

/// Builder for creating test environments with configurable options.
pub struct StoreHarnessBuilder {
    max_bytes: u64,
    storage_name: String,
    lexical_dimensions: usize,
}

impl StoreHarnessBuilder {
    fn new() -> Self {
        Self {
            max_bytes: 1 << 20,
            storage_name: "harness".to_string(),
            lexical_dimensions: 32,
        }
    }

    /// Set the store byte budget.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the store namespace.
    pub fn with_storage_name(mut self, name: &str) -> Self {
        self.storage_name = name.to_string();
        self
    }

    /// Set the lexical fallback dimensionality.
    pub fn with_lexical_dimensions(mut self, dimensions: usize) -> Self {
        self.lexical_dimensions = dimensions;
        self
    }

    /// Build the harness and open the store.
    pub async fn build(self) -> Result<StoreHarness, RecallError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| RecallError::Storage { source: e.into() })?;
        let db_path = temp_dir
            .path()
            .join("recall-test.db")
            .to_string_lossy()
            .into_owned();

        let config = StorageConfig {
            enabled: true,
            database_path: db_path.clone(),
            storage_name: self.storage_name,
            max_bytes: self.max_bytes,
            wal_mode: true,
        };
        let options = VectorStoreOptions::from_config(&config);
        let store = Arc::new(VectorStore::new(options.clone()));
        store.open().await?;

        Ok(StoreHarness {
            store,
            options,
            mock_embedder: Arc::new(MockEmbedder::new()),
            lexical: LexicalEmbedder::new(self.lexical_dimensions),
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock embedder and a temp store.
pub struct StoreHarness {
    /// The opened vector store.
    pub store: Arc<VectorStore>,
    /// Options the store was opened with.
    pub options: VectorStoreOptions,
    /// The mock primary embedder.
    pub mock_embedder: Arc<MockEmbedder>,
    /// The lexical fallback.
    pub lexical: LexicalEmbedder,
    /// Path of the SQLite file.
    pub db_path: String,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl StoreHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> StoreHarnessBuilder {
        StoreHarnessBuilder::new()
    }

    /// Chunk embedder using the mock embedder with lexical fallback.
    pub fn embedder(&self) -> ChunkEmbedder {
        ChunkEmbedder::new(self.mock_embedder.clone(), self.lexical)
    }

    /// Registration hook writing into the harness store.
    pub fn sink(&self) -> VectorStoreSink {
        VectorStoreSink::new(Arc::clone(&self.store))
    }

    /// Open a second store over the same file, with a different budget.
    pub async fn reopen_with_budget(&self, max_bytes: u64) -> Result<VectorStore, RecallError> {
        let options = VectorStoreOptions {
            max_bytes,
            ..self.options.clone()
        };
        let store = VectorStore::new(options);
        store.open().await?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_opens_supported_store() {
        let harness = StoreHarness::builder().with_max_bytes(64).build().await.unwrap();
        let size = harness.store.size().await.unwrap();
        assert!(size.supported);
        assert_eq!(size.entry_count, 0);
        assert!(std::path::Path::new(&harness.db_path).exists());
    }
}
