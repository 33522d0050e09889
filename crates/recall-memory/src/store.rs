// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector store with LRU eviction under a byte budget.
//!
//! Vectors are normalized on write and on query, so similarity is a plain
//! dot product computed during a linear scan. Every scan counts as an access
//! for all scanned records. After every write the store evicts the
//! least-recently-accessed records until the namespace fits `max_bytes`.
//!
//! When no durable backend is configured the store runs unsupported: every
//! operation succeeds as a no-op and `size()` reports `supported = false`.

use std::sync::atomic::{AtomicI64, Ordering};

use recall_config::model::StorageConfig;
use recall_core::RecallError;
use recall_storage::queries::vectors;
use recall_storage::{Database, NewVectorRow, RowStats, VectorRow};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::types::{GetOptions, NewVector, StoreSize, VectorMatch, VectorRecord, dot, normalize};

/// How a [`VectorStore`] is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStoreOptions {
    /// Namespace inside the database.
    pub storage_name: String,
    /// Byte budget, the sum of `dimension * 4` over all records.
    pub max_bytes: u64,
    /// Database file. `None` runs the store unsupported.
    pub database_path: Option<String>,
    pub wal_mode: bool,
}

impl VectorStoreOptions {
    /// Build options from the `[storage]` config section.
    pub fn from_config(config: &StorageConfig) -> Self {
        let database_path = (config.enabled && !config.database_path.trim().is_empty())
            .then(|| config.database_path.clone());
        Self {
            storage_name: config.storage_name.clone(),
            max_bytes: config.max_bytes,
            database_path,
            wal_mode: config.wal_mode,
        }
    }
}

enum Backend {
    Unsupported,
    Sqlite(Database),
}

/// Aggregate stats cached behind a write epoch.
///
/// Writers bump `epoch`; the cached value is fresh only while
/// `computed_at == Some(epoch)`.
#[derive(Debug, Default)]
struct StatsCache {
    stats: RowStats,
    epoch: u64,
    computed_at: Option<u64>,
}

impl StatsCache {
    fn is_fresh(&self) -> bool {
        self.computed_at == Some(self.epoch)
    }

    fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn set(&mut self, stats: RowStats) {
        self.stats = stats;
        self.computed_at = Some(self.epoch);
    }
}

/// Durable, size-bounded vector store.
pub struct VectorStore {
    options: VectorStoreOptions,
    preset: std::sync::Mutex<Option<Database>>,
    backend: OnceCell<Backend>,
    stats: Mutex<StatsCache>,
    last_stamp: AtomicI64,
}

impl VectorStore {
    /// Creates a store that opens `options.database_path` on first use.
    pub fn new(options: VectorStoreOptions) -> Self {
        Self {
            options,
            preset: std::sync::Mutex::new(None),
            backend: OnceCell::new(),
            stats: Mutex::new(StatsCache::default()),
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Creates a store over an already-open database.
    pub fn with_database(db: Database, options: VectorStoreOptions) -> Self {
        let store = Self::new(options);
        if let Ok(mut preset) = store.preset.lock() {
            *preset = Some(db);
        }
        store
    }

    pub fn options(&self) -> &VectorStoreOptions {
        &self.options
    }

    pub fn namespace(&self) -> &str {
        &self.options.storage_name
    }

    /// Open durable storage. Idempotent.
    ///
    /// The first successful call creates the database if absent, applies
    /// migrations, recomputes stats and runs eviction. A failed open leaves
    /// the store unopened so the caller may retry.
    pub async fn open(&self) -> Result<StoreSize, RecallError> {
        self.backend().await?;
        self.size().await
    }

    async fn backend(&self) -> Result<&Backend, RecallError> {
        self.backend.get_or_try_init(|| self.init_backend()).await
    }

    async fn init_backend(&self) -> Result<Backend, RecallError> {
        // The preset stays in place until init succeeds so a retry can reuse it.
        let preset = self.preset.lock().ok().and_then(|p| p.clone());
        let db = match (preset, &self.options.database_path) {
            (Some(db), _) => db,
            (None, Some(path)) => Database::open_with(path, self.options.wal_mode).await?,
            (None, None) => {
                info!(
                    namespace = self.namespace(),
                    "vector store disabled, running unsupported"
                );
                return Ok(Backend::Unsupported);
            }
        };

        self.prepare(&db).await?;
        if let Ok(mut preset) = self.preset.lock() {
            preset.take();
        }
        Ok(Backend::Sqlite(db))
    }

    /// Seed the access stamp, recompute stats and enforce the budget.
    async fn prepare(&self, db: &Database) -> Result<(), RecallError> {
        let namespace = self.namespace();
        if let Some(max) = vectors::max_last_access(db, namespace).await? {
            self.last_stamp.fetch_max(max, Ordering::SeqCst);
        }

        let mut cache = self.stats.lock().await;
        cache.set(vectors::stats(db, namespace).await?);
        self.evict_locked(db, &mut cache).await?;
        info!(
            namespace,
            entry_count = cache.stats.count,
            total_bytes = cache.stats.total_bytes,
            max_bytes = self.options.max_bytes,
            "vector store opened"
        );
        Ok(())
    }

    /// Next access stamp: wall-clock milliseconds, strictly increasing.
    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = match self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(prev + 1)
    }

    /// Linear similarity scan.
    ///
    /// Returns up to `top_k` matches with similarity at least
    /// `min_similarity`, best first, ties in scan order. Every scanned
    /// record has its access stamp refreshed. An empty or non-finite query
    /// yields no matches.
    pub async fn get(
        &self,
        query: &[f32],
        options: GetOptions,
    ) -> Result<Vec<VectorMatch>, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(Vec::new());
        };
        let Some(query) = normalize(query) else {
            debug!("similarity scan skipped: query vector is empty or non-finite");
            return Ok(Vec::new());
        };

        let rows = vectors::scan_and_touch(db, self.namespace(), self.next_stamp()).await?;
        let scanned = rows.len();

        let mut top: Vec<(f32, VectorRow)> = Vec::with_capacity(options.top_k.min(scanned));
        for row in rows {
            let similarity = dot(&query, &row.vector);
            if !similarity.is_finite() || similarity < options.min_similarity {
                continue;
            }
            if top.len() == options.top_k
                && top.last().is_some_and(|(worst, _)| similarity <= *worst)
            {
                continue;
            }
            let pos = top.partition_point(|(s, _)| *s >= similarity);
            top.insert(pos, (similarity, row));
            top.truncate(options.top_k);
        }

        debug!(
            namespace = self.namespace(),
            scanned,
            matched = top.len(),
            "similarity scan complete"
        );

        Ok(top
            .into_iter()
            .map(|(similarity, row)| VectorMatch {
                metadata: parse_metadata(&row),
                id: row.id,
                similarity,
            })
            .collect())
    }

    /// Write a batch of vectors in one transaction, then evict.
    ///
    /// Entries with an empty id or an unnormalizable embedding are skipped.
    /// Returns the number of records written.
    pub async fn put_many(&self, entries: Vec<NewVector>) -> Result<usize, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(0);
        };

        let total = entries.len();
        let mut rows = Vec::with_capacity(total);
        for entry in entries {
            if entry.id.is_empty() {
                continue;
            }
            let Some(vector) = normalize(&entry.embedding) else {
                continue;
            };
            let metadata = entry
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| RecallError::Internal(format!("metadata serialization failed: {e}")))?;
            rows.push(NewVectorRow {
                id: entry.id,
                vector,
                metadata,
            });
        }
        if rows.len() < total {
            debug!(skipped = total - rows.len(), "skipped invalid vector entries");
        }

        let mut cache = self.stats.lock().await;
        let written = vectors::upsert_many(db, self.namespace(), rows, self.next_stamp()).await?;
        cache.invalidate();
        self.evict_locked(db, &mut cache).await?;
        debug!(namespace = self.namespace(), written, "vectors written");
        Ok(written)
    }

    /// Current size, recomputed if a write happened since the last count.
    pub async fn size(&self) -> Result<StoreSize, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(StoreSize::default());
        };
        let mut cache = self.stats.lock().await;
        if !cache.is_fresh() {
            cache.set(vectors::stats(db, self.namespace()).await?);
        }
        Ok(StoreSize {
            entry_count: cache.stats.count,
            total_bytes: cache.stats.total_bytes,
            supported: true,
        })
    }

    /// Evict least-recently-accessed records until within budget.
    ///
    /// Idempotent. Returns the number of records evicted.
    pub async fn evict_if_needed(&self) -> Result<usize, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(0);
        };
        let mut cache = self.stats.lock().await;
        self.evict_locked(db, &mut cache).await
    }

    async fn evict_locked(&self, db: &Database, cache: &mut StatsCache) -> Result<usize, RecallError> {
        if !cache.is_fresh() {
            cache.set(vectors::stats(db, self.namespace()).await?);
        }
        if cache.stats.total_bytes <= self.options.max_bytes || cache.stats.count <= 1 {
            return Ok(0);
        }

        let outcome = vectors::evict_to_budget(db, self.namespace(), self.options.max_bytes).await?;
        cache.set(outcome.remaining);
        if !outcome.evicted.is_empty() {
            info!(
                namespace = self.namespace(),
                evicted = outcome.evicted.len(),
                remaining = outcome.remaining.count,
                total_bytes = outcome.remaining.total_bytes,
                max_bytes = self.options.max_bytes,
                "evicted least-recently-used vectors"
            );
        }
        if outcome.remaining.total_bytes > self.options.max_bytes {
            warn!(
                namespace = self.namespace(),
                total_bytes = outcome.remaining.total_bytes,
                max_bytes = self.options.max_bytes,
                "single remaining vector exceeds the byte budget"
            );
        }
        Ok(outcome.evicted.len())
    }

    /// Fetch one record by id, refreshing its access stamp.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<VectorRecord>, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(None);
        };
        let row = vectors::get_and_touch(db, self.namespace(), id, self.next_stamp()).await?;
        Ok(row.map(|row| VectorRecord {
            metadata: parse_metadata(&row),
            byte_size: row.vector.len() * 4,
            id: row.id,
            vector: row.vector,
            last_access: row.last_access,
        }))
    }

    /// Delete records by id in one transaction. Returns the number removed.
    pub async fn remove_many(&self, ids: Vec<String>) -> Result<usize, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(0);
        };
        let mut cache = self.stats.lock().await;
        let removed = vectors::delete_many(db, self.namespace(), ids).await?;
        cache.invalidate();
        Ok(removed)
    }

    /// Delete every record in the namespace. Returns the number removed.
    pub async fn clear(&self) -> Result<usize, RecallError> {
        let Backend::Sqlite(db) = self.backend().await? else {
            return Ok(0);
        };
        let mut cache = self.stats.lock().await;
        let removed = vectors::clear(db, self.namespace()).await?;
        cache.invalidate();
        info!(namespace = self.namespace(), removed, "vector store cleared");
        Ok(removed)
    }
}

fn parse_metadata(row: &VectorRow) -> Option<serde_json::Value> {
    let raw = row.metadata.as_deref()?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(id = %row.id, error = %e, "ignoring unparseable vector metadata");
            None
        }
    }
}
