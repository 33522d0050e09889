// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! The `Database` struct IS the single writer: query modules run inside
//! `database.connection().call()`. Do NOT create additional Connection
//! instances for writes.

use std::path::Path;

use recall_core::RecallError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert tokio_rusqlite errors into `RecallError::Storage`.
pub fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> RecallError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RecallError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database backing the vector cache.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if absent) the database at `path` with WAL enabled.
    pub async fn open(path: &str) -> Result<Self, RecallError> {
        Self::open_with(path, true).await
    }

    /// Open (creating if absent) the database at `path`.
    ///
    /// Creates missing parent directories, applies connection PRAGMAs and
    /// runs embedded migrations.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, RecallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecallError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| RecallError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.configure(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database (tests and ephemeral stores).
    pub async fn open_in_memory() -> Result<Self, RecallError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RecallError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.configure(false).await?;
        Ok(db)
    }

    /// Returns the underlying single-writer connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn configure(&self, wal_mode: bool) -> Result<(), RecallError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| run_migrations(conn))
            .await
            .map_err(map_tr_err)
    }
}
