// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector cache operations.
//!
//! Every function runs as a single call on the writer connection, and every
//! mutating function runs inside one SQLite transaction.

use recall_core::RecallError;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::{EvictionOutcome, NewVectorRow, RowStats, VectorRow, blob_to_vec, vec_to_blob};

const SELECT_COLUMNS: &str = "id, vector, dimension, metadata, last_access, byte_size";

fn row_to_vector(row: &Row<'_>) -> Result<VectorRow, rusqlite::Error> {
    let blob: Vec<u8> = row.get(1)?;
    let dimension: i64 = row.get(2)?;
    let vector = blob_to_vec(&blob)
        .filter(|v| v.len() as i64 == dimension)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Blob,
                format!("vector blob of {} bytes does not match dimension {dimension}", blob.len())
                    .into(),
            )
        })?;
    Ok(VectorRow {
        id: row.get(0)?,
        dimension: vector.len(),
        vector,
        metadata: row.get(3)?,
        last_access: row.get(4)?,
        byte_size: row.get(5)?,
    })
}

fn stats_in(conn: &rusqlite::Connection, namespace: &str) -> Result<RowStats, rusqlite::Error> {
    conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(byte_size), 0) FROM vector_cache WHERE namespace = ?1",
        params![namespace],
        |row| {
            let count: i64 = row.get(0)?;
            let total: i64 = row.get(1)?;
            Ok(RowStats {
                count: count.max(0) as u64,
                total_bytes: total.max(0) as u64,
            })
        },
    )
}

/// Insert or replace a batch of vectors, all stamped with `stamp`.
///
/// All-or-nothing: a failing row rolls back the whole batch.
pub async fn upsert_many(
    db: &Database,
    namespace: &str,
    rows: Vec<NewVectorRow>,
    stamp: i64,
) -> Result<usize, RecallError> {
    if rows.is_empty() {
        return Ok(0);
    }
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO vector_cache (namespace, id, vector, dimension, metadata, last_access, byte_size)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (namespace, id) DO UPDATE SET
                        vector = excluded.vector,
                        dimension = excluded.dimension,
                        metadata = excluded.metadata,
                        last_access = excluded.last_access,
                        byte_size = excluded.byte_size",
                )?;
                for row in &rows {
                    let blob = vec_to_blob(&row.vector);
                    stmt.execute(params![
                        namespace,
                        row.id,
                        blob,
                        row.vector.len() as i64,
                        row.metadata,
                        stamp,
                        blob.len() as i64,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
        .map_err(map_tr_err)
}

/// Read every vector in insertion order and stamp all of them with `stamp`.
pub async fn scan_and_touch(
    db: &Database,
    namespace: &str,
    stamp: i64,
) -> Result<Vec<VectorRow>, RecallError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<VectorRow>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let rows = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM vector_cache WHERE namespace = ?1 ORDER BY rowid ASC"
                ))?;
                stmt.query_map(params![namespace], row_to_vector)?
                    .collect::<Result<Vec<_>, _>>()?
            };
            tx.execute(
                "UPDATE vector_cache SET last_access = ?2 WHERE namespace = ?1",
                params![namespace, stamp],
            )?;
            tx.commit()?;
            Ok(rows
                .into_iter()
                .map(|mut row| {
                    row.last_access = stamp;
                    row
                })
                .collect())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one vector by id, stamping it with `stamp` when present.
pub async fn get_and_touch(
    db: &Database,
    namespace: &str,
    id: &str,
    stamp: i64,
) -> Result<Option<VectorRow>, RecallError> {
    let namespace = namespace.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<VectorRow>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let row = tx
                .query_row(
                    &format!(
                        "SELECT {SELECT_COLUMNS} FROM vector_cache WHERE namespace = ?1 AND id = ?2"
                    ),
                    params![namespace, id],
                    row_to_vector,
                )
                .optional()?;
            if row.is_some() {
                tx.execute(
                    "UPDATE vector_cache SET last_access = ?3 WHERE namespace = ?1 AND id = ?2",
                    params![namespace, id, stamp],
                )?;
            }
            tx.commit()?;
            Ok(row.map(|mut r| {
                r.last_access = stamp;
                r
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Count rows and sum their byte sizes.
pub async fn stats(db: &Database, namespace: &str) -> Result<RowStats, RecallError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| stats_in(conn, &namespace))
        .await
        .map_err(map_tr_err)
}

/// Largest `last_access` stamp in the namespace, if any rows exist.
pub async fn max_last_access(db: &Database, namespace: &str) -> Result<Option<i64>, RecallError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            conn.query_row(
                "SELECT MAX(last_access) FROM vector_cache WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Delete least-recently-accessed rows until the namespace fits `max_bytes`.
///
/// Rows go in ascending `(last_access, rowid)` order. The last remaining
/// row is never deleted, even if it alone exceeds the budget.
pub async fn evict_to_budget(
    db: &Database,
    namespace: &str,
    max_bytes: u64,
) -> Result<EvictionOutcome, RecallError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<EvictionOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut remaining = stats_in(&tx, &namespace)?;
            let mut evicted = Vec::new();

            if remaining.total_bytes > max_bytes && remaining.count > 1 {
                let candidates = {
                    let mut stmt = tx.prepare(
                        "SELECT id, byte_size FROM vector_cache WHERE namespace = ?1
                         ORDER BY last_access ASC, rowid ASC",
                    )?;
                    stmt.query_map(params![namespace], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?
                };

                let mut delete =
                    tx.prepare("DELETE FROM vector_cache WHERE namespace = ?1 AND id = ?2")?;
                // Tracked totals are decremented per deleted row.
                for (id, byte_size) in candidates {
                    if remaining.total_bytes <= max_bytes || remaining.count <= 1 {
                        break;
                    }
                    delete.execute(params![namespace, id])?;
                    remaining.count -= 1;
                    remaining.total_bytes =
                        remaining.total_bytes.saturating_sub(byte_size.max(0) as u64);
                    evicted.push(id);
                }
                drop(delete);
            }

            tx.commit()?;
            Ok(EvictionOutcome { evicted, remaining })
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the given ids in one transaction. Returns the number removed.
pub async fn delete_many(
    db: &Database,
    namespace: &str,
    ids: Vec<String>,
) -> Result<usize, RecallError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut removed = 0;
            {
                let mut stmt =
                    tx.prepare("DELETE FROM vector_cache WHERE namespace = ?1 AND id = ?2")?;
                for id in &ids {
                    removed += stmt.execute(params![namespace, id])?;
                }
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every row of the namespace. Returns the number removed.
pub async fn clear(db: &Database, namespace: &str) -> Result<usize, RecallError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM vector_cache WHERE namespace = ?1",
                params![namespace],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "test";

    fn row(id: &str, dims: usize) -> NewVectorRow {
        NewVectorRow {
            id: id.to_string(),
            vector: vec![0.5; dims],
            metadata: None,
        }
    }

    async fn ids_in_scan_order(db: &Database) -> Vec<String> {
        scan_and_touch(db, NS, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    #[tokio::test]
    async fn upsert_and_scan() {
        let db = Database::open_in_memory().await.unwrap();
        let written = upsert_many(
            &db,
            NS,
            vec![
                NewVectorRow {
                    id: "a".into(),
                    vector: vec![1.0, 0.0],
                    metadata: Some(r#"{"turn":1}"#.into()),
                },
                row("b", 3),
            ],
            10,
        )
        .await
        .unwrap();
        assert_eq!(written, 2);

        let rows = scan_and_touch(&db, NS, 20).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!(rows[0].vector, vec![1.0, 0.0]);
        assert_eq!(rows[0].dimension, 2);
        assert_eq!(rows[0].byte_size, 8);
        assert_eq!(rows[0].metadata.as_deref(), Some(r#"{"turn":1}"#));
        assert_eq!(rows[1].byte_size, 12);
        assert!(rows.iter().all(|r| r.last_access == 20));
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("a", 4)], 1).await.unwrap();
        upsert_many(&db, NS, vec![row("a", 2)], 2).await.unwrap();

        let s = stats(&db, NS).await.unwrap();
        assert_eq!(s, RowStats { count: 1, total_bytes: 8 });
    }

    #[tokio::test]
    async fn scan_touches_every_row() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("a", 1), row("b", 1)], 5).await.unwrap();
        scan_and_touch(&db, NS, 99).await.unwrap();
        assert_eq!(max_last_access(&db, NS).await.unwrap(), Some(99));

        let a = get_and_touch(&db, NS, "a", 100).await.unwrap().unwrap();
        assert_eq!(a.last_access, 100);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_and_touch(&db, NS, "nope", 1).await.unwrap().is_none());
        assert_eq!(max_last_access(&db, NS).await.unwrap(), None);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, "one", vec![row("a", 2)], 1).await.unwrap();
        upsert_many(&db, "two", vec![row("a", 4), row("b", 4)], 1).await.unwrap();

        assert_eq!(stats(&db, "one").await.unwrap().count, 1);
        assert_eq!(stats(&db, "two").await.unwrap().total_bytes, 32);
        assert_eq!(clear(&db, "two").await.unwrap(), 2);
        assert_eq!(stats(&db, "one").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn eviction_removes_oldest_first() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("t1", 128)], 1).await.unwrap();
        upsert_many(&db, NS, vec![row("t2", 128)], 2).await.unwrap();
        upsert_many(&db, NS, vec![row("t3", 128)], 3).await.unwrap();

        let outcome = evict_to_budget(&db, NS, 1024).await.unwrap();
        assert_eq!(outcome.evicted, vec!["t1".to_string()]);
        assert_eq!(outcome.remaining, RowStats { count: 2, total_bytes: 1024 });
        assert_eq!(ids_in_scan_order(&db).await, vec!["t2", "t3"]);
    }

    #[tokio::test]
    async fn eviction_ties_break_by_insertion_order() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("x", 4), row("y", 4), row("z", 4)], 7)
            .await
            .unwrap();
        let outcome = evict_to_budget(&db, NS, 16).await.unwrap();
        assert_eq!(outcome.evicted, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn eviction_keeps_single_oversized_row() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("small", 2)], 1).await.unwrap();
        upsert_many(&db, NS, vec![row("huge", 64)], 2).await.unwrap();

        let outcome = evict_to_budget(&db, NS, 16).await.unwrap();
        assert_eq!(outcome.evicted, vec!["small".to_string()]);
        assert_eq!(outcome.remaining, RowStats { count: 1, total_bytes: 256 });

        let again = evict_to_budget(&db, NS, 16).await.unwrap();
        assert!(again.evicted.is_empty());
        assert_eq!(again.remaining.count, 1);
    }

    #[tokio::test]
    async fn delete_many_counts_only_existing() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_many(&db, NS, vec![row("a", 1), row("b", 1)], 1).await.unwrap();
        let removed = delete_many(&db, NS, vec!["a".into(), "ghost".into()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ids_in_scan_order(&db).await, vec!["b"]);
    }

    #[tokio::test]
    async fn corrupt_blob_surfaces_storage_error() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO vector_cache (namespace, id, vector, dimension, metadata, last_access, byte_size)
                     VALUES ('test', 'bad', x'000000', 1, NULL, 0, 3)",
                    [],
                )
            })
            .await
            .unwrap();

        let err = scan_and_touch(&db, NS, 1).await.unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }), "got {err:?}");
    }
}
