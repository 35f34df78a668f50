// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Persistent work queue
//!
//! An on-disk, crash-safe FIFO per asset kind (§4.5), backing the
//! pipeline input when configured and letting discovery resume where it
//! left off after a restart. Backed by `sqlx`/SQLite exactly as the
//! teacher's repository layer is, using runtime-checked queries (not the
//! compile-time `sqlx::query!` macros, which need a live database at
//! build time) against the `work_queue` table of
//! `migrations/0001_work_queue.sql`.

use super::schema::initialize_database;
use chrono::{DateTime, Utc};
use horizon_domain::{AssetKind, EngineError};
use sqlx::{Row, SqlitePool};

fn asset_kind_to_str(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Fqdn => "fqdn",
        AssetKind::IpAddress => "ip_address",
        AssetKind::Netblock => "netblock",
        AssetKind::Asn => "asn",
        AssetKind::Url => "url",
        AssetKind::ContactRecord => "contact_record",
        AssetKind::RegistrationRecord => "registration_record",
        AssetKind::TlsCertificate => "tls_certificate",
    }
}

/// A row read back from the queue (§3 "Persistent queue element").
#[derive(Debug, Clone, PartialEq)]
pub struct WorkQueueElement {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub asset_kind: AssetKind,
    pub entity_id: String,
    pub processed: bool,
}

/// The on-disk FIFO of §4.5.
pub struct WorkQueue {
    pool: SqlitePool,
}

impl WorkQueue {
    /// Opens (creating and migrating if necessary) the SQLite database at
    /// `database_url`, e.g. `sqlite://<dir>/work_queue.db`.
    pub async fn open(database_url: &str) -> Result<Self, EngineError> {
        let pool = initialize_database(database_url)
            .await
            .map_err(|e| EngineError::QueueIoError(e.to_string()))?;
        Ok(Self { pool })
    }

    /// `Append(type, entity_id)` (§4.5): the unique index on `entity_id`
    /// makes a re-append of the same id a no-op rather than a duplicate
    /// row (§8 "Idempotent persistent insert").
    pub async fn append(&self, kind: AssetKind, entity_id: &str) -> Result<(), EngineError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO work_queue (created_at, asset_kind, entity_id, processed) \
             VALUES (?, ?, ?, 0) ON CONFLICT(entity_id) DO NOTHING",
        )
        .bind(now)
        .bind(asset_kind_to_str(kind))
        .bind(entity_id)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::QueueIoError(e.to_string()))?;
        Ok(())
    }

    pub async fn has(&self, entity_id: &str) -> Result<bool, EngineError> {
        let row = sqlx::query("SELECT 1 FROM work_queue WHERE entity_id = ?")
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::QueueIoError(e.to_string()))?;
        Ok(row.is_some())
    }

    /// `Next(type, n)` (§4.5): the `n` oldest unprocessed entries of
    /// `kind`, in `created_at` ascending order (§3 "Persistent queue FIFO
    /// per type"). Ties in `created_at` (same-millisecond appends) break
    /// on the autoincrementing `id`, so FIFO order is fully determined
    /// even when the clock doesn't distinguish two inserts.
    pub async fn next(&self, kind: AssetKind, n: i64) -> Result<Vec<WorkQueueElement>, EngineError> {
        let rows = sqlx::query(
            "SELECT id, created_at, asset_kind, entity_id, processed FROM work_queue \
             WHERE asset_kind = ? AND processed = 0 ORDER BY created_at ASC, id ASC LIMIT ?",
        )
        .bind(asset_kind_to_str(kind))
        .bind(n)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::QueueIoError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let created_at_raw: String = row.try_get("created_at").map_err(to_queue_err)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
                    .map_err(|e| EngineError::QueueIoError(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(WorkQueueElement {
                    id: row.try_get("id").map_err(to_queue_err)?,
                    created_at,
                    asset_kind: kind,
                    entity_id: row.try_get("entity_id").map_err(to_queue_err)?,
                    processed: row.try_get::<i64, _>("processed").map_err(to_queue_err)? != 0,
                })
            })
            .collect()
    }

    pub async fn processed(&self, entity_id: &str) -> Result<(), EngineError> {
        sqlx::query("UPDATE work_queue SET processed = 1 WHERE entity_id = ?")
            .bind(entity_id)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::QueueIoError(e.to_string()))?;
        Ok(())
    }

    pub async fn delete(&self, entity_id: &str) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM work_queue WHERE entity_id = ?")
            .bind(entity_id)
            .execute(&self.pool)
            .await
            .map_err(|e| EngineError::QueueIoError(e.to_string()))?;
        Ok(())
    }
}

fn to_queue_err(e: sqlx::Error) -> EngineError {
    EngineError::QueueIoError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_queue() -> (WorkQueue, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work_queue.db");
        let url = format!("sqlite://{}", path.display());
        let queue = WorkQueue::open(&url).await.unwrap();
        (queue, dir)
    }

    #[tokio::test]
    async fn append_then_has_is_true() {
        let (queue, _dir) = test_queue().await;
        queue.append(AssetKind::Fqdn, "example.com").await.unwrap();
        assert!(queue.has("example.com").await.unwrap());
        assert!(!queue.has("missing.example.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_append_does_not_create_a_second_row() {
        let (queue, _dir) = test_queue().await;
        queue.append(AssetKind::Fqdn, "example.com").await.unwrap();
        queue.append(AssetKind::Fqdn, "example.com").await.unwrap();
        let next = queue.next(AssetKind::Fqdn, 10).await.unwrap();
        assert_eq!(next.len(), 1);
    }

    #[tokio::test]
    async fn next_respects_fifo_order_and_skips_processed() {
        let (queue, _dir) = test_queue().await;
        queue.append(AssetKind::Fqdn, "a.example.com").await.unwrap();
        queue.append(AssetKind::Fqdn, "b.example.com").await.unwrap();
        queue.append(AssetKind::Fqdn, "c.example.com").await.unwrap();
        queue.processed("a.example.com").await.unwrap();

        let next = queue.next(AssetKind::Fqdn, 10).await.unwrap();
        let ids: Vec<_> = next.iter().map(|e| e.entity_id.clone()).collect();
        assert_eq!(ids, vec!["b.example.com".to_string(), "c.example.com".to_string()]);
    }

    #[tokio::test]
    async fn same_timestamp_entries_break_ties_on_insertion_order() {
        let (queue, _dir) = test_queue().await;
        // Insert rows sharing one `created_at` directly, bypassing
        // `append`'s `Utc::now()` call, to force the tie `next` must
        // still resolve deterministically via the `id` column.
        let shared = Utc::now().to_rfc3339();
        for entity_id in ["a.example.com", "b.example.com", "c.example.com"] {
            sqlx::query("INSERT INTO work_queue (created_at, asset_kind, entity_id, processed) VALUES (?, 'fqdn', ?, 0)")
                .bind(&shared)
                .bind(entity_id)
                .execute(&queue.pool)
                .await
                .unwrap();
        }

        let next = queue.next(AssetKind::Fqdn, 10).await.unwrap();
        let ids: Vec<_> = next.iter().map(|e| e.entity_id.clone()).collect();
        assert_eq!(
            ids,
            vec!["a.example.com".to_string(), "b.example.com".to_string(), "c.example.com".to_string()],
            "same-timestamp rows must still come back in insertion (id) order"
        );
    }

    #[tokio::test]
    async fn delete_removes_the_row_entirely() {
        let (queue, _dir) = test_queue().await;
        queue.append(AssetKind::Fqdn, "example.com").await.unwrap();
        queue.delete("example.com").await.unwrap();
        assert!(!queue.has("example.com").await.unwrap());
    }

    #[tokio::test]
    async fn queue_survives_reopening_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("work_queue.db");
        let url = format!("sqlite://{}", path.display());
        {
            let queue = WorkQueue::open(&url).await.unwrap();
            queue.append(AssetKind::Asn, "as64512").await.unwrap();
        }
        let reopened = WorkQueue::open(&url).await.unwrap();
        assert!(reopened.has("as64512").await.unwrap());
    }
}
