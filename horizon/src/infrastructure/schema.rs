// /////////////////////////////////////////////////////////////////////////////
// Horizon
// Copyright (c) 2025 Horizon Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Schema bootstrap
//!
//! Creates the SQLite database file if missing and runs pending
//! migrations, the same shape as the teacher's
//! `infrastructure/repositories/schema.rs` (`create_database_if_missing` +
//! `sqlx::migrate!`), adapted to this crate's single `work_queue` table
//! (§4.5, §6 "A single embedded SQL database file (WAL-journaled)").

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Creates the database file (and its parent directory) if it does not
/// already exist, enabling WAL journaling per §6.
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    pool.close().await;
    Ok(())
}

/// Runs the crate's migrations against an already-open pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Creates the database if missing, opens a pooled connection, and
/// migrates it — the single entry point `WorkQueue::open` calls.
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_database_if_missing(database_url).await?;
    let options = SqliteConnectOptions::from_str(database_url)?.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new().max_connections(8).connect_with(options).await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}
