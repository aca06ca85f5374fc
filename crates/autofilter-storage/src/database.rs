// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Every query runs on tokio-rusqlite's single background thread, so one
//! [`Database`] is the single writer for its file.

use std::path::Path;

use autofilter_core::AutofilterError;
use tracing::debug;

use crate::migrations::run_migrations;

/// One SQLite database with migrations applied.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, AutofilterError> {
        Self::open_with(path, true).await
    }

    /// Opens the database at `path`, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AutofilterError> {
        match Path::new(path).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).map_err(|e| AutofilterError::Storage {
                    source: Box::new(e),
                })?;
            }
            _ => {}
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AutofilterError::Storage {
                source: Box::new(e),
            })?;
        let db = Self {
            conn,
            path: path.to_string(),
        };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// An in-memory database, used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, AutofilterError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| AutofilterError::Storage {
                source: Box::new(e),
            })?;
        let db = Self {
            conn,
            path: ":memory:".to_string(),
        };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), AutofilterError> {
        self.conn
            .call(move |conn| {
                if wal_mode {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.execute_batch(
                    "PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;
                     PRAGMA foreign_keys = ON;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| run_migrations(conn))
            .await
            .map_err(flatten_tr_err)
    }

    /// The underlying connection; all queries go through `call`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Flushes the WAL into the main file.
    pub async fn checkpoint(&self) -> Result<(), AutofilterError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoints and closes the connection.
    pub async fn close(self) -> Result<(), AutofilterError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `AutofilterError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AutofilterError {
    AutofilterError::Storage {
        source: Box::new(e),
    }
}

/// Unwraps an application error raised inside a `call` closure.
pub(crate) fn flatten_tr_err(e: tokio_rusqlite::Error<AutofilterError>) -> AutofilterError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => AutofilterError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Returns `true` when `e` is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.to_str().unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_enables_wal_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn migrations_create_both_tables() {
        let db = Database::open_in_memory().await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('operations', 'files') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<Result<Vec<String>, _>>()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["files".to_string(), "operations".to_string()]);
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twice.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        let applied: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM refinery_schema_history",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(applied, 1);
    }
}
