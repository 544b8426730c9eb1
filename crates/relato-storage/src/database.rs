// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use relato_core::RelatoError;

/// Handle to the single SQLite connection used for all reads and writes.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run all
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, RelatoError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(RelatoError::storage)?;
            }
        }

        let conn = Connection::open(path).await.map_err(RelatoError::storage)?;
        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(RelatoError::storage)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(RelatoError::storage)?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .map_err(RelatoError::storage)?;
            conn.pragma_update(None, "busy_timeout", 5000)
                .map_err(RelatoError::storage)?;
            crate::migrations::run_migrations(conn)
        })
        .await
        .map_err(|err| match err {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => RelatoError::Internal(other.to_string()),
        })?;

        debug!(path, "database opened, migrations applied");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), RelatoError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into the crate-wide storage error.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> RelatoError {
    RelatoError::Storage {
        source: Box::new(err),
    }
}
