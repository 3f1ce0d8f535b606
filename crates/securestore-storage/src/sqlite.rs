// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed namespaced key-value store.
//!
//! The database file is created and migrated once in [`SqliteBackend::open`].
//! Every [`KvBackend::open`] call then opens its own connection and the
//! handle closes it, mirroring the open -> operate -> close cycle of a
//! device's non-volatile storage. No connection outlives a vault operation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use securestore_core::{KvBackend, NamespaceHandle, SecureStoreError};
use tracing::{debug, warn};

use crate::migrations;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite file backend.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
}

impl SqliteBackend {
    /// Create (if needed) and migrate the database at `path`.
    ///
    /// With `wal_mode` the database is switched to WAL journaling; the mode is
    /// persistent, so later per-operation connections inherit it.
    pub fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, SecureStoreError> {
        let path = path.as_ref().to_path_buf();
        let mut conn = Connection::open(&path).map_err(|e| {
            SecureStoreError::BackendUnavailable(format!(
                "cannot open database {}: {e}",
                path.display()
            ))
        })?;

        if wal_mode {
            let mode: String = conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                .map_err(map_sql_err)?;
            debug!(journal_mode = %mode, "journal mode set");
        }

        migrations::run_migrations(&mut conn)?;
        close_connection(conn);

        debug!(path = %path.display(), "sqlite backend ready");
        Ok(Self { path })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvBackend for SqliteBackend {
    type Handle = SqliteHandle;

    fn name(&self) -> &str {
        "sqlite"
    }

    fn open(&self, namespace: &str, read_only: bool) -> Result<SqliteHandle, SecureStoreError> {
        // No SQLITE_OPEN_CREATE: a deleted database file is an unavailable
        // backend, not an empty one.
        let flags = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            SecureStoreError::BackendUnavailable(format!(
                "cannot open namespace `{namespace}` in {}: {e}",
                self.path.display()
            ))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sql_err)?;
        if !read_only {
            // Deleted and overwritten blobs are zero-filled in the file.
            conn.execute_batch("PRAGMA secure_delete = ON;")
                .map_err(map_sql_err)?;
        }

        Ok(SqliteHandle {
            conn,
            namespace: namespace.to_string(),
            read_only,
        })
    }
}

/// One open connection scoped to a namespace.
pub struct SqliteHandle {
    conn: Connection,
    namespace: String,
    read_only: bool,
}

impl SqliteHandle {
    fn check_writable(&self) -> Result<(), SecureStoreError> {
        if self.read_only {
            return Err(SecureStoreError::BackendUnavailable(format!(
                "namespace `{}` is open read-only",
                self.namespace
            )));
        }
        Ok(())
    }
}

impl NamespaceHandle for SqliteHandle {
    fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<usize, SecureStoreError> {
        self.check_writable()?;
        let changed = self
            .conn
            .execute(
                "INSERT INTO kv_entries (namespace, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value",
                params![self.namespace, key, value],
            )
            .map_err(map_sql_err)?;
        Ok(if changed == 1 { value.len() } else { 0 })
    }

    fn get_length(&self, key: &str) -> usize {
        let length = self
            .conn
            .query_row(
                "SELECT length(value) FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| row.get::<_, i64>(0),
            )
            .optional();
        match length {
            Ok(length) => length.map_or(0, |n| usize::try_from(n).unwrap_or(0)),
            Err(e) => {
                warn!(key, error = %e, "length query failed, treating record as absent");
                0
            }
        }
    }

    fn get_bytes(&self, key: &str, out: &mut [u8]) -> Result<usize, SecureStoreError> {
        // Copy straight out of SQLite's row buffer so no intermediate Vec holds the blob.
        let copied = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| {
                    let value = row.get_ref(0)?;
                    let blob = value.as_blob().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(0, value.data_type(), Box::new(e))
                    })?;
                    if blob.len() > out.len() {
                        return Ok(Err(blob.len()));
                    }
                    out[..blob.len()].copy_from_slice(blob);
                    Ok(Ok(blob.len()))
                },
            )
            .optional()
            .map_err(map_sql_err)?;

        match copied {
            None => Err(SecureStoreError::NotFound(key.to_string())),
            Some(Err(needed)) => Err(SecureStoreError::BufferTooSmall {
                needed,
                available: out.len(),
            }),
            Some(Ok(len)) => Ok(len),
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM kv_entries WHERE namespace = ?1 AND key = ?2)",
                params![self.namespace, key],
                |row| row.get::<_, bool>(0),
            )
            .unwrap_or_else(|e| {
                warn!(key, error = %e, "existence query failed, treating record as absent");
                false
            })
    }

    fn remove(&mut self, key: &str) -> Result<bool, SecureStoreError> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute(
                "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
            )
            .map_err(map_sql_err)?;
        Ok(removed > 0)
    }

    // SQLite has no soft refusal; every failure is a driver error.
    fn clear(&mut self) -> Result<bool, SecureStoreError> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute(
                "DELETE FROM kv_entries WHERE namespace = ?1",
                params![self.namespace],
            )
            .map_err(map_sql_err)?;
        debug!(namespace = %self.namespace, removed, "namespace cleared");
        Ok(true)
    }

    fn close(self) {
        close_connection(self.conn);
    }
}

fn close_connection(conn: Connection) {
    if let Err((_, e)) = conn.close() {
        warn!(error = %e, "sqlite connection did not close cleanly");
    }
}

/// Convert rusqlite errors to [`SecureStoreError::Storage`].
pub(crate) fn map_sql_err(e: rusqlite::Error) -> SecureStoreError {
    SecureStoreError::Storage {
        source: Box::new(e),
    }
}
