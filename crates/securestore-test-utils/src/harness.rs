// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary SQLite databases for integration tests.

use std::path::{Path, PathBuf};

use securestore_core::SecureStoreError;
use securestore_storage::SqliteBackend;

/// A migrated SQLite backend in a temp directory, removed on drop.
pub struct TempSqlite {
    backend: SqliteBackend,
    path: PathBuf,
    // Held for its Drop.
    _dir: tempfile::TempDir,
}

impl TempSqlite {
    pub fn new() -> Result<Self, SecureStoreError> {
        let dir = tempfile::TempDir::new().map_err(|e| SecureStoreError::Storage { source: e.into() })?;
        let path = dir.path().join("securestore.db");
        let backend = SqliteBackend::open(&path, true)?;
        Ok(Self {
            backend,
            path,
            _dir: dir,
        })
    }

    /// A backend handle onto the database. Clones share the file.
    pub fn backend(&self) -> SqliteBackend {
        self.backend.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reopen the same file as a fresh backend, as after a reboot.
    pub fn reopen(&self) -> Result<SqliteBackend, SecureStoreError> {
        SqliteBackend::open(&self.path, true)
    }
}
