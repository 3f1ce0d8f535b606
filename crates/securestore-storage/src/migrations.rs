// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!` and run when a [`crate::SqliteBackend`] is opened.

use securestore_core::SecureStoreError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), SecureStoreError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| SecureStoreError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
