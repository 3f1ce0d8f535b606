// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent key-value backends for the securestore credential vault.
//!
//! Both backends implement [`securestore_core::KvBackend`]: a SQLite file
//! store standing in for the device's non-volatile storage, and a
//! process-local memory store for tests and ephemeral use.

pub mod memory;
pub mod migrations;
pub mod sqlite;

pub use memory::{MemoryBackend, MemoryHandle};
pub use sqlite::{SqliteBackend, SqliteHandle};
