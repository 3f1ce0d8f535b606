// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for securestore integration tests.
//!
//! Provides fault-injecting backends, deterministic platform sources, and a
//! temporary SQLite harness for fast, CI-runnable tests without hardware.
//!
//! # Components
//!
//! - [`FaultyBackend`] - Backend with switchable open/write/remove/clear failures
//! - [`CountingEntropy`], [`FailingEntropy`], [`FailingIdentity`] - Platform sources
//! - [`TempSqlite`] - Migrated SQLite database in a temp directory

pub mod faulty_backend;
pub mod harness;
pub mod mock_platform;

pub use faulty_backend::{FaultyBackend, FaultyHandle};
pub use harness::TempSqlite;
pub use mock_platform::{
    CountingEntropy, FailingEntropy, FailingIdentity, DEVICE_MAC, OTHER_MAC,
};
