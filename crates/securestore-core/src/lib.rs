// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the securestore credential vault.
//!
//! This crate provides the error type, the trait seams for the vault's
//! external collaborators (persistent backend, hardware identity, entropy),
//! and the common types shared across the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SecureStoreError;
pub use types::{
    validate_name, HardwareId, RecordFormat, DEFAULT_NAMESPACE, HARDWARE_ID_LEN, MAX_NAME_LEN,
};

pub use traits::{EntropySource, HardwareIdentity, KvBackend, NamespaceHandle};
