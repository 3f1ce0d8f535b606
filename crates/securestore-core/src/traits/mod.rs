// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the vault's external collaborators.
//!
//! The persistent key-value backend, the hardware identity source, and the
//! entropy source are supplied by the platform; the vault only talks to them
//! through these traits.

pub mod backend;
pub mod platform;

pub use backend::{KvBackend, NamespaceHandle};
pub use platform::{EntropySource, HardwareIdentity};
