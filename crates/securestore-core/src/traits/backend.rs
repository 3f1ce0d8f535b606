// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespaced key-value backend trait (non-volatile storage, SQLite, memory).

use crate::error::SecureStoreError;

/// A persistent store partitioned into namespaces.
///
/// Backends hand out a fresh [`NamespaceHandle`] per `open` call. The vault
/// opens one handle per operation and closes it before returning, so
/// implementations must not rely on a handle living across calls.
pub trait KvBackend: Send + Sync {
    /// Handle type scoped to one opened namespace.
    type Handle: NamespaceHandle;

    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Opens `namespace`. Read-only handles must reject every mutation.
    fn open(&self, namespace: &str, read_only: bool) -> Result<Self::Handle, SecureStoreError>;
}

/// Operations on one opened namespace.
pub trait NamespaceHandle {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Returns the number of bytes the backend accepted.
    fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<usize, SecureStoreError>;

    /// Length of the value stored under `key`, or 0 when absent.
    fn get_length(&self, key: &str) -> usize;

    /// Copies the value under `key` into `out` and returns the bytes copied.
    fn get_bytes(&self, key: &str, out: &mut [u8]) -> Result<usize, SecureStoreError>;

    /// Whether a value is stored under `key`.
    fn has_key(&self, key: &str) -> bool;

    /// Removes `key`. Returns `false` when nothing was removed.
    fn remove(&mut self, key: &str) -> Result<bool, SecureStoreError>;

    /// Removes every key in the namespace. Returns `false` when the backend
    /// refuses the erase without raising a driver error.
    fn clear(&mut self) -> Result<bool, SecureStoreError>;

    /// Releases the handle, flushing anything the backend buffers.
    fn close(self)
    where
        Self: Sized;
}
