// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fault-injecting backend for exercising vault error paths.
//!
//! `FaultyBackend` wraps a [`MemoryBackend`] and can be told to refuse opens,
//! accept short writes, or report that nothing was removed or cleared. It
//! also counts opens and closes so tests can check every cycle is closed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use securestore_core::{KvBackend, NamespaceHandle, SecureStoreError};
use securestore_storage::{MemoryBackend, MemoryHandle};
use tracing::trace;

#[derive(Debug, Default)]
struct Faults {
    fail_open: AtomicBool,
    short_write: AtomicBool,
    refuse_remove: AtomicBool,
    refuse_clear: AtomicBool,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

/// A backend whose failures are switched on and off at runtime.
///
/// Clones share both the stored records and the fault switches.
#[derive(Debug, Clone, Default)]
pub struct FaultyBackend {
    inner: MemoryBackend,
    faults: Arc<Faults>,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped in-memory backend, for direct inspection of stored blobs.
    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    /// Make every `open` fail with `BackendUnavailable`.
    pub fn set_fail_open(&self, on: bool) {
        self.faults.fail_open.store(on, Ordering::SeqCst);
    }

    /// Make `put_bytes` report one byte fewer than it was given, storing nothing.
    pub fn set_short_write(&self, on: bool) {
        self.faults.short_write.store(on, Ordering::SeqCst);
    }

    /// Make `remove` report that nothing was removed.
    pub fn set_refuse_remove(&self, on: bool) {
        self.faults.refuse_remove.store(on, Ordering::SeqCst);
    }

    /// Make `clear` return `false`.
    pub fn set_refuse_clear(&self, on: bool) {
        self.faults.refuse_clear.store(on, Ordering::SeqCst);
    }

    /// Successful `open` calls so far.
    pub fn opens(&self) -> usize {
        self.faults.opens.load(Ordering::SeqCst)
    }

    /// `close` calls so far.
    pub fn closes(&self) -> usize {
        self.faults.closes.load(Ordering::SeqCst)
    }
}

impl KvBackend for FaultyBackend {
    type Handle = FaultyHandle;

    fn name(&self) -> &str {
        "faulty"
    }

    fn open(&self, namespace: &str, read_only: bool) -> Result<FaultyHandle, SecureStoreError> {
        if self.faults.fail_open.load(Ordering::SeqCst) {
            return Err(SecureStoreError::BackendUnavailable(format!(
                "injected open failure for `{namespace}`"
            )));
        }
        let inner = self.inner.open(namespace, read_only)?;
        self.faults.opens.fetch_add(1, Ordering::SeqCst);
        Ok(FaultyHandle {
            inner,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Handle returned by [`FaultyBackend::open`].
pub struct FaultyHandle {
    inner: MemoryHandle,
    faults: Arc<Faults>,
}

impl NamespaceHandle for FaultyHandle {
    fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<usize, SecureStoreError> {
        if self.faults.short_write.load(Ordering::SeqCst) {
            trace!(key, "injecting short write");
            return Ok(value.len().saturating_sub(1));
        }
        self.inner.put_bytes(key, value)
    }

    fn get_length(&self, key: &str) -> usize {
        self.inner.get_length(key)
    }

    fn get_bytes(&self, key: &str, out: &mut [u8]) -> Result<usize, SecureStoreError> {
        self.inner.get_bytes(key, out)
    }

    fn has_key(&self, key: &str) -> bool {
        self.inner.has_key(key)
    }

    fn remove(&mut self, key: &str) -> Result<bool, SecureStoreError> {
        if self.faults.refuse_remove.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.remove(key)
    }

    fn clear(&mut self) -> Result<bool, SecureStoreError> {
        if self.faults.refuse_clear.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.clear()
    }

    fn close(self) {
        self.faults.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}
