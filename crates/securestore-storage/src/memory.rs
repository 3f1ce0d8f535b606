// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local namespaced key-value backend.
//!
//! Clones share the same underlying map, so a test can keep one clone for
//! inspection while the vault owns another. Stored values are zeroized when
//! they are overwritten, removed, or cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use securestore_core::{KvBackend, NamespaceHandle, SecureStoreError};
use tracing::trace;
use zeroize::Zeroizing;

type Namespaces = HashMap<String, HashMap<String, Zeroizing<Vec<u8>>>>;

/// In-memory backend. Records vanish when the last clone is dropped.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    namespaces: Arc<Mutex<Namespaces>>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("namespaces", &lock(&self.namespaces).len())
            .finish()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the raw bytes stored under `key`, bypassing handles.
    pub fn raw_value(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.namespaces)
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .map(|v| v.to_vec())
    }

    /// Overwrite the raw bytes under `key`, bypassing handles.
    pub fn set_raw_value(&self, namespace: &str, key: &str, value: &[u8]) {
        lock(&self.namespaces)
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), Zeroizing::new(value.to_vec()));
    }

    /// Number of records stored in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        lock(&self.namespaces)
            .get(namespace)
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

// A panic while holding the lock cannot leave a half-written entry behind:
// every mutation is a single map operation.
fn lock(namespaces: &Mutex<Namespaces>) -> MutexGuard<'_, Namespaces> {
    namespaces.lock().unwrap_or_else(PoisonError::into_inner)
}

impl KvBackend for MemoryBackend {
    type Handle = MemoryHandle;

    fn name(&self) -> &str {
        "memory"
    }

    fn open(&self, namespace: &str, read_only: bool) -> Result<MemoryHandle, SecureStoreError> {
        trace!(namespace, read_only, "memory namespace opened");
        Ok(MemoryHandle {
            namespaces: Arc::clone(&self.namespaces),
            namespace: namespace.to_string(),
            read_only,
        })
    }
}

/// Handle to one namespace of a [`MemoryBackend`].
pub struct MemoryHandle {
    namespaces: Arc<Mutex<Namespaces>>,
    namespace: String,
    read_only: bool,
}

impl MemoryHandle {
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

impl NamespaceHandle for MemoryHandle {
    fn put_bytes(&mut self, key: &str, value: &[u8]) -> Result<usize, SecureStoreError> {
        self.check_writable()?;
        lock(&self.namespaces)
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), Zeroizing::new(value.to_vec()));
        Ok(value.len())
    }

    fn get_length(&self, key: &str) -> usize {
        lock(&self.namespaces)
            .get(&self.namespace)
            .and_then(|ns| ns.get(key))
            .map_or(0, |v| v.len())
    }

    fn get_bytes(&self, key: &str, out: &mut [u8]) -> Result<usize, SecureStoreError> {
        let namespaces = lock(&self.namespaces);
        let value = namespaces
            .get(&self.namespace)
            .and_then(|ns| ns.get(key))
            .ok_or_else(|| SecureStoreError::NotFound(key.to_string()))?;
        if value.len() > out.len() {
            return Err(SecureStoreError::BufferTooSmall {
                needed: value.len(),
                available: out.len(),
            });
        }
        out[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn has_key(&self, key: &str) -> bool {
        lock(&self.namespaces)
            .get(&self.namespace)
            .is_some_and(|ns| ns.contains_key(key))
    }

    fn remove(&mut self, key: &str) -> Result<bool, SecureStoreError> {
        self.check_writable()?;
        Ok(lock(&self.namespaces)
            .get_mut(&self.namespace)
            .and_then(|ns| ns.remove(key))
            .is_some())
    }

    fn clear(&mut self) -> Result<bool, SecureStoreError> {
        self.check_writable()?;
        lock(&self.namespaces).remove(&self.namespace);
        Ok(true)
    }

    fn close(self) {
        trace!(namespace = %self.namespace, "memory namespace closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let backend = MemoryBackend::new();
        let mut rw = backend.open("securestore", false).unwrap();
        assert_eq!(rw.put_bytes("k", b"value").unwrap(), 5);
        rw.close();

        let ro = backend.open("securestore", true).unwrap();
        assert_eq!(ro.get_length("k"), 5);
        let mut out = [0u8; 8];
        assert_eq!(ro.get_bytes("k", &mut out).unwrap(), 5);
        assert_eq!(&out[..5], b"value");
    }

    #[test]
    fn absent_key_has_zero_length() {
        let backend = MemoryBackend::new();
        let ro = backend.open("securestore", true).unwrap();
        assert_eq!(ro.get_length("missing"), 0);
        assert!(!ro.has_key("missing"));
        let mut out = [0u8; 4];
        assert!(matches!(
            ro.get_bytes("missing", &mut out),
            Err(SecureStoreError::NotFound(_))
        ));
    }

    #[test]
    fn read_only_handle_rejects_mutation() {
        let backend = MemoryBackend::new();
        let mut ro = backend.open("securestore", true).unwrap();
        assert!(matches!(
            ro.put_bytes("k", b"v"),
            Err(SecureStoreError::BackendUnavailable(_))
        ));
        assert!(ro.remove("k").is_err());
        assert!(ro.clear().is_err());
    }

    #[test]
    fn namespaces_are_isolated() {
        let backend = MemoryBackend::new();
        let mut a = backend.open("a", false).unwrap();
        a.put_bytes("k", b"from-a").unwrap();

        let b = backend.open("b", true).unwrap();
        assert!(!b.has_key("k"));
    }

    #[test]
    fn remove_reports_whether_anything_was_removed() {
        let backend = MemoryBackend::new();
        let mut rw = backend.open("securestore", false).unwrap();
        rw.put_bytes("k", b"v").unwrap();
        assert!(rw.remove("k").unwrap());
        assert!(!rw.remove("k").unwrap());
    }

    #[test]
    fn clear_empties_only_its_namespace() {
        let backend = MemoryBackend::new();
        backend.set_raw_value("a", "k1", b"1");
        backend.set_raw_value("a", "k2", b"2");
        backend.set_raw_value("b", "k1", b"3");

        let mut a = backend.open("a", false).unwrap();
        assert!(a.clear().unwrap());
        assert!(backend.is_empty("a"));
        assert_eq!(backend.len("b"), 1);
    }

    #[test]
    fn get_bytes_reports_short_buffer() {
        let backend = MemoryBackend::new();
        backend.set_raw_value("ns", "k", b"longer value");
        let ro = backend.open("ns", true).unwrap();
        let mut out = [0u8; 4];
        assert!(matches!(
            ro.get_bytes("k", &mut out),
            Err(SecureStoreError::BufferTooSmall { needed: 12, available: 4 })
        ));
    }

    #[test]
    fn clones_share_records() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        let mut rw = backend.open("ns", false).unwrap();
        rw.put_bytes("k", b"shared").unwrap();
        assert_eq!(clone.raw_value("ns", "k").as_deref(), Some(&b"shared"[..]));
    }
}
