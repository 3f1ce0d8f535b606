// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic and failing platform sources.

use std::sync::atomic::{AtomicU64, Ordering};

use securestore_core::{EntropySource, HardwareId, HardwareIdentity, SecureStoreError};

/// Station MAC used across the test suites.
pub const DEVICE_MAC: HardwareId = HardwareId([0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc]);

/// A second device, for cross-device isolation tests.
pub const OTHER_MAC: HardwareId = HardwareId([0x24, 0x6f, 0x28, 0x11, 0x22, 0x33]);

/// Identity source that always fails, like a radio that never came up.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingIdentity;

impl HardwareIdentity for FailingIdentity {
    fn hardware_id(&self) -> Result<HardwareId, SecureStoreError> {
        Err(SecureStoreError::PlatformUnavailable(
            "injected hardware id failure".into(),
        ))
    }
}

/// Entropy source that always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingEntropy;

impl EntropySource for FailingEntropy {
    fn fill(&self, _dest: &mut [u8]) -> Result<(), SecureStoreError> {
        Err(SecureStoreError::PlatformUnavailable(
            "injected entropy failure".into(),
        ))
    }
}

/// Entropy that writes a big-endian call counter into the tail of each
/// request. Output is unique per call and reproducible across runs.
#[derive(Debug, Default)]
pub struct CountingEntropy {
    calls: AtomicU64,
}

impl CountingEntropy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `fill` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EntropySource for CountingEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecureStoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        dest.fill(0);
        let counter = n.to_be_bytes();
        let take = dest.len().min(counter.len());
        let dest_len = dest.len();
        dest[dest_len - take..].copy_from_slice(&counter[counter.len() - take..]);
        Ok(())
    }
}
