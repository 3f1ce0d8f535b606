// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform sources: device identity and randomness.

use crate::error::SecureStoreError;
use crate::types::HardwareId;

/// Supplies the device-unique hardware identifier.
pub trait HardwareIdentity: Send + Sync {
    /// Reads the identifier, or fails with `PlatformUnavailable`.
    fn hardware_id(&self) -> Result<HardwareId, SecureStoreError>;
}

/// Cryptographically suitable random bytes, used for nonces.
///
/// Implementations must fail rather than return predictable output.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecureStoreError>;
}
