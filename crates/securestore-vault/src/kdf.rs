// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device key derivation from the hardware identifier.
//!
//! Two schemes exist, one per [`RecordFormat`]:
//! - `Legacy`: a rotate-XOR fold over a 64-byte expansion of the identifier.
//!   It must stay bit-exact so records written by deployed firmware still open.
//! - `V1`: HKDF-SHA256 with a fixed application salt and info string.

use ring::hkdf::{Salt, HKDF_SHA256};
use securestore_core::{HardwareId, HardwareIdentity, RecordFormat, SecureStoreError};
use zeroize::Zeroizing;

/// Length of the AES-256 device key.
pub const KEY_LEN: usize = 32;

const SEED_LEN: usize = 64;

const HKDF_SALT: &[u8] = b"securestore/hkdf-salt/v1";
const HKDF_INFO: &[u8] = b"securestore/device-key/v1";

/// A 256-bit device key. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct DeviceKey(Zeroizing<[u8; KEY_LEN]>);

impl DeviceKey {
    /// Wrap externally supplied key material (injected keys, tests).
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeviceKey([REDACTED])")
    }
}

/// Derive the key for `format` from an identifier.
pub fn derive(format: RecordFormat, id: &HardwareId) -> Result<DeviceKey, SecureStoreError> {
    match format {
        RecordFormat::Legacy => Ok(derive_legacy(id)),
        RecordFormat::V1 => derive_v1(id),
    }
}

/// Read the identifier from `identity` and derive the key for `format`.
///
/// Fails with `PlatformUnavailable` when the identifier cannot be read.
pub fn derive_from(
    identity: &dyn HardwareIdentity,
    format: RecordFormat,
) -> Result<DeviceKey, SecureStoreError> {
    let id = identity.hardware_id()?;
    derive(format, &id)
}

/// The legacy rotate-XOR derivation.
///
/// Seed bytes 0..6 are the identifier, byte `i` in 6..64 is
/// `id[i % 6] ^ (i * 17)` truncated to 8 bits. Output byte `i` folds all 64
/// seed bytes starting at offset `i`, rotating the accumulator left by one
/// after each XOR.
pub fn derive_legacy(id: &HardwareId) -> DeviceKey {
    let mac = id.as_bytes();
    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    for (i, byte) in seed.iter_mut().enumerate() {
        *byte = if i < mac.len() {
            mac[i]
        } else {
            mac[i % mac.len()] ^ (i as u8).wrapping_mul(17)
        };
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    for (i, out) in key.iter_mut().enumerate() {
        let mut h = 0u8;
        for j in 0..SEED_LEN {
            h ^= seed[(i + j) % SEED_LEN];
            h = h.rotate_left(1);
        }
        *out = h;
    }
    DeviceKey(key)
}

/// HKDF-SHA256 derivation used by the v1 record format.
pub fn derive_v1(id: &HardwareId) -> Result<DeviceKey, SecureStoreError> {
    let prk = Salt::new(HKDF_SHA256, HKDF_SALT).extract(id.as_bytes());
    let info = [HKDF_INFO];
    let okm = prk
        .expand(&info, HKDF_SHA256)
        .map_err(|_| SecureStoreError::Internal("HKDF expand rejected output length".into()))?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    okm.fill(&mut key[..])
        .map_err(|_| SecureStoreError::Internal("HKDF fill rejected output length".into()))?;
    Ok(DeviceKey(key))
}
