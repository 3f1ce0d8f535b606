// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM credential vault keyed from the device hardware identifier.
//!
//! Secrets are sealed under a device key derived once from the station MAC
//! address and stored as `nonce || ciphertext || tag` blobs in a namespaced
//! key-value backend. A versioned format with an HKDF-derived key is
//! available for new deployments, with fallback reads and in-place upgrade
//! for records written in the legacy format.

pub mod codec;
pub mod credentials;
pub mod crypto;
pub mod kdf;
pub mod platform;
pub mod prompt;
pub mod provision;
pub mod vault;

pub use credentials::ConnectionCredentials;
pub use kdf::DeviceKey;
pub use platform::{identity_from_config, FixedHardwareId, SysfsMacAddress, SystemEntropy};
pub use prompt::read_secret_value;
pub use provision::{provision, ProvisionManifest, ProvisionReport};
pub use vault::{mask_secret, SecureStore, StoreOptions};
