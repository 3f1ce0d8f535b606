// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the securestore vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use securestore_core::{RecordFormat, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};

/// Top-level securestore configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecureStoreConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Vault record format and namespace settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Persistent backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Hardware identity settings.
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Credential vault configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Backend namespace holding every record (max 15 bytes).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Format used for new records: `legacy` (unversioned, rotate-XOR key)
    /// or `v1` (version byte, HKDF-SHA256 key).
    #[serde(default)]
    pub format: RecordFormat,

    /// In `v1` mode, also accept records written in the legacy format.
    #[serde(default = "default_true")]
    pub legacy_fallback: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            format: RecordFormat::default(),
            legacy_fallback: true,
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_true() -> bool {
    true
}

/// Which persistent backend holds the vault records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database file.
    #[default]
    Sqlite,
    /// Process-local map; records vanish on exit.
    Memory,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend implementation.
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode for the SQLite database.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "securestore.db".to_string()
}

/// Hardware identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Fixed identifier (`aa:bb:cc:dd:ee:ff`). When unset the MAC address of
    /// `interface` is read from sysfs.
    #[serde(default)]
    pub hardware_id: Option<String>,

    /// Network interface whose MAC address identifies the device.
    #[serde(default = "default_interface")]
    pub interface: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hardware_id: None,
            interface: default_interface(),
        }
    }
}

fn default_interface() -> String {
    "wlan0".to_string()
}
