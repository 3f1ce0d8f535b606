// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./securestore.toml` > `~/.config/securestore/securestore.toml`
//! > `/etc/securestore/securestore.toml` with environment variable overrides via the
//! `SECURESTORE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SecureStoreConfig;

/// File name searched for in every layer of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "securestore.toml";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/securestore/securestore.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/securestore/securestore.toml` (system-wide)
/// 3. `~/.config/securestore/securestore.toml` (user XDG config)
/// 4. `./securestore.toml` (local directory)
/// 5. `SECURESTORE_*` environment variables
pub fn load_config() -> Result<SecureStoreConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SecureStoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SecureStoreConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SecureStoreConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SecureStoreConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SecureStoreConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("securestore").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Config sections reachable from `SECURESTORE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: [&str; 4] = ["log", "vault", "storage", "device"];

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SECURESTORE_VAULT_LEGACY_FALLBACK` must map to
/// `vault.legacy_fallback`, not `vault.legacy.fallback`. Variables outside the
/// config sections (such as `SECURESTORE_SECRET_VALUE`) are not config keys
/// and are filtered out.
fn env_provider() -> Env {
    Env::prefixed("SECURESTORE_")
        .filter(|key| section_key(key.as_str()).is_some())
        .map(|key| {
            // `key` has the prefix stripped but keeps the variable's case.
            section_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_ascii_lowercase())
                .into()
        })
}

/// Map `STORAGE_DATABASE_PATH` to `storage.database_path`.
fn section_key(key: &str) -> Option<String> {
    let lower = key.to_ascii_lowercase();
    let (section, rest) = lower.split_once('_')?;
    if rest.is_empty() || !ENV_SECTIONS.contains(&section) {
        return None;
    }
    Some(format!("{section}.{rest}"))
}
