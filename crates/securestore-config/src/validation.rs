// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: namespace length,
//! hardware identifier syntax, non-empty paths, known log levels.

use securestore_core::{validate_name, HardwareId, RecordFormat};

use crate::diagnostic::ConfigError;
use crate::model::{BackendKind, SecureStoreConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &SecureStoreConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` must be one of: {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if let Err(e) = validate_name(&config.vault.namespace) {
        errors.push(ConfigError::Validation {
            message: format!("vault.namespace: {e}"),
        });
    }

    if config.vault.format == RecordFormat::Legacy && !config.vault.legacy_fallback {
        errors.push(ConfigError::Validation {
            message: "vault.legacy_fallback = false requires vault.format = \"v1\"".to_string(),
        });
    }

    if config.storage.backend == BackendKind::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if let Some(id) = &config.device.hardware_id {
        if let Err(e) = id.parse::<HardwareId>() {
            errors.push(ConfigError::Validation {
                message: format!("device.hardware_id: {e}"),
            });
        }
    }

    if config.device.hardware_id.is_none() && config.device.interface.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "device.interface must not be empty when device.hardware_id is unset"
                .to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
