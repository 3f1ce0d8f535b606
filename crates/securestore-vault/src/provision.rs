// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk provisioning of secrets from a TOML manifest.
//!
//! A manifest lists string secrets under `[secrets]` and integer values under
//! `[integers]`:
//!
//! ```toml
//! [secrets]
//! wifi_ssid = "homenet"
//! wifi_pass = "correct-horse"
//!
//! [integers]
//! mqtt_port = 8883
//! ```
//!
//! Every entry is written to the store, optionally after clearing the
//! namespace, and each name is then checked with `exists`.

use std::collections::BTreeMap;
use std::path::Path;

use securestore_core::{validate_name, KvBackend, SecureStoreError};
use serde::Deserialize;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::vault::SecureStore;

/// Parsed provisioning manifest. String values are zeroized on drop.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProvisionManifest {
    #[serde(default)]
    secrets: BTreeMap<String, String>,
    #[serde(default)]
    integers: BTreeMap<String, i32>,
}

impl Drop for ProvisionManifest {
    fn drop(&mut self) {
        for value in self.secrets.values_mut() {
            value.zeroize();
        }
    }
}

impl std::fmt::Debug for ProvisionManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionManifest")
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .field("integers", &self.integers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProvisionManifest {
    /// Parse a manifest and check every name against the backend key rules.
    pub fn from_toml_str(content: &str) -> Result<Self, SecureStoreError> {
        let manifest: Self = toml::from_str(content)
            .map_err(|e| SecureStoreError::Config(format!("invalid provisioning manifest: {e}")))?;

        for name in manifest.names() {
            validate_name(name)?;
        }
        if let Some(name) = manifest
            .integers
            .keys()
            .find(|name| manifest.secrets.contains_key(*name))
        {
            return Err(SecureStoreError::Config(format!(
                "`{name}` appears in both [secrets] and [integers]"
            )));
        }
        Ok(manifest)
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, SecureStoreError> {
        let mut content = std::fs::read_to_string(path).map_err(|e| {
            SecureStoreError::Config(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        let manifest = Self::from_toml_str(&content);
        content.zeroize();
        manifest
    }

    /// Add a string secret.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    /// Add an integer value.
    pub fn with_integer(mut self, name: impl Into<String>, value: i32) -> Self {
        self.integers.insert(name.into(), value);
        self
    }

    /// Every name in the manifest, strings first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.secrets
            .keys()
            .chain(self.integers.keys())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.secrets.len() + self.integers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a provisioning run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Names written to the store.
    pub stored: Vec<String>,
    /// Names that `exists` did not confirm after writing.
    pub missing: Vec<String>,
    /// Whether the namespace was cleared first.
    pub cleared: bool,
}

impl ProvisionReport {
    /// True when every stored name was confirmed.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Write every manifest entry into `store`.
///
/// The first store failure aborts the run and is returned as-is; entries
/// already written stay written.
pub fn provision<B: KvBackend>(
    store: &SecureStore<B>,
    manifest: &ProvisionManifest,
    clear_first: bool,
) -> Result<ProvisionReport, SecureStoreError> {
    // Names may come from a manifest built in code rather than parsed.
    for name in manifest.names() {
        validate_name(name)?;
    }

    let mut report = ProvisionReport::default();
    if clear_first {
        store.clear_all()?;
        report.cleared = true;
    }

    for (name, value) in &manifest.secrets {
        store.store_secret(name, value)?;
        report.stored.push(name.clone());
    }
    for (name, value) in &manifest.integers {
        store.store_int(name, *value)?;
        report.stored.push(name.clone());
    }

    report.missing = report
        .stored
        .iter()
        .filter(|name| !store.exists(name))
        .cloned()
        .collect();

    if report.is_complete() {
        info!(
            stored = report.stored.len(),
            cleared = report.cleared,
            "provisioning complete"
        );
    } else {
        warn!(missing = ?report.missing, "provisioned records not found after writing");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FixedHardwareId, SystemEntropy};
    use crate::vault::StoreOptions;
    use securestore_core::HardwareId;
    use securestore_storage::MemoryBackend;
    use tempfile::tempdir;

    fn store() -> SecureStore<MemoryBackend> {
        SecureStore::new(
            MemoryBackend::new(),
            &FixedHardwareId(HardwareId([0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc])),
            SystemEntropy::new(),
            StoreOptions::default(),
        )
        .unwrap()
    }

    const MANIFEST: &str = r#"
[secrets]
wifi_ssid = "homenet"
wifi_pass = "correct-horse"
mqtt_server = "broker.local"

[integers]
mqtt_port = 8883
"#;

    #[test]
    fn provisions_every_entry() {
        let store = store();
        let manifest = ProvisionManifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.len(), 4);

        let report = provision(&store, &manifest, false).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.stored.len(), 4);
        assert_eq!(store.retrieve_int("mqtt_port").unwrap(), 8883);
        let mut buf = [0u8; 64];
        let n = store.retrieve_secret("mqtt_server", &mut buf).unwrap();
        assert_eq!(&buf[..n], b"broker.local");
    }

    #[test]
    fn clear_first_drops_stale_records() {
        let store = store();
        store.store_secret("old_token", "stale").unwrap();

        let manifest = ProvisionManifest::from_toml_str(MANIFEST).unwrap();
        let report = provision(&store, &manifest, true).unwrap();
        assert!(report.cleared);
        assert!(!store.exists("old_token"));
        assert!(store.exists("wifi_ssid"));
    }

    #[test]
    fn without_clear_other_records_survive() {
        let store = store();
        store.store_secret("old_token", "kept").unwrap();
        let manifest = ProvisionManifest::default().with_integer("mqtt_port", 1883);
        provision(&store, &manifest, false).unwrap();
        assert!(store.exists("old_token"));
    }

    #[test]
    fn rejects_unknown_sections_and_bad_names() {
        assert!(ProvisionManifest::from_toml_str("[wifi]\nssid = \"x\"\n").is_err());
        assert!(matches!(
            ProvisionManifest::from_toml_str("[secrets]\nthis_name_is_far_too_long = \"x\"\n"),
            Err(SecureStoreError::InvalidName { .. })
        ));
        assert!(ProvisionManifest::from_toml_str("[integers]\nmqtt_port = \"8883\"\n").is_err());
        assert!(ProvisionManifest::from_toml_str("[integers]\nbig = 3000000000\n").is_err());
    }

    #[test]
    fn rejects_name_in_both_tables() {
        let content = "[secrets]\nmqtt_port = \"8883\"\n[integers]\nmqtt_port = 8883\n";
        assert!(matches!(
            ProvisionManifest::from_toml_str(content),
            Err(SecureStoreError::Config(_))
        ));
    }

    #[test]
    fn code_built_manifest_names_are_validated() {
        let store = store();
        let manifest = ProvisionManifest::default().with_secret("", "x");
        assert!(matches!(
            provision(&store, &manifest, true),
            Err(SecureStoreError::InvalidName { .. })
        ));
        // Validation happens before the clear.
        assert!(store.backend().is_empty(store.namespace()));
    }

    #[test]
    fn loads_manifest_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("device.toml");
        std::fs::write(&path, MANIFEST).unwrap();
        let manifest = ProvisionManifest::load(&path).unwrap();
        assert_eq!(
            manifest.names().collect::<Vec<_>>(),
            ["mqtt_server", "wifi_pass", "wifi_ssid", "mqtt_port"]
        );
    }

    #[test]
    fn debug_lists_names_only() {
        let manifest = ProvisionManifest::from_toml_str(MANIFEST).unwrap();
        let debug = format!("{manifest:?}");
        assert!(debug.contains("wifi_pass"));
        assert!(!debug.contains("correct-horse"));
    }
}
