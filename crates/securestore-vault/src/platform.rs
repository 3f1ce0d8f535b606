// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hardware identity and entropy sources for host builds.

use std::path::PathBuf;

use ring::rand::{SecureRandom, SystemRandom};
use securestore_config::model::DeviceConfig;
use securestore_core::{EntropySource, HardwareId, HardwareIdentity, SecureStoreError};
use tracing::debug;

/// An identifier supplied up front (config override, host tooling, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedHardwareId(pub HardwareId);

impl HardwareIdentity for FixedHardwareId {
    fn hardware_id(&self) -> Result<HardwareId, SecureStoreError> {
        Ok(self.0)
    }
}

/// Reads the station MAC of a network interface from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsMacAddress {
    interface: String,
    net_root: PathBuf,
}

impl SysfsMacAddress {
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_root(interface, "/sys/class/net")
    }

    /// Read `<net_root>/<interface>/address` instead of the live sysfs tree.
    pub fn with_root(interface: impl Into<String>, net_root: impl Into<PathBuf>) -> Self {
        Self {
            interface: interface.into(),
            net_root: net_root.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl HardwareIdentity for SysfsMacAddress {
    fn hardware_id(&self) -> Result<HardwareId, SecureStoreError> {
        let path = self.net_root.join(&self.interface).join("address");
        let text = std::fs::read_to_string(&path).map_err(|e| {
            SecureStoreError::PlatformUnavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        let id: HardwareId = text.trim().parse().map_err(|e| {
            SecureStoreError::PlatformUnavailable(format!(
                "{} holds no usable MAC address: {e}",
                path.display()
            ))
        })?;
        if id.0 == [0u8; 6] {
            return Err(SecureStoreError::PlatformUnavailable(format!(
                "interface `{}` reports an all-zero MAC address",
                self.interface
            )));
        }
        debug!(interface = %self.interface, hardware_id = ?id, "hardware identifier read");
        Ok(id)
    }
}

/// Pick the identity source described by `[device]`: the configured
/// override when present, otherwise the interface MAC.
pub fn identity_from_config(
    config: &DeviceConfig,
) -> Result<Box<dyn HardwareIdentity>, SecureStoreError> {
    match &config.hardware_id {
        Some(text) => Ok(Box::new(FixedHardwareId(text.parse()?))),
        None => Ok(Box::new(SysfsMacAddress::new(config.interface.clone()))),
    }
}

/// The operating system CSPRNG.
#[derive(Debug)]
pub struct SystemEntropy(SystemRandom);

impl SystemEntropy {
    pub fn new() -> Self {
        Self(SystemRandom::new())
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SecureStoreError> {
        self.0
            .fill(dest)
            .map_err(|_| SecureStoreError::PlatformUnavailable("system random source failed".into()))
    }
}
