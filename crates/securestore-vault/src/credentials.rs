// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The connection credential bundle read at boot by the connectivity glue.

use secrecy::{ExposeSecret, SecretString};
use securestore_core::{KvBackend, SecureStoreError};
use tracing::debug;
use zeroize::Zeroizing;

use crate::vault::SecureStore;

pub const WIFI_SSID: &str = "wifi_ssid";
pub const WIFI_PASS: &str = "wifi_pass";
pub const MQTT_SERVER: &str = "mqtt_server";
pub const MQTT_PORT: &str = "mqtt_port";
pub const MQTT_USER: &str = "mqtt_user";
pub const MQTT_PASS: &str = "mqtt_pass";

/// Record names making up the bundle, in load order.
pub const CREDENTIAL_NAMES: [&str; 6] =
    [WIFI_SSID, WIFI_PASS, MQTT_SERVER, MQTT_PORT, MQTT_USER, MQTT_PASS];

/// Per-field buffer, terminator included. Matches the firmware's fixed
/// 64-byte credential arrays, so values longer than 63 bytes do not load.
pub const FIELD_CAPACITY: usize = 64;

/// Wi-Fi and MQTT credentials. Passwords stay wrapped in [`SecretString`].
#[derive(Debug)]
pub struct ConnectionCredentials {
    pub wifi_ssid: String,
    pub wifi_pass: SecretString,
    pub mqtt_server: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: SecretString,
}

impl ConnectionCredentials {
    /// Load the full bundle. The first failing record aborts the load.
    pub fn load<B: KvBackend>(store: &SecureStore<B>) -> Result<Self, SecureStoreError> {
        let wifi_ssid = read_field(store, WIFI_SSID)?.expose_secret().to_owned();
        let wifi_pass = read_field(store, WIFI_PASS)?;
        let mqtt_server = read_field(store, MQTT_SERVER)?.expose_secret().to_owned();
        let port = store.retrieve_int(MQTT_PORT)?;
        let mqtt_port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                SecureStoreError::ParseError(format!("{MQTT_PORT} {port} is not a valid TCP port"))
            })?;
        let mqtt_user = read_field(store, MQTT_USER)?.expose_secret().to_owned();
        let mqtt_pass = read_field(store, MQTT_PASS)?;

        debug!(server = %mqtt_server, port = mqtt_port, "connection credentials loaded");
        Ok(Self {
            wifi_ssid,
            wifi_pass,
            mqtt_server,
            mqtt_port,
            mqtt_user,
            mqtt_pass,
        })
    }

    /// Names of bundle records currently absent from `store`.
    pub fn missing<B: KvBackend>(store: &SecureStore<B>) -> Vec<&'static str> {
        CREDENTIAL_NAMES
            .into_iter()
            .filter(|name| !store.exists(name))
            .collect()
    }
}

fn read_field<B: KvBackend>(
    store: &SecureStore<B>,
    name: &str,
) -> Result<SecretString, SecureStoreError> {
    let mut buf = Zeroizing::new([0u8; FIELD_CAPACITY]);
    let len = store.retrieve_secret(name, &mut buf[..])?;
    let text = std::str::from_utf8(&buf[..len])
        .map_err(|_| SecureStoreError::ParseError(format!("`{name}` is not UTF-8 text")))?;
    Ok(SecretString::from(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FixedHardwareId, SystemEntropy};
    use crate::vault::StoreOptions;
    use securestore_core::HardwareId;
    use securestore_storage::MemoryBackend;

    fn store() -> SecureStore<MemoryBackend> {
        SecureStore::new(
            MemoryBackend::new(),
            &FixedHardwareId(HardwareId([0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc])),
            SystemEntropy::new(),
            StoreOptions::default(),
        )
        .unwrap()
    }

    fn provision_all(store: &SecureStore<MemoryBackend>) {
        store.store_secret(WIFI_SSID, "homenet").unwrap();
        store.store_secret(WIFI_PASS, "correct-horse").unwrap();
        store.store_secret(MQTT_SERVER, "broker.local").unwrap();
        store.store_int(MQTT_PORT, 8883).unwrap();
        store.store_secret(MQTT_USER, "sensor-01").unwrap();
        store.store_secret(MQTT_PASS, "battery-staple").unwrap();
    }

    #[test]
    fn loads_complete_bundle() {
        let store = store();
        provision_all(&store);
        let creds = ConnectionCredentials::load(&store).unwrap();
        assert_eq!(creds.wifi_ssid, "homenet");
        assert_eq!(creds.wifi_pass.expose_secret(), "correct-horse");
        assert_eq!(creds.mqtt_server, "broker.local");
        assert_eq!(creds.mqtt_port, 8883);
        assert_eq!(creds.mqtt_user, "sensor-01");
        assert_eq!(creds.mqtt_pass.expose_secret(), "battery-staple");
        assert!(ConnectionCredentials::missing(&store).is_empty());
    }

    #[test]
    fn first_missing_record_is_reported() {
        let store = store();
        provision_all(&store);
        store.delete(MQTT_SERVER).unwrap();
        let err = ConnectionCredentials::load(&store).unwrap_err();
        assert!(matches!(err, SecureStoreError::NotFound(ref name) if name == MQTT_SERVER));
        assert_eq!(ConnectionCredentials::missing(&store), vec![MQTT_SERVER]);
    }

    #[test]
    fn port_must_fit_u16() {
        let store = store();
        provision_all(&store);
        for bad in [70000, -1, 0] {
            store.store_int(MQTT_PORT, bad).unwrap();
            assert!(matches!(
                ConnectionCredentials::load(&store),
                Err(SecureStoreError::ParseError(_))
            ));
        }
    }

    #[test]
    fn oversized_field_does_not_load() {
        let store = store();
        provision_all(&store);
        store.store_secret(WIFI_PASS, &"x".repeat(FIELD_CAPACITY)).unwrap();
        assert!(matches!(
            ConnectionCredentials::load(&store),
            Err(SecureStoreError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn debug_hides_passwords() {
        let store = store();
        provision_all(&store);
        let debug = format!("{:?}", ConnectionCredentials::load(&store).unwrap());
        assert!(debug.contains("homenet"));
        assert!(!debug.contains("correct-horse"));
        assert!(!debug.contains("battery-staple"));
    }
}
