// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault, the backends, and the configuration layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SecureStoreError;

/// Length of the device hardware identifier (a station MAC address).
pub const HARDWARE_ID_LEN: usize = 6;

/// Namespace every record lives in unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "securestore";

/// Longest record or namespace name the non-volatile store accepts.
pub const MAX_NAME_LEN: usize = 15;

/// Six-byte device identifier, the sole input to device key derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareId(pub [u8; HARDWARE_ID_LEN]);

impl HardwareId {
    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; HARDWARE_ID_LEN] {
        &self.0
    }
}

impl From<[u8; HARDWARE_ID_LEN]> for HardwareId {
    fn from(bytes: [u8; HARDWARE_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

// The identifier feeds key derivation, so Debug shows only the vendor prefix.
impl fmt::Debug for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HardwareId({:02x}:{:02x}:{:02x}:**:**:**)",
            self.0[0], self.0[1], self.0[2]
        )
    }
}

/// Parses `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff`, or `aabbccddeeff`.
impl FromStr for HardwareId {
    type Err = SecureStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect();
        let bytes = hex::decode(&compact).map_err(|e| {
            SecureStoreError::Config(format!("hardware id `{s}` is not hex: {e}"))
        })?;
        let id: [u8; HARDWARE_ID_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            SecureStoreError::Config(format!(
                "hardware id `{s}` has {} bytes, expected {HARDWARE_ID_LEN}",
                b.len()
            ))
        })?;
        Ok(Self(id))
    }
}

/// On-disk record layout and the key derivation scheme paired with it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordFormat {
    /// Unversioned `nonce || ciphertext || tag` sealed under the rotate-XOR key.
    #[default]
    Legacy,
    /// `0x01 || nonce || ciphertext || tag` sealed under an HKDF-SHA256 key.
    V1,
}

/// Check a record or namespace name against the backend key rules.
pub fn validate_name(name: &str) -> Result<(), SecureStoreError> {
    let reason = if name.is_empty() {
        Some("name must not be empty".to_string())
    } else if name.len() > MAX_NAME_LEN {
        Some(format!(
            "name is {} bytes, limit is {MAX_NAME_LEN}",
            name.len()
        ))
    } else if name.chars().any(|c| c.is_control()) {
        Some("name must not contain control characters".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SecureStoreError::InvalidName {
            name: name.escape_debug().to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_separated_mac() {
        let id: HardwareId = "24:6F:28:aa:bb:cc".parse().unwrap();
        assert_eq!(id.0, [0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc]);
        assert_eq!(id.to_string(), "24:6f:28:aa:bb:cc");
    }

    #[test]
    fn parses_compact_and_dashed_mac() {
        let a: HardwareId = "246f28aabbcc".parse().unwrap();
        let b: HardwareId = "24-6f-28-aa-bb-cc".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_length_mac() {
        assert!("24:6f:28:aa:bb".parse::<HardwareId>().is_err());
        assert!("24:6f:28:aa:bb:cc:dd".parse::<HardwareId>().is_err());
        assert!("zz:6f:28:aa:bb:cc".parse::<HardwareId>().is_err());
    }

    #[test]
    fn debug_hides_device_specific_bytes() {
        let id = HardwareId([0x24, 0x6f, 0x28, 0xaa, 0xbb, 0xcc]);
        let debug = format!("{id:?}");
        assert!(debug.contains("24:6f:28"));
        assert!(!debug.contains("aa"));
    }

    #[test]
    fn record_format_round_trips_through_strings() {
        assert_eq!("legacy".parse::<RecordFormat>().unwrap(), RecordFormat::Legacy);
        assert_eq!("v1".parse::<RecordFormat>().unwrap(), RecordFormat::V1);
        assert_eq!(RecordFormat::V1.to_string(), "v1");
        assert_eq!(RecordFormat::default(), RecordFormat::Legacy);
    }

    #[test]
    fn record_format_serde_uses_lowercase() {
        let json = serde_json::to_string(&RecordFormat::V1).unwrap();
        assert_eq!(json, "\"v1\"");
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("wifi_ssid").is_ok());
        assert!(validate_name("123456789012345").is_ok());
        assert!(matches!(
            validate_name(""),
            Err(SecureStoreError::InvalidName { .. })
        ));
        assert!(matches!(
            validate_name("1234567890123456"),
            Err(SecureStoreError::InvalidName { .. })
        ));
        assert!(validate_name("bad\nname").is_err());
    }

    proptest::proptest! {
        #[test]
        fn display_output_always_parses_back(bytes in proptest::array::uniform6(proptest::num::u8::ANY)) {
            let id = HardwareId(bytes);
            let parsed: HardwareId = id.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed, id);
        }
    }
}
