// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end properties of the secure store over real and faulty backends.

use std::sync::Arc;
use std::thread;

use secrecy::ExposeSecret;
use securestore_core::{RecordFormat, SecureStoreError, DEFAULT_NAMESPACE};
use securestore_storage::MemoryBackend;
use securestore_test_utils::{
    CountingEntropy, FailingEntropy, FailingIdentity, FaultyBackend, TempSqlite, DEVICE_MAC,
    OTHER_MAC,
};
use securestore_vault::{FixedHardwareId, SecureStore, StoreOptions, SystemEntropy};

fn memory_store(backend: MemoryBackend, format: RecordFormat) -> SecureStore<MemoryBackend> {
    SecureStore::new(
        backend,
        &FixedHardwareId(DEVICE_MAC),
        SystemEntropy::new(),
        StoreOptions {
            format,
            ..StoreOptions::default()
        },
    )
    .unwrap()
}

fn faulty_store(backend: FaultyBackend) -> SecureStore<FaultyBackend> {
    SecureStore::new(
        backend,
        &FixedHardwareId(DEVICE_MAC),
        SystemEntropy::new(),
        StoreOptions::default(),
    )
    .unwrap()
}

#[test]
fn legacy_blob_is_bit_exact_for_known_nonce() {
    let backend = MemoryBackend::new();
    let store = SecureStore::new(
        backend.clone(),
        &FixedHardwareId(DEVICE_MAC),
        CountingEntropy::new(),
        StoreOptions::default(),
    )
    .unwrap();

    // The first counting nonce is all zeros.
    store.store_secret("wifi_ssid", "homenet").unwrap();
    let blob = backend.raw_value(DEFAULT_NAMESPACE, "wifi_ssid").unwrap();
    assert_eq!(
        hex::encode(blob),
        "000000000000000000000000e8b843c2779f8ca53795ee342c38f6e7c5ab137637245b"
    );
}

#[test]
fn every_single_bit_flip_is_detected() {
    for format in [RecordFormat::Legacy, RecordFormat::V1] {
        let backend = MemoryBackend::new();
        let store = memory_store(backend.clone(), format);
        store.store_secret("wifi_pass", "correct-horse").unwrap();
        let original = backend.raw_value(DEFAULT_NAMESPACE, "wifi_pass").unwrap();

        for bit in 0..original.len() * 8 {
            let mut tampered = original.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            backend.set_raw_value(DEFAULT_NAMESPACE, "wifi_pass", &tampered);

            // A roomy buffer and one sized exactly for plaintext plus terminator.
            for capacity in [64, "correct-horse".len() + 1] {
                let mut out = vec![0u8; capacity];
                let result = store.retrieve_secret("wifi_pass", &mut out);
                assert!(
                    matches!(result, Err(SecureStoreError::AuthenticationFailure)),
                    "{format} bit {bit} flip into {capacity} bytes gave {result:?}"
                );
                assert!(out.iter().all(|b| *b == 0), "plaintext leaked on failed read");
            }
        }
    }
}

#[test]
fn tampered_integers_fail_authentication() {
    for format in [RecordFormat::Legacy, RecordFormat::V1] {
        let backend = MemoryBackend::new();
        let store = memory_store(backend.clone(), format);
        // Eleven characters fill the integer staging buffer exactly.
        store.store_int("offset", i32::MIN).unwrap();
        let original = backend.raw_value(DEFAULT_NAMESPACE, "offset").unwrap();

        for byte in 0..original.len() {
            let mut tampered = original.clone();
            tampered[byte] ^= 0x01;
            backend.set_raw_value(DEFAULT_NAMESPACE, "offset", &tampered);

            let result = store.retrieve_int("offset");
            assert!(
                matches!(result, Err(SecureStoreError::AuthenticationFailure)),
                "{format} byte {byte} flip gave {result:?}"
            );
        }
    }
}

#[test]
fn records_are_bound_to_the_device() {
    let backend = MemoryBackend::new();
    memory_store(backend.clone(), RecordFormat::Legacy)
        .store_secret("mqtt_pass", "hunter22")
        .unwrap();

    let other = SecureStore::new(
        backend,
        &FixedHardwareId(OTHER_MAC),
        SystemEntropy::new(),
        StoreOptions::default(),
    )
    .unwrap();
    assert!(matches!(
        other.retrieve_string("mqtt_pass"),
        Err(SecureStoreError::AuthenticationFailure)
    ));
}

#[test]
fn unreadable_identity_prevents_construction() {
    let result = SecureStore::new(
        MemoryBackend::new(),
        &FailingIdentity,
        SystemEntropy::new(),
        StoreOptions::default(),
    );
    assert!(matches!(
        result,
        Err(SecureStoreError::PlatformUnavailable(_))
    ));
}

#[test]
fn entropy_failure_is_encryption_failure_and_writes_nothing() {
    let backend = MemoryBackend::new();
    let store = SecureStore::new(
        backend.clone(),
        &FixedHardwareId(DEVICE_MAC),
        FailingEntropy,
        StoreOptions::default(),
    )
    .unwrap();

    let err = store.store_secret("wifi_pass", "x").unwrap_err();
    match err {
        SecureStoreError::EncryptionFailure { source } => {
            assert!(matches!(*source, SecureStoreError::PlatformUnavailable(_)));
        }
        other => panic!("expected EncryptionFailure, got {other:?}"),
    }
    assert!(backend.is_empty(DEFAULT_NAMESPACE));
}

#[test]
fn unavailable_backend() {
    let backend = FaultyBackend::new();
    let store = faulty_store(backend.clone());
    store.store_secret("wifi_ssid", "homenet").unwrap();

    backend.set_fail_open(true);
    assert!(matches!(
        store.store_secret("wifi_ssid", "other"),
        Err(SecureStoreError::BackendUnavailable(_))
    ));
    assert!(!store.exists("wifi_ssid"), "unavailable backend reads as absent");
    let mut out = [0u8; 16];
    assert!(matches!(
        store.retrieve_secret("wifi_ssid", &mut out),
        Err(SecureStoreError::BackendUnavailable(_))
    ));

    backend.set_fail_open(false);
    assert!(store.exists("wifi_ssid"));
}

#[test]
fn short_write_is_write_failure() {
    let backend = FaultyBackend::new();
    let store = faulty_store(backend.clone());
    backend.set_short_write(true);

    let err = store.store_int("mqtt_port", 8883).unwrap_err();
    assert!(matches!(
        err,
        SecureStoreError::WriteFailure { expected: 32, written: 31 }
    ));
}

#[test]
fn refused_remove_and_clear() {
    let backend = FaultyBackend::new();
    let store = faulty_store(backend.clone());
    store.store_secret("k", "v").unwrap();

    backend.set_refuse_remove(true);
    assert!(store.delete("k").unwrap_err().is_not_found());

    backend.set_refuse_clear(true);
    assert!(matches!(
        store.clear_all(),
        Err(SecureStoreError::BackendUnavailable(_))
    ));
    assert!(store.exists("k"));
}

#[test]
fn every_operation_closes_its_handle() {
    let backend = FaultyBackend::new();
    let store = faulty_store(backend.clone());
    let mut out = [0u8; 16];

    store.store_secret("a", "1").unwrap();
    store.store_int("b", 2).unwrap();
    store.retrieve_secret("a", &mut out).unwrap();
    store.retrieve_int("b").unwrap();
    let _ = store.retrieve_secret("missing", &mut out);
    let _ = store.retrieve_secret("a", &mut out[..1]);
    store.exists("a");
    store.delete("a").unwrap();
    let _ = store.delete("a");
    store.clear_all().unwrap();

    assert_eq!(backend.opens(), 10);
    assert_eq!(backend.opens(), backend.closes());
}

#[test]
fn sqlite_records_survive_reboot() {
    let db = TempSqlite::new().unwrap();
    {
        let store = SecureStore::new(
            db.backend(),
            &FixedHardwareId(DEVICE_MAC),
            SystemEntropy::new(),
            StoreOptions::default(),
        )
        .unwrap();
        store.store_secret("wifi_ssid", "homenet").unwrap();
        store.store_int("mqtt_port", -8883).unwrap();
    }

    let store = SecureStore::new(
        db.reopen().unwrap(),
        &FixedHardwareId(DEVICE_MAC),
        SystemEntropy::new(),
        StoreOptions::default(),
    )
    .unwrap();
    let mut out = [0u8; 64];
    let n = store.retrieve_secret("wifi_ssid", &mut out).unwrap();
    assert_eq!(&out[..=n], b"homenet\0");
    assert_eq!(store.retrieve_int("mqtt_port").unwrap(), -8883);

    store.clear_all().unwrap();
    assert!(!store.exists("wifi_ssid"));
    assert!(!store.exists("mqtt_port"));
}

#[test]
fn sqlite_upgrade_path() {
    let db = TempSqlite::new().unwrap();
    let legacy = SecureStore::new(
        db.backend(),
        &FixedHardwareId(DEVICE_MAC),
        SystemEntropy::new(),
        StoreOptions::default(),
    )
    .unwrap();
    legacy.store_secret("mqtt_user", "sensor-01").unwrap();

    let v1 = SecureStore::new(
        db.backend(),
        &FixedHardwareId(DEVICE_MAC),
        SystemEntropy::new(),
        StoreOptions {
            format: RecordFormat::V1,
            ..StoreOptions::default()
        },
    )
    .unwrap();
    assert_eq!(v1.retrieve_string("mqtt_user").unwrap().expose_secret(), "sensor-01");
    assert!(v1.upgrade("mqtt_user").unwrap());

    // The legacy-only reader can no longer open it.
    assert!(legacy.retrieve_string("mqtt_user").is_err());
}

#[test]
fn shared_store_serializes_concurrent_callers() {
    let store = Arc::new(memory_store(MemoryBackend::new(), RecordFormat::Legacy));
    let workers: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    let name = format!("t{t}_k{i}");
                    store.store_int(&name, t * 1000 + i).unwrap();
                    assert_eq!(store.retrieve_int(&name).unwrap(), t * 1000 + i);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(store.backend().len(DEFAULT_NAMESPACE), 200);
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

    #[test]
    fn strings_round_trip(value in "\\PC{0,40}", slack in 1usize..8) {
        let store = memory_store(MemoryBackend::new(), RecordFormat::Legacy);
        store.store_secret("value", &value).unwrap();
        let mut out = vec![0xffu8; value.len() + slack];
        let n = store.retrieve_secret("value", &mut out).unwrap();
        proptest::prop_assert_eq!(&out[..n], value.as_bytes());
        proptest::prop_assert_eq!(out[n], 0);
    }

    #[test]
    fn integers_round_trip(value in proptest::num::i32::ANY, v1 in proptest::bool::ANY) {
        let format = if v1 { RecordFormat::V1 } else { RecordFormat::Legacy };
        let store = memory_store(MemoryBackend::new(), format);
        store.store_int("n", value).unwrap();
        proptest::prop_assert_eq!(store.retrieve_int("n").unwrap(), value);
    }
}
