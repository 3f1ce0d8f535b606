// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The secure store: encrypted secrets over a namespaced key-value backend.
//!
//! Every public operation is one backend cycle: open the namespace, operate,
//! close it. An internal mutex keeps cycles from interleaving when the store
//! is shared across threads. The device key is derived once at construction
//! and is the only state kept between calls.

use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;
use securestore_config::model::VaultConfig;
use securestore_core::{
    validate_name, EntropySource, HardwareIdentity, KvBackend, NamespaceHandle, RecordFormat,
    SecureStoreError, DEFAULT_NAMESPACE,
};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::codec;
use crate::crypto;
use crate::kdf::{self, DeviceKey};

/// Construction options, normally taken from the `[vault]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub namespace: String,
    pub format: RecordFormat,
    /// In `V1` mode, retry reads that fail under the V1 key as legacy records.
    pub legacy_fallback: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            format: RecordFormat::Legacy,
            legacy_fallback: true,
        }
    }
}

impl From<&VaultConfig> for StoreOptions {
    fn from(config: &VaultConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            format: config.format,
            legacy_fallback: config.legacy_fallback,
        }
    }
}

/// Encrypted credential store over backend `B`.
///
/// Debug output omits key material.
pub struct SecureStore<B: KvBackend> {
    backend: B,
    namespace: String,
    format: RecordFormat,
    legacy_fallback: bool,
    /// Key for the configured write format.
    key: DeviceKey,
    /// Legacy key kept in `V1` mode for fallback reads and upgrades.
    legacy_key: Option<DeviceKey>,
    entropy: Box<dyn EntropySource>,
    cycle_lock: Mutex<()>,
}

impl<B: KvBackend> std::fmt::Debug for SecureStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStore")
            .field("backend", &self.backend.name())
            .field("namespace", &self.namespace)
            .field("format", &self.format)
            .field("legacy_fallback", &self.legacy_fallback)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl<B: KvBackend> SecureStore<B> {
    /// Derive the device key(s) from `identity` and build the store.
    ///
    /// Fails with `PlatformUnavailable` when the identifier cannot be read.
    pub fn new(
        backend: B,
        identity: &dyn HardwareIdentity,
        entropy: impl EntropySource + 'static,
        options: StoreOptions,
    ) -> Result<Self, SecureStoreError> {
        let id = identity.hardware_id()?;
        let key = kdf::derive(options.format, &id)?;
        let legacy_key = match options.format {
            RecordFormat::Legacy => None,
            RecordFormat::V1 => Some(kdf::derive_legacy(&id)),
        };
        Self::with_keys(backend, key, legacy_key, entropy, options)
    }

    /// Build the store around injected keys.
    ///
    /// `legacy_key` is only consulted in `V1` mode.
    pub fn with_keys(
        backend: B,
        key: DeviceKey,
        legacy_key: Option<DeviceKey>,
        entropy: impl EntropySource + 'static,
        options: StoreOptions,
    ) -> Result<Self, SecureStoreError> {
        validate_name(&options.namespace)?;
        info!(
            backend = backend.name(),
            namespace = %options.namespace,
            format = %options.format,
            "secure store ready"
        );
        Ok(Self {
            backend,
            namespace: options.namespace,
            format: options.format,
            legacy_fallback: options.legacy_fallback,
            key,
            legacy_key,
            entropy: Box::new(entropy),
            cycle_lock: Mutex::new(()),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Encrypt and store a string under `name`, replacing any previous value.
    pub fn store_secret(&self, name: &str, value: &str) -> Result<(), SecureStoreError> {
        self.store_bytes(name, value.as_bytes())
    }

    /// Store an integer as encrypted decimal text.
    pub fn store_int(&self, name: &str, value: i32) -> Result<(), SecureStoreError> {
        let text = codec::encode_int(value);
        self.store_bytes(name, &text)
    }

    fn store_bytes(&self, name: &str, plaintext: &[u8]) -> Result<(), SecureStoreError> {
        validate_name(name)?;
        self.cycle(false, |handle| {
            let blob = self
                .seal_record(plaintext)
                .map_err(SecureStoreError::encryption)?;
            let written = handle.put_bytes(name, &blob)?;
            if written != blob.len() {
                return Err(SecureStoreError::WriteFailure {
                    expected: blob.len(),
                    written,
                });
            }
            Ok(())
        })?;
        debug!(name, "secret stored");
        Ok(())
    }

    /// Decrypt the record `name` into `out`, followed by a `0` terminator.
    ///
    /// Returns the plaintext length. `out` must hold the plaintext plus one
    /// byte; otherwise nothing is decrypted and `BufferTooSmall` is returned.
    pub fn retrieve_secret(&self, name: &str, out: &mut [u8]) -> Result<usize, SecureStoreError> {
        validate_name(name)?;
        let blob = self.cycle(true, |handle| read_blob(handle, name))?;
        let len = self.open_record(name, &blob, out)?;
        debug!(name, "secret retrieved");
        Ok(len)
    }

    /// Retrieve an integer record through a fixed-size staging buffer.
    pub fn retrieve_int(&self, name: &str) -> Result<i32, SecureStoreError> {
        let mut staging = Zeroizing::new([0u8; codec::INT_TEXT_CAPACITY]);
        let len = self.retrieve_secret(name, &mut staging[..])?;
        codec::decode_int(&staging[..len])
    }

    /// Retrieve a string record without sizing a buffer up front.
    pub fn retrieve_string(&self, name: &str) -> Result<SecretString, SecureStoreError> {
        validate_name(name)?;
        let blob = self.cycle(true, |handle| read_blob(handle, name))?;
        // The plaintext is never longer than the blob, leaving room for the terminator.
        let mut out = Zeroizing::new(vec![0u8; blob.len()]);
        let len = self.open_record(name, &blob, &mut out)?;
        let text = std::str::from_utf8(&out[..len])
            .map_err(|_| SecureStoreError::ParseError(format!("`{name}` is not UTF-8 text")))?;
        debug!(name, "secret retrieved");
        Ok(SecretString::from(text.to_owned()))
    }

    /// Whether a record named `name` exists. Never fails: an unusable name
    /// or an unavailable backend reads as absent.
    pub fn exists(&self, name: &str) -> bool {
        if validate_name(name).is_err() {
            return false;
        }
        self.cycle(true, |handle| Ok(handle.has_key(name)))
            .unwrap_or_else(|e| {
                debug!(name, error = %e, "existence check failed, reporting absent");
                false
            })
    }

    /// Remove the record `name`. `NotFound` when there was nothing to remove.
    pub fn delete(&self, name: &str) -> Result<(), SecureStoreError> {
        validate_name(name)?;
        self.cycle(false, |handle| {
            if handle.remove(name)? {
                Ok(())
            } else {
                Err(SecureStoreError::NotFound(name.to_string()))
            }
        })?;
        debug!(name, "secret deleted");
        Ok(())
    }

    /// Erase every record in the namespace. Irreversible.
    pub fn clear_all(&self) -> Result<(), SecureStoreError> {
        self.cycle(false, |handle| {
            if handle.clear()? {
                Ok(())
            } else {
                Err(SecureStoreError::BackendUnavailable(format!(
                    "backend refused to clear namespace `{}`",
                    self.namespace
                )))
            }
        })?;
        info!(namespace = %self.namespace, "all secrets cleared");
        Ok(())
    }

    /// Re-encrypt a legacy record in the V1 format.
    ///
    /// Returns `false` when the record is already a V1 record. Requires the
    /// store to be configured for `V1`.
    pub fn upgrade(&self, name: &str) -> Result<bool, SecureStoreError> {
        validate_name(name)?;
        if self.format != RecordFormat::V1 {
            return Err(SecureStoreError::Config(
                "upgrading records requires vault.format = \"v1\"".into(),
            ));
        }
        let legacy_key = self.legacy_key.as_ref().ok_or_else(|| {
            SecureStoreError::Config("no legacy key available for upgrade".into())
        })?;

        let rewritten = self.cycle(false, |handle| {
            let blob = read_blob(handle, name)?;
            let mut plaintext = Zeroizing::new(vec![0u8; blob.len()]);

            match open_with(RecordFormat::V1, &self.key, &blob, &mut plaintext) {
                Ok(_) => return Ok(false),
                Err(SecureStoreError::AuthenticationFailure)
                | Err(SecureStoreError::MalformedRecord { .. }) => {}
                Err(e) => return Err(e),
            }

            let len = open_with(RecordFormat::Legacy, legacy_key, &blob, &mut plaintext)
                .inspect_err(|_| warn!(name, "record failed authentication during upgrade"))?;
            let upgraded = self
                .seal_record(&plaintext[..len])
                .map_err(SecureStoreError::encryption)?;
            let written = handle.put_bytes(name, &upgraded)?;
            if written != upgraded.len() {
                return Err(SecureStoreError::WriteFailure {
                    expected: upgraded.len(),
                    written,
                });
            }
            Ok(true)
        })?;

        if rewritten {
            info!(name, "record upgraded to v1 format");
        } else {
            debug!(name, "record already in v1 format");
        }
        Ok(rewritten)
    }

    /// One open -> operate -> close cycle, serialized against other callers.
    fn cycle<T>(
        &self,
        read_only: bool,
        op: impl FnOnce(&mut B::Handle) -> Result<T, SecureStoreError>,
    ) -> Result<T, SecureStoreError> {
        let _guard = self.cycle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut handle = self
            .backend
            .open(&self.namespace, read_only)
            .map_err(|e| match e {
                SecureStoreError::BackendUnavailable(_) => e,
                other => SecureStoreError::BackendUnavailable(other.to_string()),
            })?;
        let result = op(&mut handle);
        handle.close();
        result
    }

    fn seal_record(&self, plaintext: &[u8]) -> Result<Zeroizing<Vec<u8>>, SecureStoreError> {
        let sealed = crypto::encrypt(&self.key, &*self.entropy, plaintext)?;
        Ok(codec::encode_record(
            self.format,
            &sealed.nonce,
            &sealed.ciphertext,
            &sealed.tag,
        ))
    }

    fn open_record(
        &self,
        name: &str,
        blob: &[u8],
        out: &mut [u8],
    ) -> Result<usize, SecureStoreError> {
        let primary = open_with(self.format, &self.key, blob, out);
        let retry = self.legacy_fallback
            && matches!(
                primary,
                Err(SecureStoreError::AuthenticationFailure)
                    | Err(SecureStoreError::MalformedRecord { .. })
            );
        let result = match (&self.legacy_key, retry) {
            (Some(legacy_key), true) => {
                debug!(name, "retrying as legacy record");
                // A failed legacy attempt keeps the primary error.
                match open_with(RecordFormat::Legacy, legacy_key, blob, out) {
                    Ok(len) => {
                        warn!(name, "read legacy-format record; run upgrade to re-encrypt it");
                        Ok(len)
                    }
                    Err(_) => primary,
                }
            }
            _ => primary,
        };
        if matches!(result, Err(SecureStoreError::AuthenticationFailure)) {
            warn!(name, "record failed authentication");
        }
        result
    }
}

/// Copy the raw blob for `name` out of the backend.
fn read_blob<H: NamespaceHandle>(
    handle: &mut H,
    name: &str,
) -> Result<Zeroizing<Vec<u8>>, SecureStoreError> {
    let len = handle.get_length(name);
    if len == 0 {
        return Err(SecureStoreError::NotFound(name.to_string()));
    }
    let mut blob = Zeroizing::new(vec![0u8; len]);
    let copied = handle.get_bytes(name, &mut blob)?;
    blob.truncate(copied);
    Ok(blob)
}

/// Decode `blob` as `format`, check `out` can take plaintext plus terminator,
/// then decrypt.
fn open_with(
    format: RecordFormat,
    key: &DeviceKey,
    blob: &[u8],
    out: &mut [u8],
) -> Result<usize, SecureStoreError> {
    let record = codec::decode_record(format, blob)?;
    let needed = record.ciphertext.len() + 1;
    if out.len() < needed {
        return Err(SecureStoreError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }
    let len = crypto::decrypt(
        key,
        record.nonce,
        record.ciphertext,
        record.tag,
        &mut out[..needed - 1],
    )?;
    out[len] = 0;
    Ok(len)
}

/// Mask a secret for display: `"home...word"`.
///
/// Shows up to 4 leading and 4 trailing characters. Values under 10
/// characters are fully masked as `"****"`.
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count < 10 {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    let suffix: String = value.chars().skip(count - 4).collect();
    format!("{prefix}...{suffix}")
}
