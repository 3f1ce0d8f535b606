// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM encrypt/decrypt with detached nonce and tag.
//!
//! Every call to [`encrypt`] draws a fresh 96-bit nonce from the supplied
//! [`EntropySource`]. If the source fails, encryption fails: there is no
//! counter or zero-nonce fallback. Associated data is always empty.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use securestore_core::{EntropySource, SecureStoreError};
use zeroize::Zeroizing;

use crate::kdf::DeviceKey;

/// GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Output of [`encrypt`]. The ciphertext is as long as the plaintext.
pub struct Sealed {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Zeroizing<Vec<u8>>,
    pub tag: [u8; TAG_LEN],
}

fn install_key(key: &DeviceKey) -> Result<LessSafeKey, SecureStoreError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| SecureStoreError::CipherSetupError)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key` with a nonce drawn from `entropy`.
pub fn encrypt(
    key: &DeviceKey,
    entropy: &dyn EntropySource,
    plaintext: &[u8],
) -> Result<Sealed, SecureStoreError> {
    let mut nonce = [0u8; NONCE_LEN];
    entropy.fill(&mut nonce)?;
    encrypt_with_nonce(key, nonce, plaintext)
}

/// Encrypt with a caller-chosen nonce.
///
/// Reusing a nonce under the same key breaks GCM; production paths go
/// through [`encrypt`].
pub fn encrypt_with_nonce(
    key: &DeviceKey,
    nonce: [u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Sealed, SecureStoreError> {
    let cipher = install_key(key)?;

    let mut ciphertext = Zeroizing::new(plaintext.to_vec());
    let tag = cipher
        .seal_in_place_separate_tag(
            Nonce::assume_unique_for_key(nonce),
            Aad::empty(),
            ciphertext.as_mut_slice(),
        )
        .map_err(|_| SecureStoreError::Internal("AES-256-GCM seal failed".into()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_ref());

    Ok(Sealed {
        nonce,
        ciphertext,
        tag: tag_bytes,
    })
}

/// Verify and decrypt into `out`, returning the plaintext length.
///
/// `out` must hold at least `ciphertext.len()` bytes. Nothing is written to
/// `out` unless the tag verifies.
pub fn decrypt(
    key: &DeviceKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
    out: &mut [u8],
) -> Result<usize, SecureStoreError> {
    if out.len() < ciphertext.len() {
        return Err(SecureStoreError::BufferTooSmall {
            needed: ciphertext.len(),
            available: out.len(),
        });
    }
    let cipher = install_key(key)?;

    let mut working = Zeroizing::new(Vec::with_capacity(ciphertext.len() + TAG_LEN));
    working.extend_from_slice(ciphertext);
    working.extend_from_slice(tag);

    let plaintext = cipher
        .open_in_place(
            Nonce::assume_unique_for_key(*nonce),
            Aad::empty(),
            working.as_mut_slice(),
        )
        .map_err(|_| SecureStoreError::AuthenticationFailure)?;

    out[..plaintext.len()].copy_from_slice(plaintext);
    Ok(plaintext.len())
}
