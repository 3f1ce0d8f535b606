// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the securestore credential vault.

use thiserror::Error;

/// The primary error type returned by every vault, backend, and platform operation.
///
/// Messages never carry secret material: record names may appear, values never do.
#[derive(Debug, Error)]
pub enum SecureStoreError {
    /// The hardware identifier or the entropy source could not be read.
    #[error("platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// The AEAD key could not be installed.
    #[error("cipher setup failed")]
    CipherSetupError,

    /// Tag verification failed.
    ///
    /// Tampered data, corrupted data, and a wrong key all produce this same
    /// variant so callers cannot distinguish them.
    #[error("authentication failed -- record is corrupted or was sealed under another key")]
    AuthenticationFailure,

    /// A stored blob is shorter than the minimum record size.
    #[error("malformed record: {len} bytes, minimum is {min}")]
    MalformedRecord { len: usize, min: usize },

    /// The caller's output buffer cannot hold the decrypted value plus terminator.
    #[error("buffer too small: value needs {needed} bytes, buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// A stored integer record does not contain decimal text.
    #[error("stored value is not a decimal i32: {0}")]
    ParseError(String),

    /// No record exists under the given name.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The backend namespace could not be opened or refused the operation.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend accepted fewer bytes than the blob length.
    #[error("write failure: backend stored {written} of {expected} bytes")]
    WriteFailure { expected: usize, written: usize },

    /// The encryption step of a store operation failed.
    #[error("encryption failed: {source}")]
    EncryptionFailure { source: Box<SecureStoreError> },

    /// Record names must be non-empty and fit the backend key limit.
    #[error("invalid secret name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    /// Configuration errors (invalid values, unreadable manifests).
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend driver errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SecureStoreError {
    /// Wrap a cipher-stage error as an [`SecureStoreError::EncryptionFailure`].
    pub fn encryption(source: SecureStoreError) -> Self {
        Self::EncryptionFailure {
            source: Box::new(source),
        }
    }

    /// Returns true when the error means "no such record" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
