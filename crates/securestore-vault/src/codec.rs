// SPDX-FileCopyrightText: 2026 Securestore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk record layout and typed value encoding.
//!
//! Legacy records are `nonce[12] || ciphertext[N] || tag[16]` with no header.
//! V1 records prepend a single version byte, `0x01`. Integers are stored as
//! decimal ASCII text with no type tag.

use securestore_core::{RecordFormat, SecureStoreError};
use zeroize::Zeroizing;

use crate::crypto::{NONCE_LEN, TAG_LEN};

/// Smallest valid legacy blob: nonce plus tag around an empty ciphertext.
pub const LEGACY_MIN_LEN: usize = NONCE_LEN + TAG_LEN;

/// Version byte that opens every V1 record.
pub const V1_VERSION: u8 = 0x01;

/// Smallest valid V1 blob.
pub const V1_MIN_LEN: usize = 1 + LEGACY_MIN_LEN;

/// Longest decimal `i32` text (`-2147483648`) plus the retrieval terminator.
pub const INT_TEXT_CAPACITY: usize = 12;

/// Borrowed view over the parts of a stored blob.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    pub nonce: &'a [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
    pub tag: &'a [u8; TAG_LEN],
}

/// Minimum blob length for `format`.
pub fn min_len(format: RecordFormat) -> usize {
    match format {
        RecordFormat::Legacy => LEGACY_MIN_LEN,
        RecordFormat::V1 => V1_MIN_LEN,
    }
}

/// `nonce || ciphertext || tag`.
pub fn encode_blob(
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Zeroizing<Vec<u8>> {
    encode_record(RecordFormat::Legacy, nonce, ciphertext, tag)
}

/// Split a legacy blob into its parts.
pub fn decode_blob(bytes: &[u8]) -> Result<RecordView<'_>, SecureStoreError> {
    decode_record(RecordFormat::Legacy, bytes)
}

/// Lay out a record in `format`.
pub fn encode_record(
    format: RecordFormat,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Zeroizing<Vec<u8>> {
    let mut blob = Zeroizing::new(Vec::with_capacity(min_len(format) + ciphertext.len()));
    if format == RecordFormat::V1 {
        blob.push(V1_VERSION);
    }
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(ciphertext);
    blob.extend_from_slice(tag);
    blob
}

/// Split a record stored in `format` into borrowed parts.
///
/// Blobs shorter than the format minimum are `MalformedRecord`. A V1 blob
/// with an unknown version byte is reported as `AuthenticationFailure`,
/// the same as any other blob the vault cannot authenticate.
pub fn decode_record(
    format: RecordFormat,
    bytes: &[u8],
) -> Result<RecordView<'_>, SecureStoreError> {
    let min = min_len(format);
    let malformed = || SecureStoreError::MalformedRecord {
        len: bytes.len(),
        min,
    };
    if bytes.len() < min {
        return Err(malformed());
    }

    let body = match format {
        RecordFormat::Legacy => bytes,
        RecordFormat::V1 => match bytes.split_first() {
            Some((&V1_VERSION, rest)) => rest,
            _ => return Err(SecureStoreError::AuthenticationFailure),
        },
    };

    let (nonce, rest) = body.split_first_chunk::<NONCE_LEN>().ok_or_else(malformed)?;
    let (ciphertext, tag) = rest.split_last_chunk::<TAG_LEN>().ok_or_else(malformed)?;
    Ok(RecordView {
        nonce,
        ciphertext,
        tag,
    })
}

/// Decimal ASCII text of `value`, e.g. `-7` becomes `"-7"`.
pub fn encode_int(value: i32) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(value.to_string().into_bytes())
}

/// Strictly parse decimal text back into an `i32`.
///
/// Empty input, whitespace, non-digits, trailing bytes, and out-of-range
/// values are all `ParseError`.
pub fn decode_int(bytes: &[u8]) -> Result<i32, SecureStoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| SecureStoreError::ParseError("not ASCII text".into()))?;
    text.parse::<i32>()
        .map_err(|e| SecureStoreError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONCE: [u8; NONCE_LEN] = [0xaa; NONCE_LEN];
    const TAG: [u8; TAG_LEN] = [0xbb; TAG_LEN];

    #[test]
    fn legacy_layout() {
        let blob = encode_blob(&NONCE, b"ct", &TAG);
        assert_eq!(blob.len(), 12 + 2 + 16);
        assert_eq!(&blob[..12], &NONCE);
        assert_eq!(&blob[12..14], b"ct");
        assert_eq!(&blob[14..], &TAG);

        let view = decode_blob(&blob).unwrap();
        assert_eq!(view.nonce, &NONCE);
        assert_eq!(view.ciphertext, b"ct");
        assert_eq!(view.tag, &TAG);
    }

    #[test]
    fn v1_layout_has_version_prefix() {
        let blob = encode_record(RecordFormat::V1, &NONCE, b"ct", &TAG);
        assert_eq!(blob.len(), 1 + 12 + 2 + 16);
        assert_eq!(blob[0], V1_VERSION);

        let view = decode_record(RecordFormat::V1, &blob).unwrap();
        assert_eq!(view.ciphertext, b"ct");
    }

    #[test]
    fn minimum_length_blob_has_empty_ciphertext() {
        let blob = [0u8; LEGACY_MIN_LEN];
        let view = decode_blob(&blob).unwrap();
        assert!(view.ciphertext.is_empty());
    }

    #[test]
    fn short_blob_is_malformed() {
        assert!(matches!(
            decode_blob(&[0u8; 27]),
            Err(SecureStoreError::MalformedRecord { len: 27, min: 28 })
        ));
        assert!(matches!(
            decode_record(RecordFormat::V1, &[1u8; 28]),
            Err(SecureStoreError::MalformedRecord { len: 28, min: 29 })
        ));
        assert!(matches!(
            decode_blob(&[]),
            Err(SecureStoreError::MalformedRecord { len: 0, .. })
        ));
    }

    #[test]
    fn unknown_version_byte_is_authentication_failure() {
        let mut blob = encode_record(RecordFormat::V1, &NONCE, b"ct", &TAG);
        blob[0] = 0x02;
        assert!(matches!(
            decode_record(RecordFormat::V1, &blob),
            Err(SecureStoreError::AuthenticationFailure)
        ));
    }

    #[test]
    fn int_text_encoding() {
        assert_eq!(&*encode_int(-7), b"-7");
        assert_eq!(&*encode_int(0), b"0");
        assert_eq!(&*encode_int(8883), b"8883");
        assert_eq!(encode_int(i32::MIN).len() + 1, INT_TEXT_CAPACITY);
    }

    #[test]
    fn int_decoding_is_strict() {
        assert_eq!(decode_int(b"8883").unwrap(), 8883);
        assert_eq!(decode_int(b"-2147483648").unwrap(), i32::MIN);
        for bad in [
            &b""[..],
            b" 1",
            b"1 ",
            b"12abc",
            b"abc",
            b"2147483648",
            b"-",
            b"\xff",
        ] {
            assert!(
                matches!(decode_int(bad), Err(SecureStoreError::ParseError(_))),
                "accepted {bad:?}"
            );
        }
    }

    proptest::proptest! {
        #[test]
        fn every_i32_survives_text_encoding(value in proptest::num::i32::ANY) {
            proptest::prop_assert_eq!(decode_int(&encode_int(value)).unwrap(), value);
        }
    }
}
