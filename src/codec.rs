//! # Shared Codec Helpers
//!
//! Multibase/multicodec encoding and the two `ecdsa-sd-2023` CBOR tags live
//! here so the Data Integrity suites don't each reinvent them (`spec.md`
//! §6, §9 "Multi-format public keys").

use ciborium::Value as CborValue;
use multibase::Base;

use crate::error::CryptoError;
use crate::signer::Algorithm;

/// CBOR tag for an `ecdsa-sd-2023` base proof (`spec.md` §3).
pub const SD_BASE_PROOF_TAG: u64 = 0x5d00;
/// CBOR tag for an `ecdsa-sd-2023` derived proof (`spec.md` §3).
pub const SD_DERIVED_PROOF_TAG: u64 = 0x5d01;

/// Multibase-encode `bytes` as base58-btc (`z`-prefixed), used by
/// `eddsa-rdfc-2022` and `ecdsa-rdfc-2019` proof values.
#[must_use]
pub fn multibase_base58(bytes: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, bytes)
}

/// Multibase-encode `bytes` as base64url-no-pad (`u`-prefixed), used by
/// `ecdsa-sd-2023` proof values.
#[must_use]
pub fn multibase_base64url(bytes: &[u8]) -> String {
    multibase::encode(Base::Base64Url, bytes)
}

/// Decode a multibase string, rejecting anything but the expected base.
///
/// # Errors
/// Returns [`CryptoError::InvalidProofValue`] if the string cannot be
/// decoded or uses a different base than `expected`.
pub fn multibase_decode_expect(s: &str, expected: Base) -> Result<Vec<u8>, CryptoError> {
    let (base, bytes) = multibase::decode(s).map_err(|_| CryptoError::InvalidProofValue)?;
    if base != expected {
        return Err(CryptoError::InvalidProofValue);
    }
    Ok(bytes)
}

/// Serialize a CBOR-tagged array of values.
///
/// # Errors
/// Returns [`CryptoError::InvalidProofValue`] if CBOR encoding fails.
pub fn cbor_tagged_array(tag: u64, items: Vec<CborValue>) -> Result<Vec<u8>, CryptoError> {
    let tagged = CborValue::Tag(tag, Box::new(CborValue::Array(items)));
    let mut out = Vec::new();
    ciborium::into_writer(&tagged, &mut out).map_err(|_| CryptoError::InvalidProofValue)?;
    Ok(out)
}

/// Parse a CBOR-tagged array, returning the tag and its element array.
///
/// # Errors
/// Returns [`CryptoError::InvalidProofValue`] if the bytes are not CBOR, or
/// not a `Tag(Array(..))` shape.
pub fn parse_cbor_tagged_array(bytes: &[u8]) -> Result<(u64, Vec<CborValue>), CryptoError> {
    let value: CborValue =
        ciborium::from_reader(bytes).map_err(|_| CryptoError::InvalidProofValue)?;
    match value {
        CborValue::Tag(tag, inner) => match *inner {
            CborValue::Array(items) => Ok((tag, items)),
            _ => Err(CryptoError::InvalidProofValue),
        },
        _ => Err(CryptoError::InvalidProofValue),
    }
}

/// Parse a multi-format ECDSA/EdDSA public key (`spec.md` §9):
/// - `0x04 ‖ X ‖ Y`: uncompressed SEC1 point on the hinted curve.
/// - `0x80 0x24 ‖ …`: multicodec-prefixed compressed P-256 point.
/// - `0x81 0x24 ‖ …`: multicodec-prefixed compressed P-384 point.
///
/// Returns the curve algorithm and the point in uncompressed SEC1 form.
///
/// # Errors
/// Returns [`CryptoError::InvalidKeyFormat`] for any other prefix or a
/// malformed point.
pub fn parse_public_key(bytes: &[u8], hint: Option<Algorithm>) -> Result<(Algorithm, Vec<u8>), CryptoError> {
    match bytes.first() {
        Some(0x04) => {
            let alg = hint.unwrap_or(Algorithm::Es256);
            Ok((alg, bytes.to_vec()))
        }
        Some(0x80) if bytes.get(1) == Some(&0x24) => {
            let point = p256::EncodedPoint::from_bytes(&bytes[2..])
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            let uncompressed = to_uncompressed_p256(&point)?;
            Ok((Algorithm::Es256, uncompressed))
        }
        Some(0x81) if bytes.get(1) == Some(&0x24) => {
            let point = p384::EncodedPoint::from_bytes(&bytes[2..])
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            let uncompressed = to_uncompressed_p384(&point)?;
            Ok((Algorithm::Es384, uncompressed))
        }
        _ => Err(CryptoError::InvalidKeyFormat("unrecognized public key prefix".into())),
    }
}

fn to_uncompressed_p256(point: &p256::EncodedPoint) -> Result<Vec<u8>, CryptoError> {
    let verifying_key = p256::ecdsa::VerifyingKey::from_encoded_point(point)
        .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    Ok(verifying_key.to_encoded_point(false).as_bytes().to_vec())
}

fn to_uncompressed_p384(point: &p384::EncodedPoint) -> Result<Vec<u8>, CryptoError> {
    let verifying_key = p384::ecdsa::VerifyingKey::from_encoded_point(point)
        .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    Ok(verifying_key.to_encoded_point(false).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_round_trips() {
        let encoded = multibase_base58(b"hello world");
        assert!(encoded.starts_with('z'));
        let decoded = multibase_decode_expect(&encoded, Base::Base58Btc).unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn base64url_round_trips() {
        let encoded = multibase_base64url(b"hello world");
        assert!(encoded.starts_with('u'));
        let decoded = multibase_decode_expect(&encoded, Base::Base64Url).unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn cbor_tag_round_trips() {
        let bytes =
            cbor_tagged_array(SD_BASE_PROOF_TAG, vec![CborValue::Integer(1.into())]).unwrap();
        let (tag, items) = parse_cbor_tagged_array(&bytes).unwrap();
        assert_eq!(tag, SD_BASE_PROOF_TAG);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert!(parse_public_key(&[0x99, 0x00], None).is_err());
    }
}
