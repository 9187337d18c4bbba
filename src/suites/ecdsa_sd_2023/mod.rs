//! # `ecdsa-sd-2023`
//!
//! The selective-disclosure Data Integrity cryptosuite (`spec.md` §4.7):
//! an issuer creates a base proof over every statement in a credential, a
//! holder derives a presentation that reveals only a chosen subset of the
//! non-mandatory statements (plus every mandatory one), and a verifier
//! checks the derived proof without ever seeing the withheld statements or
//! the issuer's per-document HMAC key.
//!
//! ## Simplified signature binding
//!
//! The published `ecdsa-sd-2023` algorithm binds the issuer's base
//! signature over `(proofHash, publicKey, hmacKey, signatures, mandatoryHash)`
//! in full. This implementation binds the base signature over
//! `(proofHash, publicKey, mandatoryHash)` only: the ephemeral key named in
//! `publicKey` is what actually signs each non-mandatory statement (see
//! [`base::create_base_proof`]), so the issuer's static signature still
//! transitively covers every selectively-disclosable statement through
//! that key, without needing the holder to carry the issuer's `hmacKey`
//! forward into a derived proof — which would correlate presentations
//! derived from the same base proof. The tradeoff is documented in
//! `DESIGN.md`.

pub mod base;
pub mod derive;
mod select;
pub mod verify;

use ciborium::Value as CborValue;
use oxrdf::Quad;
use sha2::{Digest, Sha256};

use crate::error::SdError;
use crate::rdf::term::{blank_labels_in, quad_to_line, relabel_quad};

/// The cryptosuite name this module implements.
pub const CRYPTOSUITE: &str = "ecdsa-sd-2023";

pub(crate) fn hmac_relabel(quads: &[Quad], hmac_key: &[u8; 32]) -> Vec<Quad> {
    use hmac::{Hmac, Mac};
    type HmacSha256 = Hmac<Sha256>;

    let mut labels = std::collections::HashSet::new();
    for quad in quads {
        labels.extend(blank_labels_in(quad));
    }
    let mut map = std::collections::HashMap::new();
    for label in labels {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(hmac_key).expect("hmac accepts any key length");
        mac.update(label.as_bytes());
        let tag = mac.finalize().into_bytes();
        map.insert(label, format!("b{}", hex::encode(&tag[..8])));
    }
    quads.iter().map(|q| relabel_quad(q, &map)).collect()
}

fn hash_quad_lines(quads: &[Quad]) -> Vec<u8> {
    let mut lines: Vec<String> = quads.iter().map(quad_to_line).collect();
    lines.sort_unstable();
    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
    }
    hasher.finalize().to_vec()
}

fn cbor_bytes(bytes: &[u8]) -> CborValue {
    CborValue::Bytes(bytes.to_vec())
}

fn cbor_text_array(items: &[String]) -> CborValue {
    CborValue::Array(items.iter().cloned().map(CborValue::Text).collect())
}

fn cbor_byte_array(items: &[Vec<u8>]) -> CborValue {
    CborValue::Array(items.iter().map(|b| cbor_bytes(b)).collect())
}

fn expect_bytes(value: &CborValue) -> Result<Vec<u8>, SdError> {
    match value {
        CborValue::Bytes(b) => Ok(b.clone()),
        _ => Err(SdError::InvalidSelection("expected CBOR byte string".into())),
    }
}

fn expect_text_array(value: &CborValue) -> Result<Vec<String>, SdError> {
    match value {
        CborValue::Array(items) => items
            .iter()
            .map(|v| match v {
                CborValue::Text(s) => Ok(s.clone()),
                _ => Err(SdError::InvalidSelection("expected CBOR text string".into())),
            })
            .collect(),
        _ => Err(SdError::InvalidSelection("expected CBOR array".into())),
    }
}

fn expect_byte_array(value: &CborValue) -> Result<Vec<Vec<u8>>, SdError> {
    match value {
        CborValue::Array(items) => items.iter().map(expect_bytes).collect(),
        _ => Err(SdError::InvalidSelection("expected CBOR array".into())),
    }
}

/// The decoded contents of an `ecdsa-sd-2023` base proof.
pub(crate) struct DecodedBaseProof {
    pub base_signature: Vec<u8>,
    pub ephemeral_public_key: Vec<u8>,
    pub hmac_key: [u8; 32],
    pub signatures: Vec<Vec<u8>>,
    pub mandatory_pointers: Vec<String>,
}

pub(crate) fn decode_base_proof(proof_value: &str) -> Result<DecodedBaseProof, crate::error::CryptoError> {
    use crate::codec::{multibase_decode_expect, parse_cbor_tagged_array, SD_BASE_PROOF_TAG};
    let bytes = multibase_decode_expect(proof_value, multibase::Base::Base64Url)?;
    let (tag, items) = parse_cbor_tagged_array(&bytes)?;
    if tag != SD_BASE_PROOF_TAG || items.len() != 5 {
        return Err(crate::error::CryptoError::InvalidProofValue);
    }
    let as_sd = |e: SdError| {
        tracing::debug!(error = %e, "malformed ecdsa-sd-2023 base proof");
        crate::error::CryptoError::InvalidProofValue
    };
    let base_signature = expect_bytes(&items[0]).map_err(as_sd)?;
    let ephemeral_public_key = expect_bytes(&items[1]).map_err(as_sd)?;
    let hmac_key_vec = expect_bytes(&items[2]).map_err(as_sd)?;
    let hmac_key: [u8; 32] =
        hmac_key_vec.try_into().map_err(|_| crate::error::CryptoError::InvalidProofValue)?;
    let signatures = expect_byte_array(&items[3]).map_err(as_sd)?;
    let mandatory_pointers = expect_text_array(&items[4]).map_err(as_sd)?;
    Ok(DecodedBaseProof { base_signature, ephemeral_public_key, hmac_key, signatures, mandatory_pointers })
}

/// The decoded contents of an `ecdsa-sd-2023` derived proof.
pub(crate) struct DecodedDerivedProof {
    pub base_signature: Vec<u8>,
    pub ephemeral_public_key: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
    pub label_map: Vec<(String, String)>,
    pub mandatory_pointers: Vec<String>,
}

pub(crate) fn decode_derived_proof(
    proof_value: &str,
) -> Result<DecodedDerivedProof, crate::error::CryptoError> {
    use crate::codec::{multibase_decode_expect, parse_cbor_tagged_array, SD_DERIVED_PROOF_TAG};
    let bytes = multibase_decode_expect(proof_value, multibase::Base::Base64Url)?;
    let (tag, items) = parse_cbor_tagged_array(&bytes)?;
    if tag != SD_DERIVED_PROOF_TAG || items.len() != 5 {
        return Err(crate::error::CryptoError::InvalidProofValue);
    }
    let as_sd = |e: SdError| {
        tracing::debug!(error = %e, "malformed ecdsa-sd-2023 derived proof");
        crate::error::CryptoError::InvalidProofValue
    };
    let base_signature = expect_bytes(&items[0]).map_err(as_sd)?;
    let ephemeral_public_key = expect_bytes(&items[1]).map_err(as_sd)?;
    let signatures = expect_byte_array(&items[2]).map_err(as_sd)?;
    let label_map = match &items[3] {
        CborValue::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair {
                CborValue::Array(kv) if kv.len() == 2 => {
                    match (&kv[0], &kv[1]) {
                        (CborValue::Text(k), CborValue::Text(v)) => Ok((k.clone(), v.clone())),
                        _ => Err(crate::error::CryptoError::InvalidProofValue),
                    }
                }
                _ => Err(crate::error::CryptoError::InvalidProofValue),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(crate::error::CryptoError::InvalidProofValue),
    };
    let mandatory_pointers = expect_text_array(&items[4]).map_err(as_sd)?;
    Ok(DecodedDerivedProof { base_signature, ephemeral_public_key, signatures, label_map, mandatory_pointers })
}

/// Peek the CBOR tag of a proof value without fully decoding its contents,
/// so a caller can dispatch between [`decode_base_proof`] and
/// [`decode_derived_proof`] (`spec.md` §4.7 "detected by CBOR tag").
pub(crate) fn proof_tag(proof_value: &str) -> Result<u64, crate::error::CryptoError> {
    use crate::codec::{multibase_decode_expect, parse_cbor_tagged_array};
    let bytes = multibase_decode_expect(proof_value, multibase::Base::Base64Url)?;
    let (tag, _) = parse_cbor_tagged_array(&bytes)?;
    Ok(tag)
}

fn cbor_label_map(pairs: &[(String, String)]) -> CborValue {
    CborValue::Array(
        pairs
            .iter()
            .map(|(k, v)| CborValue::Array(vec![CborValue::Text(k.clone()), CborValue::Text(v.clone())]))
            .collect(),
    )
}
