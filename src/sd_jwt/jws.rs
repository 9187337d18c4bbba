//! # Minimal Compact JWS
//!
//! Just enough JOSE to produce and parse the JWS that carries an SD-JWT's
//! always-disclosed payload (`spec.md` §4.2/§4.3): a three-segment
//! `header.payload.signature` compact serialization, base64url, no JWE, no
//! nested signing, no header parameter beyond `alg`/`kid`/`typ`.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;

use crate::error::{CryptoError, Error, SdError};
use crate::signer::{Signer, Verifier};

fn b64url(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

fn b64url_decode(s: &str) -> Result<Vec<u8>, SdError> {
    Base64UrlUnpadded::decode_vec(s).map_err(|_| SdError::Base64EncodedEmpty)
}

/// Produce a compact JWS over `payload`, signed by `signer`.
///
/// # Errors
/// Returns [`Error::Crypto`]([`CryptoError::SigningFailed`]) if signing
/// fails.
pub fn sign_compact(payload: &Value, typ: &str, signer: &dyn Signer) -> Result<String, Error> {
    let header = serde_json::json!({
        "alg": signer.algorithm().as_str(),
        "typ": typ,
        "kid": signer.key_id(),
    });
    let header_b64 = b64url(&serde_json::to_vec(&header).expect("header serializes"));
    let payload_b64 = b64url(&serde_json::to_vec(payload).expect("payload serializes"));
    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = signer.sign(signing_input.as_bytes()).map_err(Error::Crypto)?;
    Ok(format!("{signing_input}.{}", b64url(&signature)))
}

/// Verify a compact JWS produced by [`sign_compact`], returning its decoded
/// payload.
///
/// # Errors
/// Returns [`Error::Sd`]([`SdError::TokenNotValid`]) if the token is
/// malformed, or [`Error::Crypto`]([`CryptoError::VerificationFailed`]) if
/// the signature does not verify.
pub fn verify_compact(jws: &str, verifier: &dyn Verifier) -> Result<Value, Error> {
    let parts: Vec<&str> = jws.split('.').collect();
    let (header_b64, payload_b64, sig_b64) = match parts.as_slice() {
        [h, p, s] => (*h, *p, *s),
        _ => return Err(Error::Sd(SdError::TokenNotValid)),
    };
    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = b64url_decode(sig_b64).map_err(Error::Sd)?;
    verifier
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| Error::Crypto(CryptoError::VerificationFailed))?;
    let payload_bytes = b64url_decode(payload_b64).map_err(Error::Sd)?;
    serde_json::from_slice(&payload_bytes).map_err(|_| Error::Sd(SdError::TokenNotValid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::software::Ed25519Signer;

    #[test]
    fn round_trips() {
        let signer = Ed25519Signer::generate("issuer#key-1");
        let payload = serde_json::json!({"iss": "https://issuer.example", "sub": "subject-1"});
        let jws = sign_compact(&payload, "vc+sd-jwt", &signer).unwrap();
        let parsed = verify_compact(&jws, &signer.verifier()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signer = Ed25519Signer::generate("issuer#key-1");
        let payload = serde_json::json!({"iss": "https://issuer.example"});
        let jws = sign_compact(&payload, "vc+sd-jwt", &signer).unwrap();
        let mut parts: Vec<&str> = jws.split('.').collect();
        let tampered_payload = b64url(br#"{"iss":"https://attacker.example"}"#);
        parts[1] = &tampered_payload;
        let tampered = parts.join(".");
        assert!(verify_compact(&tampered, &signer.verifier()).is_err());
    }
}
