//! # Key Binding (`cnf` claim and Key-Binding JWT)
//!
//! The holder's public key, bound into an SD-JWT's `cnf` claim at issuance,
//! confirmed at presentation time by a Key-Binding JWT the holder signs over
//! the presentation's `sd_hash` (`spec.md` §3, §6 wire format).

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use super::builder::BuiltSdJwt;
use super::jws;
use crate::error::Error;
use crate::signer::Signer;

/// The holder's public key, carried in the `cnf` claim at issuance.
#[derive(Clone, Debug)]
pub struct KeyBinding {
    /// The holder's public key as a JWK.
    pub jwk: Value,
}

impl KeyBinding {
    /// Wrap a JWK as a `cnf` confirmation claim.
    #[must_use]
    pub fn new(jwk: Value) -> Self {
        Self { jwk }
    }

    /// The `cnf` claim value: `{"jwk": <jwk>}`.
    #[must_use]
    pub fn to_cnf_claim(&self) -> Value {
        json!({ "jwk": self.jwk })
    }
}

/// Claims carried by a Key-Binding JWT, signed by the holder at presentation
/// time.
#[derive(Clone, Debug)]
pub struct KeyBindingClaims {
    /// `aud`: the verifier this presentation is made to.
    pub aud: String,
    /// `nonce`: a fresh, verifier-supplied anti-replay value.
    pub nonce: String,
    /// `iat`: Unix seconds the holder signed at.
    pub iat: i64,
}

/// SHA-256 of `input`'s UTF-8 bytes, base64url-no-pad encoded — the
/// `sd_hash` claim value.
#[must_use]
pub fn sd_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}

/// Build and sign a Key-Binding JWT over `built`'s presentation prefix
/// (`<jwt>~d1~…~dn~`), for a holder to append as the wire format's final
/// segment via [`BuiltSdJwt::to_presentation_with_key_binding`].
///
/// # Errors
/// Returns [`Error::Crypto`] if `signer` fails to sign.
#[tracing::instrument(skip(built, claims, signer))]
pub fn build_key_binding_jwt(
    built: &BuiltSdJwt, claims: &KeyBindingClaims, signer: &dyn Signer,
) -> Result<String, Error> {
    let hash = sd_hash(&built.signing_input());
    let payload = json!({
        "aud": claims.aud,
        "nonce": claims.nonce,
        "iat": claims.iat,
        "sd_hash": hash,
    });
    jws::sign_compact(&payload, "kb+jwt", signer)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::sd_jwt::builder::{build, SdJwtClaims};
    use crate::sd_jwt::instruction::Instruction;
    use crate::signer::software::Ed25519Signer;

    #[test]
    fn key_binding_jwt_attaches_as_final_segment() {
        let tree = vec![Instruction::selective_child("given_name", Value::String("Sam".into()))];
        let issuer_signer = Ed25519Signer::generate("issuer#key-1");
        let holder_signer = Ed25519Signer::generate("holder#key-1");
        let sd_claims = SdJwtClaims {
            iss: "https://issuer.example".into(),
            vct: "https://credentials.example/diploma".into(),
            nbf: None,
            exp: None,
            cnf: Some(KeyBinding::new(json!({"kty": "OKP"})).to_cnf_claim()),
        };
        let built = build(&tree, &sd_claims, &issuer_signer).unwrap();

        let kb_claims =
            KeyBindingClaims { aud: "https://verifier.example".into(), nonce: "n-1".into(), iat: 1_700_000_000 };
        let kb_jwt = build_key_binding_jwt(&built, &kb_claims, &holder_signer).unwrap();

        let presentation = built.to_presentation_with_key_binding(Some(&kb_jwt));
        assert!(presentation.ends_with(&kb_jwt));
        assert!(!presentation.ends_with('~'));
        assert!(presentation.contains(&format!("~{kb_jwt}")));
    }

    #[test]
    fn sd_hash_is_stable_for_same_input() {
        assert_eq!(sd_hash("abc"), sd_hash("abc"));
        assert_ne!(sd_hash("abc"), sd_hash("abd"));
    }
}
