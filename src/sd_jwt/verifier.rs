//! # SD-JWT Verifier
//!
//! Verifies a `~`-joined SD-JWT presentation and flattens it back into its
//! full claim set, omitting whatever the holder withheld (`spec.md` §4.3).
//! Stateless: no caches, no persisted state between calls.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::disclosure::Disclosure;
use super::jws;
use crate::error::{Error, SdError};
use crate::signer::Verifier;

/// The outcome of a successfully verified SD-JWT presentation.
///
/// `signature_policy` is always [`SignaturePolicy::Passed`] here: a
/// presentation that fails cryptographic verification never produces a
/// [`VerifiedSdJwt`] at all, it produces an `Err`. There is no placeholder
/// "unverified" variant — `spec.md`'s redesign notes call out exactly this
/// as a defect in the source this crate was modeled on.
#[derive(Clone, Debug)]
pub struct VerifiedSdJwt {
    /// The flattened claim set: always-visible claims plus every disclosed
    /// selectively-disclosable claim, with `_sd`/`_sd_alg` bookkeeping keys
    /// removed.
    pub claims: Value,
    /// Always [`SignaturePolicy::Passed`] for a value that exists at all.
    pub signature_policy: SignaturePolicy,
    /// The raw key-binding JWT, if the presentation carried one. Verifying
    /// it is the caller's responsibility — this crate's SD-JWT verifier
    /// only establishes the issuer-signed claim set.
    pub key_binding: Option<String>,
}

/// Whether the issuer JWT signature was cryptographically verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// The signature verified successfully.
    Passed,
}

fn resolve_value(value: &Value, index: &HashMap<String, &Disclosure>) -> Value {
    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, inner) in map {
                if key == "_sd" || key == "_sd_alg" {
                    continue;
                }
                result.insert(key.clone(), resolve_value(inner, index));
            }
            if let Some(Value::Array(hashes)) = map.get("_sd") {
                for hash in hashes {
                    let Value::String(hash) = hash else { continue };
                    if let Some(disclosure) = index.get(hash.as_str()) {
                        if let Some(name) = &disclosure.name {
                            result.insert(name.clone(), resolve_value(&disclosure.value, index));
                        }
                    }
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) if map.len() == 1 => match map.get("...") {
                        Some(Value::String(hash)) => {
                            index.get(hash.as_str()).map(|d| resolve_value(&d.value, index))
                        }
                        _ => Some(resolve_value(item, index)),
                    },
                    other => Some(resolve_value(other, index)),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Verify an SD-JWT presentation string (`jwt~d1~…~dn~[key_binding]`)
/// against `verifier`, returning the flattened, disclosed claim set.
///
/// # Errors
/// Returns [`Error::Sd`]([`SdError::TokenNotValid`]) if the presentation is
/// malformed or a disclosure fails to decode, or [`Error::Crypto`] if the
/// JWT signature does not verify.
#[tracing::instrument(skip(presentation, verifier))]
pub fn verify_presentation(presentation: &str, verifier: &dyn Verifier) -> Result<VerifiedSdJwt, Error> {
    let mut segments = presentation.split('~');
    let jwt = segments.next().ok_or(Error::Sd(SdError::TokenNotValid))?;
    let rest: Vec<&str> = segments.collect();
    let (disclosure_segments, key_binding): (&[&str], Option<String>) = match rest.split_last() {
        Some((last, init)) if !last.is_empty() => (init, Some((*last).to_string())),
        Some((_, init)) => (init, None),
        None => (&[], None),
    };

    let payload = jws::verify_compact(jwt, verifier)?;

    let disclosures: Vec<Disclosure> =
        disclosure_segments.iter().map(|raw| Disclosure::decode(raw)).collect::<Result<_, _>>().map_err(Error::Sd)?;
    let index: HashMap<String, &Disclosure> =
        disclosures.iter().map(|d| (d.digest(), d)).collect();

    let claims = resolve_value(&payload, &index);
    tracing::debug!(disclosures = disclosures.len(), "verified sd-jwt presentation");
    Ok(VerifiedSdJwt { claims, signature_policy: SignaturePolicy::Passed, key_binding })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sd_jwt::builder::{build, SdJwtClaims};
    use crate::sd_jwt::instruction::Instruction;
    use crate::signer::software::Ed25519Signer;

    fn claims() -> SdJwtClaims {
        SdJwtClaims {
            iss: "https://issuer.example".into(),
            vct: "https://credentials.example/diploma".into(),
            nbf: None,
            exp: None,
            cnf: None,
        }
    }

    #[test]
    fn reveals_every_disclosed_claim() {
        let tree = vec![
            Instruction::child("issuer", Value::String("https://vc.example".into())),
            Instruction::selective_child("alumniOf", Value::String("Example U".into())),
        ];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        let presentation = built.to_presentation();

        let verified = verify_presentation(&presentation, &signer.verifier()).unwrap();
        assert_eq!(verified.claims["issuer"], Value::String("https://vc.example".into()));
        assert_eq!(verified.claims["alumniOf"], Value::String("Example U".into()));
        assert!(verified.claims.get("_sd").is_none());
        assert!(verified.claims.get("_sd_alg").is_none());
    }

    #[test]
    fn withheld_disclosure_is_silently_omitted() {
        let tree = vec![
            Instruction::selective_child("alumniOf", Value::String("Example U".into())),
            Instruction::selective_child("degree", Value::String("BSc".into())),
        ];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();

        let jwt_only = built.jws.clone();
        let only_one_disclosure = format!("{jwt_only}~{}~", built.disclosures[0].encode());

        let verified = verify_presentation(&only_one_disclosure, &signer.verifier()).unwrap();
        assert!(verified.claims.get("alumniOf").is_some() ^ verified.claims.get("degree").is_some());
    }

    #[test]
    fn recursive_subtree_is_fully_reconstructed() {
        let tree = vec![Instruction::recursive(
            "parent_a",
            vec![Instruction::child("child_a", Value::String("test".into()))],
        )];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        let presentation = built.to_presentation();

        let verified = verify_presentation(&presentation, &signer.verifier()).unwrap();
        assert_eq!(verified.claims["parent_a"]["child_a"], Value::String("test".into()));
    }

    #[test]
    fn tampered_jwt_is_rejected() {
        let tree = vec![Instruction::child("issuer", Value::String("https://vc.example".into()))];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        let tampered_jws = format!("{}tampered", built.jws);
        let presentation = format!("{tampered_jws}~");
        assert!(verify_presentation(&presentation, &signer.verifier()).is_err());
    }
}
