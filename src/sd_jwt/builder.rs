//! # SD-JWT Builder
//!
//! Turns a claim [`Instruction`] tree plus issuance config into a signed
//! JWT and an ordered [`Disclosure`] list (`spec.md` §4.2).

use base64ct::{Base64UrlUnpadded, Encoding};
use rand_core::{OsRng, RngCore};
use serde_json::{Map, Value};

use super::disclosure::Disclosure;
use super::instruction::Instruction;
use super::jws;
use crate::error::{Error, SdError};
use crate::signer::Signer;

/// Standard SD-JWT claims injected after the instruction tree is built.
#[derive(Clone, Debug)]
pub struct SdJwtClaims {
    /// `iss`: the issuer identifier.
    pub iss: String,
    /// `vct`: the verifiable credential type.
    pub vct: String,
    /// `nbf`: not-before, Unix seconds.
    pub nbf: Option<i64>,
    /// `exp`: expiry, Unix seconds.
    pub exp: Option<i64>,
    /// `cnf`: holder key-binding confirmation claim.
    pub cnf: Option<Value>,
}

/// The result of building an SD-JWT: the compact JWS and every disclosure
/// produced while walking the instruction tree, sorted lexicographically by
/// disclosure hash so their order does not leak construction order
/// (`spec.md` §4.2).
#[derive(Clone, Debug)]
pub struct BuiltSdJwt {
    pub jws: String,
    pub disclosures: Vec<Disclosure>,
}

impl BuiltSdJwt {
    /// The presentation prefix `<jwt>~d1~…~dn~`, always ending in `~`
    /// regardless of disclosure count — the exact input a Key-Binding JWT's
    /// `sd_hash` claim is computed over.
    #[must_use]
    pub fn signing_input(&self) -> String {
        let mut out = self.jws.clone();
        for disclosure in &self.disclosures {
            out.push('~');
            out.push_str(&disclosure.encode());
        }
        out.push('~');
        out
    }

    /// The `~`-joined presentation wire form with no key binding. When there
    /// are no disclosures the trailing `~` is omitted entirely, leaving a
    /// bare JWT (`spec.md` §6 wire format).
    #[must_use]
    pub fn to_presentation(&self) -> String {
        self.to_presentation_with_key_binding(None)
    }

    /// The `~`-joined presentation wire form, optionally appending a signed
    /// Key-Binding JWT as the final segment. The trailing `~` is omitted
    /// only when there are no disclosures and no key binding; a key binding
    /// always keeps the `~` immediately before it.
    #[must_use]
    pub fn to_presentation_with_key_binding(&self, key_binding_jwt: Option<&str>) -> String {
        if self.disclosures.is_empty() && key_binding_jwt.is_none() {
            return self.jws.clone();
        }
        let mut out = self.signing_input();
        if let Some(kb) = key_binding_jwt {
            out.push_str(kb);
        }
        out
    }
}

fn random_salt() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Build a disclosure for `node` and return its claim hash, for use by an
/// enclosing `_sd` array or a [`Instruction::Recursive`] parent.
fn disclose_node(node: &Instruction, disclosures: &mut Vec<Disclosure>) -> Result<String, Error> {
    match node {
        Instruction::Child { name, value, .. } => {
            let disclosure = Disclosure::object(random_salt(), name.clone(), value.clone());
            let hash = disclosure.digest();
            disclosures.push(disclosure);
            Ok(hash)
        }
        Instruction::Parent { name, children, .. } => {
            let nested = build_object(children, disclosures)?;
            let disclosure = Disclosure::object(random_salt(), name.clone(), Value::Object(nested));
            let hash = disclosure.digest();
            disclosures.push(disclosure);
            Ok(hash)
        }
        Instruction::Recursive { name, children, .. } => {
            let mut child_hashes: Vec<String> =
                children.iter().map(|child| disclose_node(child, disclosures)).collect::<Result<_, _>>()?;
            child_hashes.sort_unstable();
            let body = serde_json::json!({ "_sd": child_hashes });
            let disclosure = Disclosure::object(random_salt(), name.clone(), body);
            let hash = disclosure.digest();
            disclosures.push(disclosure);
            Ok(hash)
        }
        Instruction::ChildArray { .. } | Instruction::ParentArray { .. } => {
            Err(Error::Sd(SdError::NotKnownInstruction))
        }
    }
}

fn build_array_leaf(
    children: &[super::instruction::ArrayElement], disclosures: &mut Vec<Disclosure>,
) -> Vec<Value> {
    children
        .iter()
        .map(|element| {
            if element.selective_disclosure {
                let disclosure = Disclosure::array_element(random_salt(), element.value.clone());
                let hash = disclosure.digest();
                disclosures.push(disclosure);
                serde_json::json!({ "...": hash })
            } else {
                element.value.clone()
            }
        })
        .collect()
}

fn build_object(children: &[Instruction], disclosures: &mut Vec<Disclosure>) -> Result<Map<String, Value>, Error> {
    let mut map = Map::new();
    let mut sd_hashes = Vec::new();

    for child in children {
        match child {
            Instruction::Child { name, value, selective_disclosure, .. } => {
                if *selective_disclosure {
                    sd_hashes.push(disclose_node(child, disclosures)?);
                } else {
                    map.insert(name.clone(), value.clone());
                }
            }
            Instruction::Parent { name, children: inner, selective_disclosure } => {
                if *selective_disclosure {
                    sd_hashes.push(disclose_node(child, disclosures)?);
                } else {
                    let nested = build_object(inner, disclosures)?;
                    map.insert(name.clone(), Value::Object(nested));
                }
            }
            Instruction::Recursive { .. } => {
                sd_hashes.push(disclose_node(child, disclosures)?);
            }
            Instruction::ChildArray { name, children: elements } => {
                map.insert(name.clone(), Value::Array(build_array_leaf(elements, disclosures)));
            }
            Instruction::ParentArray { name, children: objects } => {
                let mut array = Vec::with_capacity(objects.len());
                for object_children in objects {
                    array.push(Value::Object(build_object(object_children, disclosures)?));
                }
                map.insert(name.clone(), Value::Array(array));
            }
        }
    }

    if !sd_hashes.is_empty() {
        map.insert("_sd".into(), Value::Array(sd_hashes.into_iter().map(Value::String).collect()));
    }
    Ok(map)
}

/// Build a signed SD-JWT from `tree`, injecting `claims` and signing the
/// payload with `signer` (`spec.md` §4.2).
///
/// # Errors
/// Returns [`Error::Sd`]([`SdError::NotKnownInstruction`]) if the root tree
/// contains an array-typed node (arrays may only appear nested under an
/// object), or [`Error::Crypto`] if signing fails.
#[tracing::instrument(skip(tree, claims, signer))]
pub fn build(tree: &[Instruction], claims: &SdJwtClaims, signer: &dyn Signer) -> Result<BuiltSdJwt, Error> {
    let mut disclosures = Vec::new();
    let mut payload = build_object(tree, &mut disclosures)?;

    payload.insert("_sd_alg".into(), Value::String("sha-256".into()));
    payload.insert("iss".into(), Value::String(claims.iss.clone()));
    payload.insert("vct".into(), Value::String(claims.vct.clone()));
    if let Some(nbf) = claims.nbf {
        payload.insert("nbf".into(), Value::Number(nbf.into()));
    }
    if let Some(exp) = claims.exp {
        payload.insert("exp".into(), Value::Number(exp.into()));
    }
    if let Some(cnf) = &claims.cnf {
        payload.insert("cnf".into(), cnf.clone());
    }

    let jws = jws::sign_compact(&Value::Object(payload), "sd-jwt", signer)?;
    disclosures.sort_by(|a, b| a.encode().cmp(&b.encode()));
    tracing::debug!(disclosures = disclosures.len(), "built sd-jwt");
    Ok(BuiltSdJwt { jws, disclosures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::software::Ed25519Signer;

    fn claims() -> SdJwtClaims {
        SdJwtClaims {
            iss: "https://issuer.example".into(),
            vct: "https://credentials.example/diploma".into(),
            nbf: Some(1_700_000_000),
            exp: Some(1_800_000_000),
            cnf: None,
        }
    }

    #[test]
    fn two_children_one_parent_disclosure_shape() {
        let tree = vec![Instruction::parent(
            "parent_a",
            vec![Instruction::parent(
                "parent_b",
                vec![
                    Instruction::selective_child("child_a", Value::String("test".into())),
                    Instruction::selective_child("child_b", Value::String("test".into())),
                ],
            )],
        )];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        assert_eq!(built.disclosures.len(), 2);
        for disclosure in &built.disclosures {
            assert_eq!(disclosure.value, Value::String("test".into()));
        }
    }

    #[test]
    fn recursive_nesting_produces_one_root_hash_and_four_disclosures() {
        let tree = vec![Instruction::recursive(
            "parent_a",
            vec![Instruction::recursive(
                "parent_b",
                vec![
                    Instruction::child("child_b1", Value::String("test_b1".into())),
                    Instruction::child("child_b2", Value::String("test_b2".into())),
                ],
            )],
        )];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        assert_eq!(built.disclosures.len(), 4);

        let payload = jws::verify_compact(&built.jws, &signer.verifier()).unwrap();
        let root_sd = payload["_sd"].as_array().unwrap();
        assert_eq!(root_sd.len(), 1);
    }

    #[test]
    fn plain_child_is_inlined_not_disclosed() {
        let tree = vec![Instruction::child("alumniOf", Value::String("Example U".into()))];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        assert!(built.disclosures.is_empty());
        let payload = jws::verify_compact(&built.jws, &signer.verifier()).unwrap();
        assert_eq!(payload["alumniOf"], Value::String("Example U".into()));
    }

    #[test]
    fn presentation_wire_form_has_trailing_tilde_without_key_binding() {
        let tree = vec![Instruction::selective_child("given_name", Value::String("Sam".into()))];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        assert!(built.to_presentation().ends_with('~'));
    }

    #[test]
    fn presentation_with_no_disclosures_omits_trailing_tilde() {
        let tree = vec![Instruction::child("issuer", Value::String("https://vc.example".into()))];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        assert!(built.disclosures.is_empty());
        let presentation = built.to_presentation();
        assert_eq!(presentation, built.jws);
        assert!(!presentation.ends_with('~'));
    }

    #[test]
    fn key_binding_jwt_is_appended_without_trailing_tilde() {
        let tree = vec![Instruction::child("issuer", Value::String("https://vc.example".into()))];
        let signer = Ed25519Signer::generate("issuer#key-1");
        let built = build(&tree, &claims(), &signer).unwrap();
        let presentation = built.to_presentation_with_key_binding(Some("kb-jwt-stub"));
        assert_eq!(presentation, format!("{}~kb-jwt-stub", built.jws));
    }
}
