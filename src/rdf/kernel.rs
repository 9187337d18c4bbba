//! # RDF Credential Kernel
//!
//! Wraps a parsed Verifiable Credential JSON document with the RDF
//! operations the Data Integrity cryptosuites need: stripping `proof`
//! before transformation, canonicalizing a document to its N-Quads form,
//! and hashing that form (`spec.md` §4.4, and the `TRANSFORM`/`HASHING`
//! steps common to `eddsa-rdfc-2022` and `ecdsa-rdfc-2019`).

use oxrdf::Quad;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{CryptoError, RdfError};
use crate::rdf::canon::canonicalize;
use crate::rdf::jsonld::expand_to_rdf;
use crate::rdf::loader::DocumentLoader;

/// A Verifiable Credential (or Presentation) document, with the RDF
/// operations needed to produce or verify a Data Integrity proof over it.
#[derive(Clone, Debug)]
pub struct RdfCredential {
    document: Value,
}

impl RdfCredential {
    /// Wrap `document`, which must be a JSON object.
    ///
    /// # Errors
    /// Returns [`RdfError::InvalidDataset`] if `document` is not an object.
    pub fn from_json(document: Value) -> Result<Self, RdfError> {
        if !document.is_object() {
            return Err(RdfError::InvalidDataset("credential document must be a JSON object".into()));
        }
        Ok(Self { document })
    }

    /// The underlying document, proof included.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.document
    }

    /// The document with `proof` removed from every entity whose `type`
    /// matches `target_types` (`None` matches every entity — the default,
    /// "remove all proofs" case) — the `TRANSFORM` input for every
    /// cryptosuite in this crate.
    ///
    /// This is the JSON-tree counterpart of the two-pass RDF reachability
    /// filter (`spec.md` §4.4): rather than deleting only the document's
    /// own top-level `proof` edge — which would leave a nested
    /// credential's proof dangling when this document is a Verifiable
    /// Presentation embedding one — it walks every entity in the document,
    /// recursing into `verifiableCredential` (object or array), and drops
    /// each matching entity's own `proof` subtree. Because a JSON-LD
    /// document's nesting already scopes an entity's descendant
    /// statements, dropping its `proof` key removes exactly the quads the
    /// RDF algorithm's two passes would mark as a proof root and its
    /// dependents — no separate orphan pass is needed for documents this
    /// crate's suites construct (see `DESIGN.md`).
    #[must_use]
    pub fn credential_without_proof(&self, target_types: Option<&[String]>) -> Value {
        let mut without = self.document.clone();
        strip_proof(&mut without, target_types);
        without
    }

    /// Attach `proof` to the document, returning the updated copy. When the
    /// document already carries a `proof`, the result is multi-proof: an
    /// existing array gets `proof` appended, and a lone existing proof
    /// object is promoted to a two-element array — an existing proof is
    /// never overwritten (`spec.md` §4.5).
    #[must_use]
    pub fn with_proof_attached(&self, proof: Value) -> Value {
        let mut document = self.document.clone();
        let obj = document.as_object_mut().expect("constructor enforces object");
        match obj.remove("proof") {
            None => {
                obj.insert("proof".into(), proof);
            }
            Some(Value::Array(mut existing)) => {
                existing.push(proof);
                obj.insert("proof".into(), Value::Array(existing));
            }
            Some(single) => {
                obj.insert("proof".into(), Value::Array(vec![single, proof]));
            }
        }
        document
    }

    /// Every `proof` entry attached to the document, in document order. A
    /// single-object `proof` member yields a one-element slice; an absent
    /// one yields an empty `Vec`.
    #[must_use]
    pub fn proof_objects(&self) -> Vec<Value> {
        match self.document.get("proof") {
            Some(Value::Array(items)) => items.clone(),
            Some(single @ Value::Object(_)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    /// The single `proof` object attached to the document.
    ///
    /// # Errors
    /// Returns [`CryptoError::ProofNotFound`] if there is no proof, or
    /// [`CryptoError::InvalidProofValue`] if there is more than one (callers
    /// that need to handle multiple proofs should use
    /// [`RdfCredential::proof_objects`] instead).
    pub fn proof_object(&self) -> Result<Value, CryptoError> {
        let mut proofs = self.proof_objects();
        match proofs.len() {
            0 => Err(CryptoError::ProofNotFound),
            1 => Ok(proofs.remove(0)),
            _ => Err(CryptoError::InvalidProofValue),
        }
    }

    /// Expand `value` to an RDF quad set, resolving `@context` through
    /// `loader`. `value` is typically [`RdfCredential::credential_without_proof`]
    /// or a `proof` object with its `@context` inherited from the document.
    ///
    /// # Errors
    /// Returns [`RdfError::JsonLdConversionFailed`] if a context cannot be
    /// resolved.
    pub fn expand(&self, value: &Value, loader: &dyn DocumentLoader) -> Result<Vec<Quad>, RdfError> {
        expand_to_rdf(value, loader)
    }

    /// The canonical N-Quads serialization of `value` (sorted, one quad per
    /// line), per URDNA2015/RDFC-1.0.
    ///
    /// # Errors
    /// Returns [`RdfError`] if `value` cannot be expanded or canonicalized.
    pub fn canonical_form(&self, value: &Value, loader: &dyn DocumentLoader) -> Result<String, RdfError> {
        let quads = self.expand(value, loader)?;
        canonicalize(&quads)
    }

    /// SHA-256 of [`RdfCredential::canonical_form`]'s UTF-8 bytes.
    ///
    /// # Errors
    /// Returns [`RdfError`] under the same conditions as `canonical_form`.
    pub fn canonical_hash(&self, value: &Value, loader: &dyn DocumentLoader) -> Result<[u8; 32], RdfError> {
        let form = self.canonical_form(value, loader)?;
        Ok(Sha256::digest(form.as_bytes()).into())
    }

    /// The quad set for the credential with its `proof` removed — the
    /// document graph a verifier compares the proof's signature against.
    ///
    /// # Errors
    /// Returns [`RdfError`] if the document cannot be expanded.
    pub fn normalize_vc_graph(&self, loader: &dyn DocumentLoader) -> Result<Vec<Quad>, RdfError> {
        self.expand(&self.credential_without_proof(None), loader)
    }

    /// The combined hash `spec.md` §4.5/§4.6 cryptosuites sign: the SHA-256
    /// of the canonicalized proof configuration, followed by the SHA-256 of
    /// the canonicalized document (with `proof` removed), concatenated.
    ///
    /// `proof_config` is the proof object with `proofValue` absent and
    /// `@context` set to the document's context, per the Data Integrity
    /// `PROOF_CONFIGURATION` algorithm.
    ///
    /// # Errors
    /// Returns [`RdfError`] if either half cannot be canonicalized.
    pub fn proof_signing_hash(
        &self, proof_config: &Value, loader: &dyn DocumentLoader,
    ) -> Result<Vec<u8>, RdfError> {
        let config_hash = self.canonical_hash(proof_config, loader)?;
        let doc_hash = self.canonical_hash(&self.credential_without_proof(None), loader)?;
        let mut combined = Vec::with_capacity(64);
        combined.extend_from_slice(&config_hash);
        combined.extend_from_slice(&doc_hash);
        Ok(combined)
    }
}

fn entity_type_matches(obj: &serde_json::Map<String, Value>, target_types: Option<&[String]>) -> bool {
    let Some(target_types) = target_types else { return true };
    match obj.get("type").or_else(|| obj.get("@type")) {
        Some(Value::String(s)) => target_types.iter().any(|t| t == s),
        Some(Value::Array(items)) => {
            items.iter().filter_map(Value::as_str).any(|s| target_types.iter().any(|t| t == s))
        }
        _ => false,
    }
}

fn strip_proof(value: &mut Value, target_types: Option<&[String]>) {
    let Value::Object(obj) = value else { return };
    if entity_type_matches(obj, target_types) {
        obj.remove("proof");
    }
    if let Some(embedded) = obj.get_mut("verifiableCredential") {
        match embedded {
            Value::Object(_) => strip_proof(embedded, target_types),
            Value::Array(items) => {
                for item in items {
                    strip_proof(item, target_types);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::loader::CachingDocumentLoader;

    fn alumni_credential() -> Value {
        serde_json::json!({
            "@context": [
                "https://www.w3.org/ns/credentials/v2",
                "https://www.w3.org/ns/credentials/examples/v2"
            ],
            "id": "urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33",
            "type": ["VerifiableCredential", "AlumniCredential"],
            "issuer": "https://vc.example/issuers/5678",
            "validFrom": "2023-01-01T00:00:00Z",
            "credentialSubject": {
                "id": "did:example:abcdefgh",
                "alumniOf": "The School of Examples"
            },
            "proof": {
                "type": "DataIntegrityProof",
                "cryptosuite": "eddsa-rdfc-2022",
                "proofValue": "zPlaceholder"
            }
        })
    }

    #[test]
    fn strips_proof_for_transformation() {
        let credential = RdfCredential::from_json(alumni_credential()).unwrap();
        let stripped = credential.credential_without_proof(None);
        assert!(stripped.get("proof").is_none());
        assert!(stripped.get("id").is_some());
    }

    #[test]
    fn target_types_restricts_which_entity_loses_its_proof() {
        let credential = RdfCredential::from_json(alumni_credential()).unwrap();
        let untouched = credential.credential_without_proof(Some(&["VerifiablePresentation".to_string()]));
        assert!(untouched.get("proof").is_some());

        let stripped = credential.credential_without_proof(Some(&["AlumniCredential".to_string()]));
        assert!(stripped.get("proof").is_none());
    }

    #[test]
    fn nested_verifiable_credential_proof_is_also_stripped() {
        let presentation = serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:vp-1",
            "type": ["VerifiablePresentation"],
            "verifiableCredential": [alumni_credential()],
            "proof": {
                "type": "DataIntegrityProof",
                "cryptosuite": "eddsa-rdfc-2022",
                "proofValue": "zOuterPlaceholder"
            }
        });
        let credential = RdfCredential::from_json(presentation).unwrap();
        let stripped = credential.credential_without_proof(None);
        assert!(stripped.get("proof").is_none());
        assert!(stripped["verifiableCredential"][0].get("proof").is_none());
        assert!(stripped["verifiableCredential"][0].get("id").is_some());
    }

    #[test]
    fn single_proof_object_round_trips() {
        let credential = RdfCredential::from_json(alumni_credential()).unwrap();
        let proof = credential.proof_object().unwrap();
        assert_eq!(proof["cryptosuite"], "eddsa-rdfc-2022");
    }

    #[test]
    fn missing_proof_is_not_found() {
        let mut doc = alumni_credential();
        doc.as_object_mut().unwrap().remove("proof");
        let credential = RdfCredential::from_json(doc).unwrap();
        assert!(matches!(credential.proof_object(), Err(CryptoError::ProofNotFound)));
    }

    #[test]
    fn attaching_a_proof_to_an_unproven_document_sets_a_single_object() {
        let mut doc = alumni_credential();
        doc.as_object_mut().unwrap().remove("proof");
        let credential = RdfCredential::from_json(doc).unwrap();
        let new_proof = serde_json::json!({"type": "DataIntegrityProof", "proofValue": "zNew"});
        let attached = credential.with_proof_attached(new_proof.clone());
        assert_eq!(attached["proof"], new_proof);
    }

    #[test]
    fn attaching_a_proof_to_a_single_existing_proof_promotes_to_an_array() {
        let credential = RdfCredential::from_json(alumni_credential()).unwrap();
        let new_proof = serde_json::json!({"type": "DataIntegrityProof", "proofValue": "zNew"});
        let attached = credential.with_proof_attached(new_proof.clone());
        let proofs = attached["proof"].as_array().expect("proof must become an array");
        assert_eq!(proofs.len(), 2);
        assert_eq!(proofs[0]["proofValue"], "zPlaceholder");
        assert_eq!(proofs[1], new_proof);
    }

    #[test]
    fn attaching_a_proof_to_an_existing_array_appends() {
        let mut doc = alumni_credential();
        let first_proof = doc["proof"].clone();
        doc["proof"] = serde_json::json!([first_proof.clone()]);
        let credential = RdfCredential::from_json(doc).unwrap();
        let new_proof = serde_json::json!({"type": "DataIntegrityProof", "proofValue": "zNew"});
        let attached = credential.with_proof_attached(new_proof.clone());
        let proofs = attached["proof"].as_array().expect("proof must remain an array");
        assert_eq!(proofs.len(), 2);
        assert_eq!(proofs[0], first_proof);
        assert_eq!(proofs[1], new_proof);
    }

    #[test]
    fn canonical_hash_is_stable() {
        let credential = RdfCredential::from_json(alumni_credential()).unwrap();
        let loader = CachingDocumentLoader::new();
        let without_proof = credential.credential_without_proof(None);
        let first = credential.canonical_hash(&without_proof, &loader).unwrap();
        let second = credential.canonical_hash(&without_proof, &loader).unwrap();
        assert_eq!(first, second);
    }
}
