//! # `ecdsa-sd-2023` Derived Proof (Holder Side)

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use super::select::{mandatory_indexes, select_indexes};
use super::{cbor_byte_array, cbor_bytes, cbor_label_map, cbor_text_array, decode_base_proof, hmac_relabel};
use crate::codec::{cbor_tagged_array, multibase_base64url, SD_DERIVED_PROOF_TAG};
use crate::error::{Error, SdError};
use crate::rdf::canon::canonical_label_map;
use crate::rdf::jsonld::resolve_context;
use crate::rdf::kernel::RdfCredential;
use crate::rdf::loader::DocumentLoader;
use crate::rdf::term::{blank_labels_in, relabel_quad};

/// Pointers (parent prefixes, root included) whose ancestor `rdf:type`
/// quads are mandatory — the JSON-side counterpart to
/// [`super::select::ancestor_type_indexes`], so a `type`/`@type` key
/// survives redaction exactly where its quad was kept mandatory.
fn ancestor_pointers(pointer: &str) -> Vec<String> {
    let trimmed = match pointer.strip_prefix('/') {
        Some(t) if !t.is_empty() => t,
        _ => return vec![String::new()],
    };
    let segments: Vec<&str> = trimmed.split('/').collect();
    let mut out = vec![String::new()];
    let mut acc = String::new();
    for seg in &segments[..segments.len() - 1] {
        acc.push('/');
        acc.push_str(seg);
        out.push(acc.clone());
    }
    out
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn redact_value(
    value: &Value, pointer: &str, revealed: &BTreeSet<String>, type_required_at: &BTreeSet<String>,
) -> Option<Value> {
    if revealed.contains(pointer) {
        return Some(value.clone());
    }
    let Value::Object(obj) = value else { return None };
    let mut kept = serde_json::Map::new();
    for (key, child) in obj {
        if key == "id" || key == "@id" || key == "@context" {
            kept.insert(key.clone(), child.clone());
            continue;
        }
        if (key == "type" || key == "@type") && type_required_at.contains(pointer) {
            kept.insert(key.clone(), child.clone());
            continue;
        }
        let child_pointer = format!("{pointer}/{}", escape_segment(key));
        if let Some(redacted_child) = redact_value(child, &child_pointer, revealed, type_required_at) {
            kept.insert(key.clone(), redacted_child);
        }
    }
    Some(Value::Object(kept))
}

/// Redact `document` down to its mandatory statements plus whatever
/// `revealed_pointers` additionally selects, walking the whole document
/// rather than assuming `credentialSubject` is the only redactable
/// container (`spec.md` §4.7 steps 8-13).
fn redact_document(document: &Value, mandatory_pointers: &[String], revealed_pointers: &BTreeSet<String>) -> Value {
    let mut type_required_at: BTreeSet<String> = BTreeSet::new();
    for pointer in mandatory_pointers {
        type_required_at.extend(ancestor_pointers(pointer));
    }
    redact_value(document, "", revealed_pointers, &type_required_at).unwrap_or_else(|| document.clone())
}

/// Derive a selectively-disclosed presentation of `credential`, revealing
/// every mandatory statement plus whatever `reveal_pointers` additionally
/// select (`spec.md` §4.7 steps 8-13).
///
/// `credential` must carry the unredacted base proof produced by
/// [`super::base::create_base_proof`]; the returned document is the
/// redacted credential with a fresh `proof` whose `proofValue` carries the
/// derived, selectively-revealing proof.
///
/// # Errors
/// Returns [`Error::Crypto`] if the base proof cannot be decoded,
/// [`Error::Sd`] if a pointer in `reveal_pointers` cannot be resolved, or
/// [`Error::Rdf`] if canonicalization fails.
#[tracing::instrument(skip(credential, loader))]
pub fn derive_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, reveal_pointers: &[String],
) -> Result<Value, Error> {
    let base_proof = credential.proof_object().map_err(Error::Crypto)?;
    let Some(Value::String(proof_value)) = base_proof.get("proofValue") else {
        return Err(Error::Crypto(crate::error::CryptoError::InvalidProofValue));
    };
    let decoded = decode_base_proof(proof_value).map_err(Error::Crypto)?;

    let document = credential.credential_without_proof(None);
    let quads = credential.expand(&document, loader)?;
    let context = resolve_context(document.get("@context"), loader)?;

    let label_map = canonical_label_map(&quads)?;
    let canonical_quads: Vec<_> = quads.iter().map(|q| relabel_quad(q, &label_map)).collect();
    let hmac_quads = hmac_relabel(&canonical_quads, &decoded.hmac_key);

    let mandatory_indexes: BTreeSet<usize> =
        mandatory_indexes(&document, &decoded.mandatory_pointers, &quads, &context);
    let non_mandatory_indexes: Vec<usize> =
        (0..quads.len()).filter(|i| !mandatory_indexes.contains(i)).collect();
    if non_mandatory_indexes.len() != decoded.signatures.len() {
        return Err(Error::Crypto(crate::error::CryptoError::InvalidProofValue));
    }

    let mut selected_indexes: BTreeSet<usize> = mandatory_indexes.clone();
    for pointer in reveal_pointers {
        for idx in select_indexes(&document, pointer, &quads, &context)
            .map_err(|_| Error::Sd(SdError::InvalidSelection(pointer.clone())))?
        {
            selected_indexes.insert(idx);
        }
    }

    let filtered_signatures: Vec<Vec<u8>> = non_mandatory_indexes
        .iter()
        .zip(&decoded.signatures)
        .filter(|(idx, _)| selected_indexes.contains(idx))
        .map(|(_, sig)| sig.clone())
        .collect();

    let revealed_quads: Vec<_> = selected_indexes.iter().map(|&i| hmac_quads[i].clone()).collect();

    let mut hmac_labels = BTreeSet::new();
    for quad in &revealed_quads {
        hmac_labels.extend(blank_labels_in(quad));
    }
    let compact_map: HashMap<String, String> = hmac_labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| (label, format!("b{i}")))
        .collect();
    let label_pairs: Vec<(String, String)> = compact_map.into_iter().collect();

    let reveal_set: BTreeSet<String> = decoded
        .mandatory_pointers
        .iter()
        .chain(reveal_pointers)
        .cloned()
        .collect();
    let redacted_document = redact_document(&document, &decoded.mandatory_pointers, &reveal_set);

    let cbor_array = vec![
        cbor_bytes(&decoded.base_signature),
        cbor_bytes(&decoded.ephemeral_public_key),
        cbor_byte_array(&filtered_signatures),
        cbor_label_map(&label_pairs),
        cbor_text_array(&decoded.mandatory_pointers),
    ];
    let bytes = cbor_tagged_array(SD_DERIVED_PROOF_TAG, cbor_array).map_err(Error::Crypto)?;
    let derived_proof_value = multibase_base64url(&bytes);

    let mut derived_proof = base_proof;
    derived_proof
        .as_object_mut()
        .expect("proof is an object")
        .insert("proofValue".into(), Value::String(derived_proof_value));

    let mut result = redacted_document;
    result
        .as_object_mut()
        .expect("document is an object")
        .insert("proof".into(), derived_proof);
    tracing::debug!(revealed = selected_indexes.len(), "derived ecdsa-sd-2023 presentation");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::loader::CachingDocumentLoader;
    use crate::signer::software::EcdsaP256Signer;
    use crate::suites::ecdsa_sd_2023::base::{create_base_proof, SdProofOptions};

    fn credential() -> RdfCredential {
        RdfCredential::from_json(serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:1",
            "type": ["VerifiableCredential"],
            "issuer": "https://vc.example/issuers/1",
            "validFrom": "2023-01-01T00:00:00Z",
            "credentialSubject": {
                "id": "did:example:subject",
                "alumniOf": "Example U",
                "degree": "Bachelor of Science"
            }
        }))
        .unwrap()
    }

    #[test]
    fn derived_presentation_redacts_unselected_properties() {
        let loader = CachingDocumentLoader::new();
        let signer = EcdsaP256Signer::generate("did:example:issuer#key-1");
        let options = SdProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: None,
            challenge: None,
            domain: None,
            mandatory_pointers: vec!["/issuer".into()],
        };
        let base_credential = credential();
        let base_proof = create_base_proof(&base_credential, &loader, &options, &signer).unwrap();
        let mut with_proof = base_credential.as_value().clone();
        with_proof.as_object_mut().unwrap().insert("proof".into(), base_proof);
        let with_proof = RdfCredential::from_json(with_proof).unwrap();

        let derived =
            derive_proof(&with_proof, &loader, &["/credentialSubject/alumniOf".to_string()]).unwrap();
        let subject = &derived["credentialSubject"];
        assert!(subject.get("alumniOf").is_some());
        assert!(subject.get("degree").is_none());
        assert!(subject.get("id").is_some());
    }
}
