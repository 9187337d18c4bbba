//! # JSON-LD → RDF Expansion
//!
//! A scoped JSON-LD expander: enough of the algorithm to turn a W3C VC 2.0
//! document (or a Data Integrity proof configuration) into an RDF quad
//! set, resolving `@context` through a [`DocumentLoader`] rather than the
//! network. General JSON-LD 1.1 features this crate's documents never use
//! (`@reverse`, `@container: @list`/`@index`, framing) are intentionally
//! not implemented — see `spec.md` §1 scope.

use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use serde_json::Value;

use crate::error::RdfError;
use crate::rdf::loader::DocumentLoader;
use crate::rdf::vocab::{ContextDef, TermKind};

pub(crate) const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Expand `document` to an RDF quad set using `loader` to resolve
/// `@context` entries.
///
/// # Errors
/// Returns [`RdfError::JsonLdConversionFailed`] if a referenced context
/// cannot be resolved, or the document is not a JSON object.
pub fn expand_to_rdf(document: &Value, loader: &dyn DocumentLoader) -> Result<Vec<Quad>, RdfError> {
    let Value::Object(root) = document else {
        return Err(RdfError::JsonLdConversionFailed("top-level document must be an object".into()));
    };
    let context = resolve_context(root.get("@context"), loader)?;
    let mut quads = Vec::new();
    expand_node(root, &context, GraphName::DefaultGraph, &mut quads, loader)?;
    Ok(quads)
}

/// Resolve an `@context` value to its merged term definitions. Exposed
/// crate-wide so the `ecdsa-sd-2023` mandatory-pointer selector can resolve
/// a JSON property name to the same predicate IRI expansion uses.
pub(crate) fn resolve_context(value: Option<&Value>, loader: &dyn DocumentLoader) -> Result<ContextDef, RdfError> {
    let mut merged = ContextDef::default();
    let Some(value) = value else { return Ok(merged) };
    let iris: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        Value::Object(_) => Vec::new(),
        _ => return Err(RdfError::JsonLdConversionFailed("invalid @context".into())),
    };
    for iri in iris {
        let def = loader
            .load(&iri)
            .map_err(|e| RdfError::JsonLdConversionFailed(format!("loading {iri}: {e}")))?;
        merged = merged.merged_with(def);
    }
    Ok(merged)
}

/// Expand a single JSON object into quads, returning the subject term it
/// was assigned (an existing `id`/`@id`, or a fresh blank node).
fn expand_node(
    obj: &serde_json::Map<String, Value>, context: &ContextDef, graph: GraphName,
    quads: &mut Vec<Quad>, loader: &dyn DocumentLoader,
) -> Result<Subject, RdfError> {
    // A nested context may refine or add to the active one.
    let local_context = match obj.get("@context").or_else(|| obj.get("context")) {
        Some(v) => context.clone().merged_with(resolve_context(Some(v), loader)?),
        None => context.clone(),
    };

    let subject = match obj.get("id").or_else(|| obj.get("@id")) {
        Some(Value::String(s)) => node_ref(s),
        _ => Subject::BlankNode(BlankNode::default()),
    };

    for (key, value) in obj {
        if matches!(key.as_str(), "@context" | "context" | "id" | "@id") {
            continue;
        }
        if matches!(key.as_str(), "type" | "@type") {
            for type_value in as_array(value) {
                let Value::String(name) = type_value else { continue };
                let iri = resolve_type(name, &local_context);
                quads.push(Quad {
                    subject: subject.clone(),
                    predicate: NamedNode::new_unchecked(RDF_TYPE),
                    object: Term::NamedNode(NamedNode::new_unchecked(iri)),
                    graph_name: graph.clone(),
                });
            }
            continue;
        }

        let Some(term_def) = local_context.terms.get(key) else {
            // Unknown term with no @vocab fallback: silently dropped, per
            // JSON-LD expansion rules for undefined terms.
            continue;
        };
        let predicate = NamedNode::new_unchecked(term_def.iri.clone());

        for element in as_array(value) {
            let object = match (&term_def.kind, element) {
                (TermKind::Id, Value::String(s)) => subject_to_term(node_ref(s)),
                (TermKind::Id, Value::Object(nested)) => {
                    if let Some(lang_value) = nested.get("@value") {
                        literal_from_value_object(nested, lang_value)?
                    } else {
                        let nested_subject =
                            expand_node(nested, &local_context, graph.clone(), quads, loader)?;
                        subject_to_term(nested_subject)
                    }
                }
                (TermKind::Vocab, Value::String(s)) => {
                    Term::NamedNode(NamedNode::new_unchecked(resolve_type(s, &local_context)))
                }
                (TermKind::Datatype(dt), Value::String(s)) => {
                    Term::Literal(Literal::new_typed_literal(s, NamedNode::new_unchecked(dt.clone())))
                }
                (TermKind::Datatype(dt), other) => Term::Literal(Literal::new_typed_literal(
                    scalar_to_string(other),
                    NamedNode::new_unchecked(dt.clone()),
                )),
                (TermKind::Plain, Value::Object(nested)) if nested.contains_key("@value") => {
                    literal_from_value_object(nested, nested.get("@value").unwrap())?
                }
                (_, Value::String(s)) => Term::Literal(Literal::new_simple_literal(s.clone())),
                (_, other) => Term::Literal(Literal::new_simple_literal(scalar_to_string(other))),
            };
            quads.push(Quad {
                subject: subject.clone(),
                predicate: predicate.clone(),
                object,
                graph_name: graph.clone(),
            });
        }
    }

    Ok(subject)
}

fn literal_from_value_object(
    nested: &serde_json::Map<String, Value>, value: &Value,
) -> Result<Term, RdfError> {
    let Value::String(text) = value else {
        return Err(RdfError::JsonLdConversionFailed("@value must be a string".into()));
    };
    if let Some(Value::String(lang)) = nested.get("@language") {
        let literal = Literal::new_language_tagged_literal(text.clone(), lang.clone())
            .map_err(|e| RdfError::JsonLdConversionFailed(e.to_string()))?;
        return Ok(Term::Literal(literal));
    }
    if let Some(Value::String(dt)) = nested.get("@type") {
        return Ok(Term::Literal(Literal::new_typed_literal(text.clone(), NamedNode::new_unchecked(dt.clone()))));
    }
    Ok(Term::Literal(Literal::new_simple_literal(text.clone())))
}

fn subject_to_term(subject: Subject) -> Term {
    match subject {
        Subject::NamedNode(n) => Term::NamedNode(n),
        Subject::BlankNode(b) => Term::BlankNode(b),
        #[allow(unreachable_patterns)]
        _ => Term::BlankNode(BlankNode::default()),
    }
}

fn node_ref(s: &str) -> Subject {
    if let Some(label) = s.strip_prefix("_:") {
        Subject::BlankNode(BlankNode::new_unchecked(label))
    } else {
        Subject::NamedNode(NamedNode::new_unchecked(s))
    }
}

/// Resolve a JSON-LD term name (or absolute IRI/DID/URN already in
/// expanded form) to its predicate or type IRI under `context`.
pub(crate) fn resolve_type(name: &str, context: &ContextDef) -> String {
    if let Some(def) = context.terms.get(name) {
        return def.iri.clone();
    }
    if name.contains("://") || name.starts_with("did:") || name.starts_with("urn:") {
        return name.to_string();
    }
    match &context.vocab {
        Some(vocab) => format!("{vocab}{name}"),
        None => name.to_string(),
    }
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::canon::canonicalize;
    use crate::rdf::loader::CachingDocumentLoader;

    #[test]
    fn expands_alumni_credential_per_w3c_vector() {
        let credential: Value = serde_json::from_str(
            r#"{
                "@context": [
                    "https://www.w3.org/ns/credentials/v2",
                    "https://www.w3.org/ns/credentials/examples/v2"
                ],
                "id": "urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33",
                "type": ["VerifiableCredential", "AlumniCredential"],
                "name": "Alumni Credential",
                "description": "A minimum viable example of an Alumni Credential.",
                "issuer": "https://vc.example/issuers/5678",
                "validFrom": "2023-01-01T00:00:00Z",
                "credentialSubject": {
                    "id": "did:example:abcdefgh",
                    "alumniOf": "The School of Examples"
                }
            }"#,
        )
        .unwrap();

        let loader = CachingDocumentLoader::new();
        let quads = expand_to_rdf(&credential, &loader).unwrap();
        let canonical = canonicalize(&quads).unwrap();

        let expected = "\
<did:example:abcdefgh> <https://www.w3.org/ns/credentials/examples#alumniOf> \"The School of Examples\" .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/ns/credentials/examples#AlumniCredential> .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <https://schema.org/description> \"A minimum viable example of an Alumni Credential.\" .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <https://schema.org/name> \"Alumni Credential\" .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <https://www.w3.org/2018/credentials#credentialSubject> <did:example:abcdefgh> .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <https://www.w3.org/2018/credentials#issuer> <https://vc.example/issuers/5678> .
<urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33> <https://www.w3.org/2018/credentials#validFrom> \"2023-01-01T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
";
        assert_eq!(canonical, expected);
    }
}
