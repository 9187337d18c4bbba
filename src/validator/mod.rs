//! # VC 2.0 Structural Validator
//!
//! Purely structural conformance checks against the W3C Verifiable
//! Credentials Data Model 2.0 (`spec.md` §4.8) — no signature checking,
//! that is [`crate::rdf`]/[`crate::suites`]'s job. Every rule that fails
//! is collected rather than short-circuiting on the first one, so a caller
//! can report the complete set of structural defects in one pass.

mod digest;
mod types;
mod url;

use std::collections::HashSet;

use chrono::DateTime;
use serde_json::Value;

pub use digest::{InMemoryResourceFetcher, ResourceFetcher};
pub use types::{LangString, StatusListReference};

use crate::error::ValidationError;
use url::looks_like_url;

const BASE_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// A `name`/`description` entry is a bare [`LangString`], or a language map
/// whose values each parse as one — or an array of either (`spec.md` §4.8
/// rule 9).
fn validate_name_or_description(value: &Value, pointer: &str, errors: &mut Vec<ValidationError>) {
    for item in as_array(value) {
        let ok = LangString::parse(item).is_some()
            || matches!(item, Value::Object(m) if !m.is_empty() && m.values().all(|v| LangString::parse(v).is_some()));
        if !ok {
            errors.push(ValidationError::At {
                pointer: pointer.to_string(),
                reason: "must be a string, language-value object, language map, or array thereof".into(),
            });
        }
    }
}

fn validate_context(document: &Value, errors: &mut Vec<ValidationError>) {
    let Some(context) = document.get("@context") else {
        errors.push(ValidationError::MissingContext);
        return;
    };
    let entries: Vec<&Value> = match context {
        Value::String(_) => vec![context],
        Value::Array(items) if !items.is_empty() => items.iter().collect(),
        _ => {
            errors.push(ValidationError::InvalidBaseContext);
            return;
        }
    };
    if entries.first().and_then(Value::as_str) != Some(BASE_CONTEXT) {
        errors.push(ValidationError::InvalidBaseContext);
        return;
    }
    for (i, entry) in entries.iter().enumerate().skip(1) {
        match entry {
            Value::String(s) if looks_like_url(s) => {}
            Value::Object(_) => {}
            _ => errors.push(ValidationError::InvalidUrl {
                pointer: format!("/@context/{i}"),
                reason: "context entry must be a URL or an object".into(),
            }),
        }
    }
}

fn validate_type(document: &Value, expected: &str, errors: &mut Vec<ValidationError>) {
    let Some(type_value) = document.get("type") else {
        errors.push(ValidationError::MissingType);
        return;
    };
    let has_expected = as_array(type_value).iter().any(|v| v.as_str() == Some(expected));
    if !has_expected {
        errors.push(ValidationError::MissingType);
    }
}

fn validate_id(document: &Value, errors: &mut Vec<ValidationError>) {
    if let Some(Value::String(id)) = document.get("id") {
        if !looks_like_url(id) {
            errors.push(ValidationError::InvalidUrl { pointer: "/id".into(), reason: "id must be a URL".into() });
        }
    }
}

fn validate_issuer(document: &Value, errors: &mut Vec<ValidationError>) {
    match document.get("issuer") {
        None => errors.push(ValidationError::MissingIssuer),
        Some(Value::String(issuer)) => {
            if !looks_like_url(issuer) {
                errors.push(ValidationError::InvalidUrl { pointer: "/issuer".into(), reason: "issuer must be a URL".into() });
            }
        }
        Some(Value::Object(obj)) => {
            match obj.get("id") {
                Some(Value::String(id)) if looks_like_url(id) => {}
                _ => errors.push(ValidationError::InvalidUrl {
                    pointer: "/issuer/id".into(),
                    reason: "issuer.id must be a URL".into(),
                }),
            }
            if let Some(name) = obj.get("name") {
                validate_name_or_description(name, "/issuer/name", errors);
            }
            if let Some(description) = obj.get("description") {
                validate_name_or_description(description, "/issuer/description", errors);
            }
        }
        Some(_) => errors.push(ValidationError::InvalidUrl {
            pointer: "/issuer".into(),
            reason: "issuer must be a URL string or an object with an id".into(),
        }),
    }
}

fn validate_validity_period(document: &Value, errors: &mut Vec<ValidationError>) {
    let parse = |field: &str| -> Option<Result<DateTime<chrono::FixedOffset>, ()>> {
        document.get(field).and_then(Value::as_str).map(|s| DateTime::parse_from_rfc3339(s).map_err(|_| ()))
    };
    let valid_from = parse("validFrom");
    let valid_until = parse("validUntil");
    if let Some(Err(())) = valid_from {
        errors.push(ValidationError::InvalidValidityPeriod("validFrom is not RFC 3339".into()));
    }
    if let Some(Err(())) = valid_until {
        errors.push(ValidationError::InvalidValidityPeriod("validUntil is not RFC 3339".into()));
    }
    if let (Some(Ok(from)), Some(Ok(until))) = (valid_from, valid_until) {
        if until < from {
            errors.push(ValidationError::InvalidValidityPeriod("validUntil precedes validFrom".into()));
        }
    }
}

fn validate_credential_subject(document: &Value, errors: &mut Vec<ValidationError>) {
    match document.get("credentialSubject") {
        None => errors.push(ValidationError::MissingCredentialSubject),
        Some(Value::Object(obj)) if obj.is_empty() => errors.push(ValidationError::EmptyCredentialSubject),
        Some(Value::Object(_)) => {}
        Some(Value::Array(items)) if items.is_empty() => errors.push(ValidationError::EmptyCredentialSubject),
        Some(Value::Array(items)) => {
            for item in items {
                if !matches!(item, Value::Object(obj) if !obj.is_empty()) {
                    errors.push(ValidationError::EmptyCredentialSubject);
                }
            }
        }
        Some(_) => errors.push(ValidationError::EmptyCredentialSubject),
    }
}

fn validate_typed_entries(document: &Value, field: &str, id_is_url: bool, errors: &mut Vec<ValidationError>) {
    let Some(value) = document.get(field) else { return };
    for (i, entry) in as_array(value).iter().enumerate() {
        let Value::Object(obj) = entry else {
            errors.push(ValidationError::At { pointer: format!("/{field}/{i}"), reason: "must be an object".into() });
            continue;
        };
        if !obj.contains_key("type") {
            errors.push(ValidationError::At { pointer: format!("/{field}/{i}/type"), reason: "type is required".into() });
        }
        if id_is_url {
            if let Some(Value::String(id)) = obj.get("id") {
                if !looks_like_url(id) {
                    errors.push(ValidationError::InvalidUrl {
                        pointer: format!("/{field}/{i}/id"),
                        reason: "id must be a URL".into(),
                    });
                }
            }
        }
    }
}

/// Each `credentialStatus` entry must parse as a [`StatusListReference`]
/// (carrying a `type`) with a dereferenceable `id` when one is present
/// (`spec.md` §4.8 rule 7).
fn validate_credential_status(document: &Value, errors: &mut Vec<ValidationError>) {
    let Some(value) = document.get("credentialStatus") else { return };
    for (i, entry) in as_array(value).iter().enumerate() {
        let pointer = format!("/credentialStatus/{i}");
        let Some(status) = StatusListReference::parse(entry) else {
            errors.push(ValidationError::At { pointer: format!("{pointer}/type"), reason: "type is required".into() });
            continue;
        };
        if let Some(id) = &status.id {
            if !looks_like_url(id) {
                errors.push(ValidationError::InvalidUrl { pointer: format!("{pointer}/id"), reason: "id must be a URL".into() });
            }
        }
    }
}

fn validate_name_and_description(document: &Value, errors: &mut Vec<ValidationError>) {
    if let Some(name) = document.get("name") {
        validate_name_or_description(name, "/name", errors);
    }
    if let Some(description) = document.get("description") {
        validate_name_or_description(description, "/description", errors);
    }
}

fn validate_related_resources(
    document: &Value, fetcher: &dyn ResourceFetcher, errors: &mut Vec<ValidationError>,
) {
    let Some(Value::Array(resources)) = document.get("relatedResource") else { return };
    let mut seen_ids = HashSet::new();
    for (i, entry) in resources.iter().enumerate() {
        let Value::Object(obj) = entry else {
            errors.push(ValidationError::At { pointer: format!("/relatedResource/{i}"), reason: "must be an object".into() });
            continue;
        };
        let Some(Value::String(id)) = obj.get("id") else {
            errors.push(ValidationError::InvalidUrl { pointer: format!("/relatedResource/{i}/id"), reason: "id is required".into() });
            continue;
        };
        if !looks_like_url(id) {
            errors.push(ValidationError::InvalidUrl { pointer: format!("/relatedResource/{i}/id"), reason: "id must be a URL".into() });
        }
        if !seen_ids.insert(id.clone()) {
            errors.push(ValidationError::DuplicateRelatedResource(id.clone()));
            continue;
        }
        let digest_sri = obj.get("digestSRI").and_then(Value::as_str);
        let digest_multibase = obj.get("digestMultibase").and_then(Value::as_str);
        if digest_sri.is_none() && digest_multibase.is_none() {
            errors.push(ValidationError::At {
                pointer: format!("/relatedResource/{i}"),
                reason: "must carry digestSRI or digestMultibase".into(),
            });
            continue;
        }
        match fetcher.fetch(id) {
            Ok(bytes) => {
                if let Err(e) = digest::verify_related_resource(id, digest_sri, digest_multibase, &bytes) {
                    errors.push(e);
                }
            }
            Err(e) => errors.push(e),
        }
    }
}

/// Validate `document` as a W3C VCDM 2.0 credential (`spec.md` §4.8 rules
/// 1–9). Structural only — no signature or proof checking.
///
/// # Errors
/// Returns every rule violation found, most-specific first; empty `Ok(())`
/// if the document is fully conformant.
#[tracing::instrument(skip(document, fetcher))]
pub fn validate_credential(document: &Value, fetcher: &dyn ResourceFetcher) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_context(document, &mut errors);
    validate_type(document, "VerifiableCredential", &mut errors);
    validate_id(document, &mut errors);
    validate_issuer(document, &mut errors);
    validate_validity_period(document, &mut errors);
    validate_credential_subject(document, &mut errors);
    validate_credential_status(document, &mut errors);
    validate_typed_entries(document, "credentialSchema", true, &mut errors);
    validate_typed_entries(document, "refreshService", false, &mut errors);
    validate_typed_entries(document, "termsOfUse", false, &mut errors);
    validate_typed_entries(document, "evidence", false, &mut errors);
    validate_related_resources(document, fetcher, &mut errors);
    validate_name_and_description(document, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(violations = errors.len(), "credential failed structural validation");
        Err(errors)
    }
}

/// Validate `document` as a W3C VCDM 2.0 presentation: `@context` and
/// `type` rules apply identically, with `VerifiablePresentation` required
/// in place of `VerifiableCredential`; any embedded `verifiableCredential`
/// entries are each recursively validated, with violations reported under
/// a `/verifiableCredential/<i>` pointer prefix.
///
/// # Errors
/// Returns every rule violation found, empty `Ok(())` if fully conformant.
#[tracing::instrument(skip(document, fetcher))]
pub fn validate_presentation(document: &Value, fetcher: &dyn ResourceFetcher) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_context(document, &mut errors);
    validate_type(document, "VerifiablePresentation", &mut errors);
    validate_id(document, &mut errors);

    if let Some(Value::Array(credentials)) = document.get("verifiableCredential") {
        for (i, credential) in credentials.iter().enumerate() {
            if let Err(nested) = validate_credential(credential, fetcher) {
                for error in nested {
                    errors.push(ValidationError::At {
                        pointer: format!("/verifiableCredential/{i}"),
                        reason: error.to_string(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_credential() -> Value {
        serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:1",
            "type": ["VerifiableCredential"],
            "issuer": "https://vc.example/issuers/1",
            "validFrom": "2023-01-01T00:00:00Z",
            "credentialSubject": { "id": "did:example:subject", "alumniOf": "Example U" }
        })
    }

    #[test]
    fn accepts_a_conformant_credential() {
        let fetcher = InMemoryResourceFetcher::new();
        assert!(validate_credential(&valid_credential(), &fetcher).is_ok());
    }

    #[test]
    fn rejects_missing_context() {
        let mut doc = valid_credential();
        doc.as_object_mut().unwrap().remove("@context");
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingContext));
    }

    #[test]
    fn rejects_wrong_base_context() {
        let mut doc = valid_credential();
        doc["@context"] = serde_json::json!(["https://example.org/not-the-base-context"]);
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBaseContext));
    }

    #[test]
    fn rejects_validity_period_out_of_order() {
        let mut doc = valid_credential();
        doc["validFrom"] = Value::String("2024-01-01T00:00:00Z".into());
        doc["validUntil"] = Value::String("2023-01-01T00:00:00Z".into());
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidValidityPeriod(_))));
    }

    #[test]
    fn rejects_empty_credential_subject() {
        let mut doc = valid_credential();
        doc["credentialSubject"] = serde_json::json!({});
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyCredentialSubject));
    }

    #[test]
    fn rejects_duplicate_related_resource_ids() {
        let mut doc = valid_credential();
        doc["relatedResource"] = serde_json::json!([
            { "id": "https://vc.example/res/1", "digestSRI": "sha256-AAAA" },
            { "id": "https://vc.example/res/1", "digestSRI": "sha256-AAAA" },
        ]);
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRelatedResource(_))));
    }

    #[test]
    fn rejects_credential_status_missing_type() {
        let mut doc = valid_credential();
        doc["credentialStatus"] = serde_json::json!({ "id": "https://vc.example/status/1" });
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_credential(&doc, &fetcher).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::At { pointer, .. } if pointer == "/credentialStatus/0/type")));
    }

    #[test]
    fn accepts_well_formed_credential_status() {
        let mut doc = valid_credential();
        doc["credentialStatus"] =
            serde_json::json!({ "id": "https://vc.example/status/1", "type": "BitstringStatusListEntry" });
        let fetcher = InMemoryResourceFetcher::new();
        assert!(validate_credential(&doc, &fetcher).is_ok());
    }

    #[test]
    fn validates_a_presentation_and_its_embedded_credentials() {
        let mut bad_credential = valid_credential();
        bad_credential.as_object_mut().unwrap().remove("issuer");
        let presentation = serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiablePresentation"],
            "verifiableCredential": [bad_credential]
        });
        let fetcher = InMemoryResourceFetcher::new();
        let errors = validate_presentation(&presentation, &fetcher).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::At { pointer, .. } if pointer == "/verifiableCredential/0")));
    }
}
