//! # Built-in JSON-LD Vocabulary
//!
//! Term definitions for the fixed set of contexts this crate resolves
//! without network access: the VC 2.0 base context, its examples
//! companion, and the Data Integrity security vocabulary. Mappings are
//! taken directly from the published context documents (confirmed against
//! the W3C `eddsa-rdfc-2022` test vectors: `VerifiableCredential` still
//! resolves into the legacy `2018/credentials#` namespace under the v2
//! context, for backward compatibility).

use std::collections::HashMap;

/// How a term's value should be interpreted during expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// The value is itself an IRI reference (or nested node).
    Id,
    /// The value is a term name resolved against the active vocabulary
    /// (used for `proofPurpose`-style enumerations).
    Vocab,
    /// The value is a literal with the given datatype IRI.
    Datatype(String),
    /// The value is a plain string (or, for an array, a list of plain
    /// strings).
    Plain,
}

/// A single term's expansion definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDef {
    /// The absolute IRI this term expands to.
    pub iri: String,
    /// How to interpret the term's value.
    pub kind: TermKind,
}

/// A resolved (possibly merged) `@context` document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextDef {
    /// Term name → definition.
    pub terms: HashMap<String, TermDef>,
    /// `@vocab`, if the context declares one.
    pub vocab: Option<String>,
}

impl ContextDef {
    /// Merge `other` on top of `self` (later contexts override earlier
    /// ones, per JSON-LD context processing order).
    #[must_use]
    pub fn merged_with(mut self, other: ContextDef) -> Self {
        self.terms.extend(other.terms);
        if other.vocab.is_some() {
            self.vocab = other.vocab;
        }
        self
    }
}

fn term(iri: &str, kind: TermKind) -> TermDef {
    TermDef { iri: iri.to_string(), kind }
}

/// IRIs of the contexts this crate resolves without going to the network.
pub const BUILTIN_CONTEXT_IRIS: &[&str] = &[
    "https://www.w3.org/ns/credentials/v2",
    "https://www.w3.org/ns/credentials/examples/v2",
    "https://w3id.org/security/data-integrity/v2",
    "https://w3id.org/security/v2",
];

/// Look up a built-in context by IRI.
#[must_use]
pub fn builtin_context(iri: &str) -> Option<ContextDef> {
    match iri {
        "https://www.w3.org/ns/credentials/v2" => Some(credentials_v2()),
        "https://www.w3.org/ns/credentials/examples/v2" => Some(credentials_examples_v2()),
        "https://w3id.org/security/data-integrity/v2" | "https://w3id.org/security/v2" => {
            Some(security_v2())
        }
        _ => None,
    }
}

const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

fn credentials_v2() -> ContextDef {
    let mut terms = HashMap::new();
    let cred = "https://www.w3.org/2018/credentials#";
    terms.insert("VerifiableCredential".into(), term(&format!("{cred}VerifiableCredential"), TermKind::Id));
    terms.insert("VerifiablePresentation".into(), term(&format!("{cred}VerifiablePresentation"), TermKind::Id));
    terms.insert("issuer".into(), term(&format!("{cred}issuer"), TermKind::Id));
    terms.insert("holder".into(), term(&format!("{cred}holder"), TermKind::Id));
    terms.insert("credentialSubject".into(), term(&format!("{cred}credentialSubject"), TermKind::Id));
    terms.insert("verifiableCredential".into(), term(&format!("{cred}verifiableCredential"), TermKind::Id));
    terms.insert("validFrom".into(), term(&format!("{cred}validFrom"), TermKind::Datatype(XSD_DATE_TIME.into())));
    terms.insert("validUntil".into(), term(&format!("{cred}validUntil"), TermKind::Datatype(XSD_DATE_TIME.into())));
    terms.insert("credentialStatus".into(), term(&format!("{cred}credentialStatus"), TermKind::Id));
    terms.insert("credentialSchema".into(), term(&format!("{cred}credentialSchema"), TermKind::Id));
    terms.insert("refreshService".into(), term(&format!("{cred}refreshService"), TermKind::Id));
    terms.insert("termsOfUse".into(), term(&format!("{cred}termsOfUse"), TermKind::Id));
    terms.insert("evidence".into(), term(&format!("{cred}evidence"), TermKind::Id));
    terms.insert("relatedResource".into(), term(&format!("{cred}relatedResource"), TermKind::Id));
    terms.insert("digestSRI".into(), term(&format!("{cred}digestSRI"), TermKind::Plain));
    terms.insert(
        "digestMultibase".into(),
        term(&format!("{cred}digestMultibase"), TermKind::Datatype("https://w3id.org/security#multibase".into())),
    );
    terms.insert("description".into(), term("https://schema.org/description", TermKind::Plain));
    terms.insert("name".into(), term("https://schema.org/name", TermKind::Plain));
    terms.extend(security_v2().terms);
    ContextDef { terms, vocab: None }
}

fn credentials_examples_v2() -> ContextDef {
    ContextDef { terms: HashMap::new(), vocab: Some("https://www.w3.org/ns/credentials/examples#".into()) }
}

fn security_v2() -> ContextDef {
    let mut terms = HashMap::new();
    let sec = "https://w3id.org/security#";
    terms.insert("DataIntegrityProof".into(), term(&format!("{sec}DataIntegrityProof"), TermKind::Id));
    terms.insert("proof".into(), term(&format!("{sec}proof"), TermKind::Id));
    terms.insert("proofValue".into(), term(&format!("{sec}proofValue"), TermKind::Datatype(format!("{sec}multibase"))));
    terms.insert(
        "cryptosuite".into(),
        term(&format!("{sec}cryptosuite"), TermKind::Datatype(format!("{sec}cryptosuiteString"))),
    );
    terms.insert("verificationMethod".into(), term(&format!("{sec}verificationMethod"), TermKind::Id));
    terms.insert("proofPurpose".into(), term(&format!("{sec}proofPurpose"), TermKind::Vocab));
    terms.insert("assertionMethod".into(), term(&format!("{sec}assertionMethod"), TermKind::Id));
    terms.insert("authentication".into(), term(&format!("{sec}authentication"), TermKind::Id));
    terms.insert("keyAgreement".into(), term(&format!("{sec}keyAgreement"), TermKind::Id));
    terms.insert("capabilityInvocation".into(), term(&format!("{sec}capabilityInvocation"), TermKind::Id));
    terms.insert("capabilityDelegation".into(), term(&format!("{sec}capabilityDelegation"), TermKind::Id));
    terms.insert("created".into(), term("http://purl.org/dc/terms/created", TermKind::Datatype(XSD_DATE_TIME.into())));
    terms.insert("expires".into(), term(&format!("{sec}expiration"), TermKind::Datatype(XSD_DATE_TIME.into())));
    terms.insert("domain".into(), term(&format!("{sec}domain"), TermKind::Plain));
    terms.insert("challenge".into(), term(&format!("{sec}challenge"), TermKind::Plain));
    terms.insert("previousProof".into(), term(&format!("{sec}previousProof"), TermKind::Id));
    terms.insert("nonce".into(), term(&format!("{sec}nonce"), TermKind::Plain));
    let _ = XSD_STRING;
    ContextDef { terms, vocab: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alumni_credential_term_matches_vector() {
        let ctx = credentials_v2();
        let issuer = ctx.terms.get("issuer").unwrap();
        assert_eq!(issuer.iri, "https://www.w3.org/2018/credentials#issuer");
        let vf = ctx.terms.get("validFrom").unwrap();
        assert_eq!(vf.kind, TermKind::Datatype(XSD_DATE_TIME.into()));
    }

    #[test]
    fn examples_context_sets_vocab() {
        let ctx = credentials_examples_v2();
        assert_eq!(ctx.vocab.as_deref(), Some("https://www.w3.org/ns/credentials/examples#"));
    }
}
