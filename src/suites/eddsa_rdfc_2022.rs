//! # `eddsa-rdfc-2022`
//!
//! Data Integrity cryptosuite binding the shared RDFC transform/hash
//! algorithm (see [`super::create_rdfc_proof`]/[`super::verify_rdfc_proof`])
//! to Ed25519 signatures (`spec.md` §4.5).

use serde_json::Value;

use crate::error::Error;
use crate::rdf::kernel::RdfCredential;
use crate::rdf::loader::DocumentLoader;
use crate::signer::software::{Ed25519Signer, Ed25519Verifier};
use crate::signer::Signer;
use crate::suites::{create_rdfc_proof, verify_rdfc_proof, ProofOptions};

/// The cryptosuite name this module implements.
pub const CRYPTOSUITE: &str = "eddsa-rdfc-2022";

/// Create an `eddsa-rdfc-2022` proof over `credential`.
///
/// # Errors
/// See [`super::create_rdfc_proof`].
pub fn create_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, options: &ProofOptions, signer: &Ed25519Signer,
) -> Result<Value, Error> {
    debug_assert_eq!(options.cryptosuite, CRYPTOSUITE);
    create_rdfc_proof(credential, loader, options, signer as &dyn Signer)
}

/// Verify an `eddsa-rdfc-2022` proof attached to `credential`.
///
/// # Errors
/// See [`super::verify_rdfc_proof`].
pub fn verify_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, proof: &Value, verifier: &Ed25519Verifier,
) -> Result<(), Error> {
    verify_rdfc_proof(credential, loader, proof, verifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::loader::CachingDocumentLoader;

    fn credential() -> RdfCredential {
        RdfCredential::from_json(serde_json::json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:58172aac-d8ba-11ed-83dd-0b3aef56cc33",
            "type": ["VerifiableCredential"],
            "issuer": "https://vc.example/issuers/5678",
            "validFrom": "2023-01-01T00:00:00Z",
            "credentialSubject": { "id": "did:example:abcdefgh" }
        }))
        .unwrap()
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let loader = CachingDocumentLoader::new();
        let signer = Ed25519Signer::generate("did:example:issuer#key-1");
        let options = ProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: None,
            cryptosuite: CRYPTOSUITE,
            challenge: None,
            domain: None,
        };
        let credential = credential();
        let proof = create_proof(&credential, &loader, &options, &signer).unwrap();
        assert_eq!(proof["cryptosuite"], CRYPTOSUITE);
        verify_proof(&credential, &loader, &proof, &signer.verifier()).unwrap();
    }

    #[test]
    fn same_document_produces_deterministic_hash_target() {
        // Two distinct signers over the same credential produce different
        // signatures, but each must independently verify — the hash being
        // signed is a pure function of the document and proof options.
        let loader = CachingDocumentLoader::new();
        let options = ProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: Some(chrono::DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z").unwrap().into()),
            cryptosuite: CRYPTOSUITE,
            challenge: None,
            domain: None,
        };
        let credential = credential();
        let signer_a = Ed25519Signer::generate("did:example:issuer#key-1");
        let signer_b = Ed25519Signer::generate("did:example:issuer#key-1");
        let proof_a = create_proof(&credential, &loader, &options, &signer_a).unwrap();
        let proof_b = create_proof(&credential, &loader, &options, &signer_b).unwrap();
        assert_ne!(proof_a["proofValue"], proof_b["proofValue"]);
        verify_proof(&credential, &loader, &proof_a, &signer_a.verifier()).unwrap();
        verify_proof(&credential, &loader, &proof_b, &signer_b.verifier()).unwrap();
    }
}
