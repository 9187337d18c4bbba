//! # `ecdsa-rdfc-2019`
//!
//! Data Integrity cryptosuite binding the shared RDFC transform/hash
//! algorithm to fixed-width ECDSA signatures over P-256 or P-384
//! (`spec.md` §4.6). Curve selection follows the signer: a P-256 signer
//! yields `ES256` signatures, a P-384 signer `ES384`.

use serde_json::Value;

use crate::error::Error;
use crate::rdf::kernel::RdfCredential;
use crate::rdf::loader::DocumentLoader;
use crate::signer::software::{EcdsaP256Signer, EcdsaP256Verifier, EcdsaP384Signer, EcdsaP384Verifier};
use crate::signer::Signer;
use crate::suites::{create_rdfc_proof, verify_rdfc_proof, ProofOptions};

/// The cryptosuite name this module implements.
pub const CRYPTOSUITE: &str = "ecdsa-rdfc-2019";

/// Create an `ecdsa-rdfc-2019` proof using a P-256 signer.
///
/// # Errors
/// See [`super::create_rdfc_proof`].
pub fn create_proof_p256(
    credential: &RdfCredential, loader: &dyn DocumentLoader, options: &ProofOptions, signer: &EcdsaP256Signer,
) -> Result<Value, Error> {
    debug_assert_eq!(options.cryptosuite, CRYPTOSUITE);
    create_rdfc_proof(credential, loader, options, signer as &dyn Signer)
}

/// Verify an `ecdsa-rdfc-2019` proof produced with a P-256 key.
///
/// # Errors
/// See [`super::verify_rdfc_proof`].
pub fn verify_proof_p256(
    credential: &RdfCredential, loader: &dyn DocumentLoader, proof: &Value, verifier: &EcdsaP256Verifier,
) -> Result<(), Error> {
    verify_rdfc_proof(credential, loader, proof, verifier)
}

/// Create an `ecdsa-rdfc-2019` proof using a P-384 signer.
///
/// # Errors
/// See [`super::create_rdfc_proof`].
pub fn create_proof_p384(
    credential: &RdfCredential, loader: &dyn DocumentLoader, options: &ProofOptions, signer: &EcdsaP384Signer,
) -> Result<Value, Error> {
    debug_assert_eq!(options.cryptosuite, CRYPTOSUITE);
    create_rdfc_proof(credential, loader, options, signer as &dyn Signer)
}

/// Verify an `ecdsa-rdfc-2019` proof produced with a P-384 key.
///
/// # Errors
/// See [`super::verify_rdfc_proof`].
pub fn verify_proof_p384(
    credential: &RdfCredential, loader: &dyn DocumentLoader, proof: &Value, verifier: &EcdsaP384Verifier,
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
    fn p256_round_trip() {
        let loader = CachingDocumentLoader::new();
        let signer = EcdsaP256Signer::generate("did:example:issuer#key-1");
        let options = ProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: None,
            cryptosuite: CRYPTOSUITE,
            challenge: None,
            domain: None,
        };
        let credential = credential();
        let proof = create_proof_p256(&credential, &loader, &options, &signer).unwrap();
        let verifier = EcdsaP256Verifier::from_sec1(&signer.public_key_sec1()).unwrap();
        verify_proof_p256(&credential, &loader, &proof, &verifier).unwrap();
    }

    #[test]
    fn p384_round_trip() {
        let loader = CachingDocumentLoader::new();
        let signer = EcdsaP384Signer::generate("did:example:issuer#key-1");
        let options = ProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: None,
            cryptosuite: CRYPTOSUITE,
            challenge: None,
            domain: None,
        };
        let credential = credential();
        let proof = create_proof_p384(&credential, &loader, &options, &signer).unwrap();
        let verifier = EcdsaP384Verifier::from_sec1(&signer.public_key_sec1()).unwrap();
        verify_proof_p384(&credential, &loader, &proof, &verifier).unwrap();
    }

    #[test]
    fn tampered_document_is_rejected() {
        let loader = CachingDocumentLoader::new();
        let signer = EcdsaP256Signer::generate("did:example:issuer#key-1");
        let options = ProofOptions {
            verification_method: "did:example:issuer#key-1".into(),
            proof_purpose: "assertionMethod".into(),
            created: None,
            cryptosuite: CRYPTOSUITE,
            challenge: None,
            domain: None,
        };
        let credential = credential();
        let proof = create_proof_p256(&credential, &loader, &options, &signer).unwrap();
        let mut tampered = credential.as_value().clone();
        tampered["issuer"] = Value::String("https://vc.example/issuers/9999".into());
        let tampered = RdfCredential::from_json(tampered).unwrap();
        let verifier = EcdsaP256Verifier::from_sec1(&signer.public_key_sec1()).unwrap();
        assert!(verify_proof_p256(&tampered, &loader, &proof, &verifier).is_err());
    }
}
