//! # Data Integrity Cryptosuites
//!
//! Shared `TRANSFORM`/`HASH`/`PROOF SERIALIZATION` plumbing for the
//! non-selective-disclosure cryptosuites (`spec.md` §4.5, §4.6); the
//! `ecdsa-sd-2023` selective-disclosure suite has its own module since its
//! base/derive/verify steps diverge from this shared shape.

pub mod ecdsa_rdfc_2019;
pub mod ecdsa_sd_2023;
pub mod eddsa_rdfc_2022;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::codec::multibase_base58;
use crate::error::{CryptoError, Error};
use crate::rdf::kernel::RdfCredential;
use crate::rdf::loader::DocumentLoader;
use crate::signer::{Signer, Verifier};

/// Options controlling a created proof's metadata (`spec.md` §4.5 step 1).
#[derive(Clone, Debug)]
pub struct ProofOptions {
    /// `verificationMethod`: a DID URL or `did:key` resolving to the
    /// signer's public key.
    pub verification_method: String,
    /// `proofPurpose`, e.g. `"assertionMethod"`.
    pub proof_purpose: String,
    /// `created`, defaulting to now if omitted.
    pub created: Option<DateTime<Utc>>,
    /// Cryptosuite name, e.g. `"eddsa-rdfc-2022"`.
    pub cryptosuite: &'static str,
    /// Optional `challenge`, for proofs bound to a presentation request.
    pub challenge: Option<String>,
    /// Optional `domain`, scoping the proof to a relying party.
    pub domain: Option<String>,
}

fn proof_configuration(options: &ProofOptions) -> Value {
    let created = options.created.unwrap_or_else(Utc::now).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let mut config = json!({
        "@context": ["https://w3id.org/security/data-integrity/v2"],
        "type": "DataIntegrityProof",
        "cryptosuite": options.cryptosuite,
        "created": created,
        "verificationMethod": options.verification_method,
        "proofPurpose": options.proof_purpose,
    });
    let obj = config.as_object_mut().expect("object literal");
    if let Some(challenge) = &options.challenge {
        obj.insert("challenge".into(), Value::String(challenge.clone()));
    }
    if let Some(domain) = &options.domain {
        obj.insert("domain".into(), Value::String(domain.clone()));
    }
    config
}

/// Produce a proof object (`proofValue` included) for `credential` using
/// the shared RDFC `TRANSFORM`/`HASH`/`PROOF SERIALIZATION` algorithm:
/// the signature covers the concatenation of the canonicalized proof
/// configuration's hash and the canonicalized document's hash.
///
/// # Errors
/// Returns [`Error::Rdf`] if canonicalization fails, or
/// [`Error::Crypto`]([`CryptoError::SigningFailed`]) if `signer` fails.
#[tracing::instrument(skip(credential, loader, signer))]
pub(crate) fn create_rdfc_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, options: &ProofOptions, signer: &dyn Signer,
) -> Result<Value, Error> {
    let mut proof_config = proof_configuration(options);
    let hash_data = credential.proof_signing_hash(&proof_config, loader)?;
    let signature = signer.sign(&hash_data).map_err(Error::Crypto)?;
    let proof_value = multibase_base58(&signature);
    proof_config
        .as_object_mut()
        .expect("object literal")
        .insert("proofValue".into(), Value::String(proof_value));
    tracing::debug!(cryptosuite = options.cryptosuite, "created data integrity proof");
    Ok(proof_config)
}

/// Verify a proof object previously produced by [`create_rdfc_proof`].
///
/// # Errors
/// Returns [`Error::Crypto`]([`CryptoError::VerificationFailed`]) on any
/// failure (missing `proofValue`, bad encoding, or a signature mismatch) —
/// never a more specific variant, per `spec.md` §7's error-oracle
/// resistance requirement.
#[tracing::instrument(skip(credential, loader, proof, verifier))]
pub(crate) fn verify_rdfc_proof(
    credential: &RdfCredential, loader: &dyn DocumentLoader, proof: &Value, verifier: &dyn Verifier,
) -> Result<(), Error> {
    let result = (|| -> Result<(), Error> {
        let Some(Value::String(proof_value)) = proof.get("proofValue") else {
            return Err(Error::Crypto(CryptoError::InvalidProofValue));
        };
        let signature = crate::codec::multibase_decode_expect(proof_value, multibase::Base::Base58Btc)
            .map_err(Error::Crypto)?;
        let mut proof_config = proof.clone();
        proof_config.as_object_mut().expect("proof is an object").remove("proofValue");
        let hash_data = credential.proof_signing_hash(&proof_config, loader)?;
        verifier.verify(&hash_data, &signature).map_err(Error::Crypto)
    })();
    result.map_err(|e| {
        tracing::warn!(error = %collapsed_name(&e), "data integrity proof verification failed");
        collapse_error(e)
    })
}

fn collapsed_name(error: &Error) -> &'static str {
    match error {
        Error::Crypto(_) => "crypto",
        Error::Rdf(_) => "rdf",
        Error::Validation(_) => "validation",
        Error::Sd(_) => "sd",
        Error::Context(_) => "context",
    }
}

fn collapse_error(error: Error) -> Error {
    match error {
        Error::Crypto(c) => Error::Crypto(c.collapse()),
        other => other,
    }
}
