//! # Error Taxonomy
//!
//! Errors are grouped the way the specification groups them — validation,
//! cryptographic, RDF, selective disclosure, and context — and rolled up
//! into a single [`Error`] so callers have one type to match on while still
//! being able to `matches!` a specific family.
//!
//! Cryptographic failures are collapsed to [`CryptoError::VerificationFailed`]
//! at the boundary: a bad signature, a bad hash, and a wrong key must be
//! indistinguishable to a caller, otherwise the error channel becomes an
//! oracle. Build the detailed variant internally for `tracing`, then
//! collapse it before it crosses the public API — see
//! [`CryptoError::collapse`].

use thiserror::Error;

/// Structural validation failures (VC 2.0 conformance, `spec.md` §4.8).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `@context` is absent.
    #[error("@context is missing")]
    MissingContext,
    /// First `@context` entry is not the VCDM 2.0 base context.
    #[error("first @context entry must be the base credentials context")]
    InvalidBaseContext,
    /// `type` is absent or does not include the expected base type.
    #[error("type is missing or does not include the required base type")]
    MissingType,
    /// `issuer` is absent.
    #[error("issuer is missing")]
    MissingIssuer,
    /// `validFrom` is absent where required.
    #[error("validFrom is missing")]
    MissingValidFrom,
    /// `validFrom`/`validUntil` fail to parse, or `validUntil < validFrom`.
    #[error("invalid validity period: {0}")]
    InvalidValidityPeriod(String),
    /// `credentialSubject` is absent.
    #[error("credentialSubject is missing")]
    MissingCredentialSubject,
    /// `credentialSubject` is present but empty.
    #[error("credentialSubject must not be empty")]
    EmptyCredentialSubject,
    /// A value required to be a URL fails to parse as one, at the given
    /// JSON pointer location.
    #[error("invalid URL at {pointer}: {reason}")]
    InvalidUrl {
        /// JSON pointer to the offending value.
        pointer: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A `relatedResource` digest did not match the fetched content.
    #[error("digest mismatch for related resource {id}")]
    DigestMismatch {
        /// The resource `id` that failed verification.
        id: String,
    },
    /// Two `relatedResource` entries share an `id`.
    #[error("duplicate relatedResource id: {0}")]
    DuplicateRelatedResource(String),
    /// A structural constraint failed at a specific location, collected so
    /// the caller can enumerate every failure rather than stopping at the
    /// first one.
    #[error("validation failed at {pointer}: {reason}")]
    At {
        /// JSON pointer to the offending value.
        pointer: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Cryptographic failures (signing, proof verification, key handling).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A `cryptosuite` name this crate does not implement.
    #[error("unsupported cryptosuite: {0}")]
    UnsupportedCryptosuite(String),
    /// A signature (JWS, Data Integrity base/derived proof) failed to
    /// verify. Never use a more specific variant at a public boundary.
    #[error("verification failed")]
    VerificationFailed,
    /// A proof's `proofValue` could not be decoded (bad multibase prefix,
    /// bad CBOR shape, wrong tag).
    #[error("invalid proof value")]
    InvalidProofValue,
    /// No proof was found on a credential where one was expected.
    #[error("proof not found")]
    ProofNotFound,
    /// A key was malformed (wrong length, bad curve point, bad PEM/DER).
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    /// The configured [`crate::signer::Signer`] failed to produce a
    /// signature (device or key error).
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

impl CryptoError {
    /// Collapse any verification-family variant to the single
    /// oracle-resistant [`CryptoError::VerificationFailed`]. Construction
    /// errors (`UnsupportedCryptosuite`, `InvalidKeyFormat`,
    /// `SigningFailed`) are left intact since they reflect caller input, not
    /// an attacker-observable property of a signature.
    #[must_use]
    pub fn collapse(self) -> Self {
        match self {
            Self::VerificationFailed | Self::InvalidProofValue | Self::ProofNotFound => {
                Self::VerificationFailed
            }
            other => other,
        }
    }
}

/// RDF processing failures (`spec.md` §4.4).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdfError {
    /// URDNA2015 canonicalization could not complete (malformed dataset).
    #[error("RDF canonicalization failed: {0}")]
    CanonicalizationFailed(String),
    /// A dataset was malformed (dangling blank node reference, bad term).
    #[error("invalid RDF dataset: {0}")]
    InvalidDataset(String),
    /// JSON-LD to RDF conversion failed.
    #[error("JSON-LD conversion failed: {0}")]
    JsonLdConversionFailed(String),
}

/// Selective-disclosure failures (SD-JWT and `ecdsa-sd-2023`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdError {
    /// An instruction tree node used a variant tag this crate does not
    /// recognize.
    #[error("not a known instruction variant")]
    NotKnownInstruction,
    /// An instruction node carried both `value` and `children`.
    #[error("node has both a value and children")]
    ValueAndChildrenPresent,
    /// An SD-JWT presentation had an empty base64url segment.
    #[error("base64url segment is empty")]
    Base64EncodedEmpty,
    /// An SD-JWT signature did not verify.
    #[error("token is not valid")]
    TokenNotValid,
    /// A JSON Pointer used to select a mandatory field could not be parsed.
    #[error("invalid JSON pointer: {0}")]
    InvalidJsonPointer(String),
    /// A holder attempted to withhold a mandatory quad.
    #[error("mandatory pointer was not disclosed")]
    MandatoryPointerDisclosed,
    /// A derive-time reveal selection was invalid (out of range, empty).
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// Derivation of a selective-disclosure presentation failed.
    #[error("derived proof failed: {0}")]
    DerivedProofFailed(String),
}

/// JSON-LD context resolution failures (`spec.md` §4.4, §4.9).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The document loader has no entry for the requested IRI and does not
    /// fetch over the network.
    #[error("context not found: {0}")]
    NotFound(String),
    /// A cached context's digest no longer matches what was loaded.
    #[error("context hash mismatch for {0}")]
    HashMismatch(String),
}

/// Top-level error for every public operation in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Structural validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Cryptographic failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// RDF processing failure.
    #[error(transparent)]
    Rdf(#[from] RdfError),
    /// Selective disclosure failure.
    #[error(transparent)]
    Sd(#[from] SdError),
    /// Context resolution failure.
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
