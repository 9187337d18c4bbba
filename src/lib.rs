//! # Verifiable Credential Cryptography Core
//!
//! The credential cryptography engine for a Verifiable-Credential
//! issuance and verification service: SD-JWT-VC and W3C VCDM 2.0 with
//! Data Integrity proofs over canonicalized RDF (`spec.md` §1). HTTP/gRPC
//! fronting, persistence, SAML, configuration, and HSM plumbing are all
//! external collaborators this crate never touches directly — it consumes
//! a [`signer::Signer`] capability and a [`rdf::DocumentLoader`], and is
//! consumed in turn through the modules below.
//!
//! ## Façade
//!
//! `spec.md` §2/§6 describe the boundary as a narrow `issue` / `verify` /
//! `derive` / `validate` façade. Because the concrete key type differs per
//! cryptosuite (Ed25519 for `eddsa-rdfc-2022`; P-256 or P-384 for
//! `ecdsa-rdfc-2019`; P-256 for `ecdsa-sd-2023`), that façade is these
//! entry points rather than one uniformly-typed function:
//!
//! - **issue**: [`sd_jwt::build`] (SD-JWT), or a suite's `create_proof*`
//!   under [`suites`] (VC Data Integrity).
//! - **verify**: [`sd_jwt::verify_presentation`] (SD-JWT), or a suite's
//!   `verify_proof*` under [`suites`] (VC Data Integrity).
//! - **derive**: [`suites::ecdsa_sd_2023::derive::derive_proof`] — the
//!   only format with holder-side selective disclosure.
//! - **validate**: [`validator::validate_credential`] /
//!   [`validator::validate_presentation`].

pub mod codec;
pub mod error;
pub mod rdf;
pub mod sd_jwt;
pub mod signer;
pub mod suites;
pub mod validator;

pub use error::{Error, Result};
