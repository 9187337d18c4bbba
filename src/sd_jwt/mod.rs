//! # Selective-Disclosure JWT (SD-JWT-VC)
//!
//! The instruction-tree builder, disclosure codec, compact JWS carrier, and
//! verifier that together implement the SD-JWT credential format
//! (`spec.md` §4.2–§4.3). Independent of the RDF/Data-Integrity stack in
//! [`crate::rdf`] and [`crate::suites`] — an SD-JWT never touches JSON-LD.

pub mod builder;
pub mod disclosure;
pub mod instruction;
pub mod jws;
pub mod key_binding;
pub mod verifier;

pub use builder::{build, BuiltSdJwt, SdJwtClaims};
pub use disclosure::Disclosure;
pub use instruction::{ArrayElement, Instruction};
pub use key_binding::{build_key_binding_jwt, sd_hash, KeyBinding, KeyBindingClaims};
pub use verifier::{verify_presentation, SignaturePolicy, VerifiedSdJwt};
