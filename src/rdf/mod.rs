//! # RDF Credential Kernel
//!
//! Turns a JSON-LD Verifiable Credential into the canonical RDF form the
//! Data Integrity cryptosuites sign over, and back (`spec.md` §4.4).

pub mod canon;
pub mod jsonld;
pub mod kernel;
pub mod loader;
pub mod term;
pub mod vocab;

pub use kernel::RdfCredential;
pub use loader::{CachingDocumentLoader, DocumentLoader};
