//! # JSON-LD Document Loader
//!
//! `spec.md` §4.4/§5/§9 call for a process-wide, cache-backed document
//! loader: safe for concurrent reads, writes serialized, and — since this
//! crate performs no network I/O of its own — seeded with the fixed set of
//! contexts a W3C VC 2.0 / Data Integrity document can reference. A host
//! that needs to resolve arbitrary remote contexts supplies its own
//! [`DocumentLoader`], exactly as it supplies a [`crate::signer::Signer`].

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ContextError;
use crate::rdf::vocab::{self, ContextDef};

/// Resolves a JSON-LD `@context` IRI to its term definitions.
pub trait DocumentLoader: Send + Sync {
    /// Load the context document at `iri`.
    ///
    /// # Errors
    /// Returns [`ContextError::NotFound`] if the loader has no entry for
    /// `iri`.
    fn load(&self, iri: &str) -> Result<ContextDef, ContextError>;
}

/// A [`DocumentLoader`] seeded with this crate's built-in contexts, backed
/// by an `RwLock`-guarded cache so additional contexts may be registered at
/// runtime (reads never block each other; writes are serialized).
pub struct CachingDocumentLoader {
    cache: RwLock<HashMap<String, ContextDef>>,
}

impl CachingDocumentLoader {
    /// Construct a loader pre-populated with the built-in VC/Data Integrity
    /// contexts.
    #[must_use]
    pub fn new() -> Self {
        let mut seed = HashMap::new();
        for iri in vocab::BUILTIN_CONTEXT_IRIS {
            if let Some(def) = vocab::builtin_context(iri) {
                seed.insert((*iri).to_string(), def);
            }
        }
        Self { cache: RwLock::new(seed) }
    }

    /// Register (or replace) a context document, for hosts that need to
    /// extend the built-in set without fetching over the network.
    pub fn register(&self, iri: impl Into<String>, def: ContextDef) {
        let mut cache = self.cache.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.insert(iri.into(), def);
    }
}

impl Default for CachingDocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for CachingDocumentLoader {
    fn load(&self, iri: &str) -> Result<ContextDef, ContextError> {
        let cache = self.cache.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        cache.get(iri).cloned().ok_or_else(|| ContextError::NotFound(iri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_context() {
        let loader = CachingDocumentLoader::new();
        assert!(loader.load("https://www.w3.org/ns/credentials/v2").is_ok());
    }

    #[test]
    fn unknown_context_fails_closed() {
        let loader = CachingDocumentLoader::new();
        assert!(matches!(
            loader.load("https://example.org/unknown"),
            Err(ContextError::NotFound(_))
        ));
    }

    #[test]
    fn register_extends_cache() {
        let loader = CachingDocumentLoader::new();
        loader.register("https://example.org/custom", ContextDef::default());
        assert!(loader.load("https://example.org/custom").is_ok());
    }
}
