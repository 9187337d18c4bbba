//! # Signer Capability
//!
//! The core never owns key material directly. Callers supply a [`Signer`]
//! capability — backed by software keys or an HSM/PKCS#11 module — and the
//! core asks it to sign opaque byte strings. See `spec.md` §4.1.
//!
//! ECDSA signatures are always returned in fixed-width `r‖s` form; DER is
//! never produced or accepted for JWT or Data Integrity output. RSA uses
//! PKCS#1 v1.5.

use std::fmt;

use crate::error::CryptoError;

pub mod software;

/// JOSE `alg` values this crate can produce and verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256.
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512.
    Rs512,
    /// ECDSA using P-256 and SHA-256.
    Es256,
    /// ECDSA using P-384 and SHA-384.
    Es384,
    /// ECDSA using P-521 and SHA-512.
    Es512,
    /// EdDSA using Ed25519.
    EdDsa,
}

impl Algorithm {
    /// The JOSE `alg` header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
            Self::EdDsa => "EdDSA",
        }
    }

    /// Select an RSA algorithm from the modulus bit size, per `spec.md`
    /// §4.1: `>= 4096` ⇒ RS512, `>= 3072` ⇒ RS384, else RS256.
    #[must_use]
    pub const fn from_rsa_bits(bits: u32) -> Self {
        if bits >= 4096 {
            Self::Rs512
        } else if bits >= 3072 {
            Self::Rs384
        } else {
            Self::Rs256
        }
    }

    /// Select an ECDSA algorithm from the curve name (`"P-256"`, `"P-384"`,
    /// `"P-521"`); any other curve name falls back to ES256.
    #[must_use]
    pub fn from_ec_curve(curve: &str) -> Self {
        match curve {
            "P-384" => Self::Es384,
            "P-521" => Self::Es512,
            _ => Self::Es256,
        }
    }

    /// The `⌈curveBits/8⌉`-byte width of a single `r`/`s` component for
    /// this algorithm's curve, if it is ECDSA.
    #[must_use]
    pub const fn ecdsa_component_width(self) -> Option<usize> {
        match self {
            Self::Es256 => Some(32),
            Self::Es384 => Some(48),
            Self::Es512 => Some(66),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque, algorithm-tagged public key as returned by [`Signer::public_key`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// Uncompressed SEC1 point (`0x04 ‖ X ‖ Y`) for an ECDSA curve.
    Ec {
        /// The curve this point is on.
        algorithm: Algorithm,
        /// Uncompressed SEC1 encoding.
        sec1: Vec<u8>,
    },
    /// Raw 32-byte Ed25519 public key.
    Ed25519(Vec<u8>),
    /// DER-encoded `SubjectPublicKeyInfo` for an RSA key.
    Rsa(Vec<u8>),
}

/// Capability to produce a signature over arbitrary bytes.
///
/// Implementations own their key material (software-held or an HSM
/// session) and must be safe to call repeatedly; per `spec.md` §5, a single
/// [`Signer`] instance must not be shared across concurrent, unrelated
/// issuances unless the caller knows the underlying module is reentrant.
pub trait Signer: Send + Sync {
    /// Sign `msg`, returning a fixed-width signature appropriate to
    /// [`Signer::algorithm`] (`r‖s` for ECDSA, raw PKCS#1 v1.5 for RSA, raw
    /// 64 bytes for EdDSA).
    ///
    /// # Errors
    /// Returns [`CryptoError::SigningFailed`] on device or key error.
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// The JOSE algorithm this signer was constructed for.
    fn algorithm(&self) -> Algorithm;

    /// An identifier for the key in use (JWK `kid`, HSM label, …).
    fn key_id(&self) -> String;

    /// The signer's public key, for embedding in proofs or resolving via a
    /// verification method.
    fn public_key(&self) -> PublicKey;
}

/// Capability to verify a signature produced by the matching [`Signer`].
pub trait Verifier: Send + Sync {
    /// Verify `sig` over `msg`.
    ///
    /// # Errors
    /// Returns [`CryptoError::VerificationFailed`] on any failure; never a
    /// more specific variant (error-oracle resistance, `spec.md` §7).
    fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError>;

    /// The JOSE algorithm this verifier expects.
    fn algorithm(&self) -> Algorithm;
}
