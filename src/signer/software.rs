//! # Software Signers
//!
//! Reference [`Signer`]/[`Verifier`] implementations over in-memory keys,
//! used by this crate's own tests and suitable as a starting point for a
//! host that does not need an HSM. A PKCS#11-backed implementation would
//! satisfy the same traits, scoping session login/logout to its own
//! lifetime (`spec.md` §4.1, §9) — that adapter lives outside this crate.

use ed25519_dalek::{Signature as Ed25519Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand_core::{OsRng, RngCore};
use rsa::pkcs1v15;
use rsa::signature::{RandomizedSigner, Verifier as RsaVerifierTrait};
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::{Algorithm, PublicKey};
use crate::error::CryptoError;

/// An in-memory Ed25519 signer.
pub struct Ed25519Signer {
    signing_key: SigningKey,
    key_id: String,
}

impl Ed25519Signer {
    /// Generate a fresh Ed25519 keypair.
    #[must_use]
    pub fn generate(key_id: impl Into<String>) -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self { signing_key: SigningKey::from_bytes(&seed), key_id: key_id.into() }
    }

    /// The matching verifier for this signer's public key.
    #[must_use]
    pub fn verifier(&self) -> Ed25519Verifier {
        Ed25519Verifier { verifying_key: self.signing_key.verifying_key() }
    }
}

impl super::Signer for Ed25519Signer {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.signing_key.sign(msg).to_bytes().to_vec())
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDsa
    }

    fn key_id(&self) -> String {
        self.key_id.clone()
    }

    fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.signing_key.verifying_key().to_bytes().to_vec())
    }
}

/// An in-memory Ed25519 verifier.
pub struct Ed25519Verifier {
    verifying_key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Construct a verifier from a raw 32-byte public key.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKeyFormat`] if `bytes` is not a valid
    /// compressed Edwards point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("ed25519 key must be 32 bytes".into()))?;
        let verifying_key = VerifyingKey::from_bytes(&arr)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Ok(Self { verifying_key })
    }
}

impl super::Verifier for Ed25519Verifier {
    fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let arr: [u8; 64] =
            sig.try_into().map_err(|_| CryptoError::VerificationFailed)?;
        let signature = Ed25519Signature::from_bytes(&arr);
        self.verifying_key
            .verify(msg, &signature)
            .map_err(|_| CryptoError::VerificationFailed)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDsa
    }
}

/// An in-memory ECDSA P-256 signer (ES256).
pub struct EcdsaP256Signer {
    signing_key: p256::ecdsa::SigningKey,
    key_id: String,
}

impl EcdsaP256Signer {
    /// Generate a fresh P-256 keypair.
    #[must_use]
    pub fn generate(key_id: impl Into<String>) -> Self {
        let signing_key = loop {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            if let Ok(key) = p256::ecdsa::SigningKey::from_bytes((&bytes).into()) {
                break key;
            }
        };
        Self { signing_key, key_id: key_id.into() }
    }

    /// Sign a pre-computed digest directly (no internal re-hashing), as
    /// required by the `ecdsa-sd-2023` base-proof signature (`spec.md`
    /// §4.7 step 6).
    ///
    /// # Errors
    /// Returns [`CryptoError::SigningFailed`] if the underlying primitive
    /// rejects the digest.
    pub fn sign_prehash(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sig: p256::ecdsa::Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(sig.to_bytes().to_vec())
    }

    /// The uncompressed SEC1 public key point.
    #[must_use]
    pub fn public_key_sec1(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }
}

impl super::Signer for EcdsaP256Signer {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = Sha256::digest(msg);
        self.sign_prehash(&digest)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Es256
    }

    fn key_id(&self) -> String {
        self.key_id.clone()
    }

    fn public_key(&self) -> PublicKey {
        PublicKey::Ec { algorithm: Algorithm::Es256, sec1: self.public_key_sec1() }
    }
}

/// An in-memory ECDSA P-256 verifier.
pub struct EcdsaP256Verifier {
    verifying_key: p256::ecdsa::VerifyingKey,
}

impl EcdsaP256Verifier {
    /// Construct a verifier from an uncompressed SEC1 point.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKeyFormat`] if `sec1` is not a valid
    /// point on P-256.
    pub fn from_sec1(sec1: &[u8]) -> Result<Self, CryptoError> {
        let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(sec1)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    /// Verify a pre-computed digest directly.
    ///
    /// # Errors
    /// Returns [`CryptoError::VerificationFailed`] on any mismatch.
    pub fn verify_prehash(&self, digest: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let signature = p256::ecdsa::Signature::from_slice(sig)
            .map_err(|_| CryptoError::VerificationFailed)?;
        self.verifying_key
            .verify_prehash(digest, &signature)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl super::Verifier for EcdsaP256Verifier {
    fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let digest = Sha256::digest(msg);
        self.verify_prehash(&digest, sig)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Es256
    }
}

/// An in-memory ECDSA P-384 signer (ES384), used by the `ecdsa-sd-2023`
/// issuer and ephemeral keys when the stronger curve is configured.
pub struct EcdsaP384Signer {
    signing_key: p384::ecdsa::SigningKey,
    key_id: String,
}

impl EcdsaP384Signer {
    /// Generate a fresh P-384 keypair.
    #[must_use]
    pub fn generate(key_id: impl Into<String>) -> Self {
        let signing_key = loop {
            let mut bytes = [0u8; 48];
            OsRng.fill_bytes(&mut bytes);
            if let Ok(key) = p384::ecdsa::SigningKey::from_bytes((&bytes).into()) {
                break key;
            }
        };
        Self { signing_key, key_id: key_id.into() }
    }

    /// Sign a pre-computed digest directly.
    ///
    /// # Errors
    /// Returns [`CryptoError::SigningFailed`] if the underlying primitive
    /// rejects the digest.
    pub fn sign_prehash(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sig: p384::ecdsa::Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(sig.to_bytes().to_vec())
    }

    /// The uncompressed SEC1 public key point.
    #[must_use]
    pub fn public_key_sec1(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }
}

impl super::Signer for EcdsaP384Signer {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = Sha384::digest(msg);
        self.sign_prehash(&digest)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Es384
    }

    fn key_id(&self) -> String {
        self.key_id.clone()
    }

    fn public_key(&self) -> PublicKey {
        PublicKey::Ec { algorithm: Algorithm::Es384, sec1: self.public_key_sec1() }
    }
}

/// An in-memory ECDSA P-384 verifier.
pub struct EcdsaP384Verifier {
    verifying_key: p384::ecdsa::VerifyingKey,
}

impl EcdsaP384Verifier {
    /// Construct a verifier from an uncompressed SEC1 point.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKeyFormat`] if `sec1` is not a valid
    /// point on P-384.
    pub fn from_sec1(sec1: &[u8]) -> Result<Self, CryptoError> {
        let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(sec1)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    /// Verify a pre-computed digest directly.
    ///
    /// # Errors
    /// Returns [`CryptoError::VerificationFailed`] on any mismatch.
    pub fn verify_prehash(&self, digest: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let signature = p384::ecdsa::Signature::from_slice(sig)
            .map_err(|_| CryptoError::VerificationFailed)?;
        self.verifying_key
            .verify_prehash(digest, &signature)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl super::Verifier for EcdsaP384Verifier {
    fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let digest = Sha384::digest(msg);
        self.verify_prehash(&digest, sig)
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Es384
    }
}

/// An in-memory RSA signer, wrapping an already-generated [`rsa::RsaPrivateKey`].
/// Key generation is intentionally left to the caller: it is slow and the
/// RSA crate's RNG bound is independent of this crate's own randomness use.
pub struct RsaSigner {
    private_key: rsa::RsaPrivateKey,
    algorithm: Algorithm,
    key_id: String,
}

impl RsaSigner {
    /// Wrap an existing RSA private key, selecting the algorithm from its
    /// modulus size per `spec.md` §4.1.
    #[must_use]
    pub fn new(private_key: rsa::RsaPrivateKey, key_id: impl Into<String>) -> Self {
        use rsa::traits::PublicKeyParts;
        let bits = u32::try_from(private_key.n().bits()).unwrap_or(u32::MAX);
        Self { algorithm: Algorithm::from_rsa_bits(bits), private_key, key_id: key_id.into() }
    }
}

impl super::Signer for RsaSigner {
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let sig = match self.algorithm {
            Algorithm::Rs384 => {
                let signing_key = pkcs1v15::SigningKey::<Sha384>::new(self.private_key.clone());
                signing_key.sign_with_rng(&mut rand::rng(), msg).to_vec()
            }
            Algorithm::Rs512 => {
                let signing_key = pkcs1v15::SigningKey::<Sha512>::new(self.private_key.clone());
                signing_key.sign_with_rng(&mut rand::rng(), msg).to_vec()
            }
            _ => {
                let signing_key = pkcs1v15::SigningKey::<Sha256>::new(self.private_key.clone());
                signing_key.sign_with_rng(&mut rand::rng(), msg).to_vec()
            }
        };
        Ok(sig)
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn key_id(&self) -> String {
        self.key_id.clone()
    }

    fn public_key(&self) -> PublicKey {
        use rsa::pkcs8::EncodePublicKey;
        let spki = rsa::RsaPublicKey::from(&self.private_key)
            .to_public_key_der()
            .map(|d| d.as_bytes().to_vec())
            .unwrap_or_default();
        PublicKey::Rsa(spki)
    }
}

/// An in-memory RSA verifier.
pub struct RsaVerifier {
    public_key: rsa::RsaPublicKey,
    algorithm: Algorithm,
}

impl RsaVerifier {
    /// Wrap an RSA public key for verification at the given algorithm.
    #[must_use]
    pub const fn new(public_key: rsa::RsaPublicKey, algorithm: Algorithm) -> Self {
        Self { public_key, algorithm }
    }
}

impl super::Verifier for RsaVerifier {
    fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<(), CryptoError> {
        let signature = pkcs1v15::Signature::try_from(sig).map_err(|_| CryptoError::VerificationFailed)?;
        let result = match self.algorithm {
            Algorithm::Rs384 => {
                pkcs1v15::VerifyingKey::<Sha384>::new(self.public_key.clone()).verify(msg, &signature)
            }
            Algorithm::Rs512 => {
                pkcs1v15::VerifyingKey::<Sha512>::new(self.public_key.clone()).verify(msg, &signature)
            }
            _ => pkcs1v15::VerifyingKey::<Sha256>::new(self.public_key.clone()).verify(msg, &signature),
        };
        result.map_err(|_| CryptoError::VerificationFailed)
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Signer, Verifier};
    use super::*;

    #[test]
    fn ed25519_round_trip() {
        let signer = Ed25519Signer::generate("key-1");
        let sig = signer.sign(b"hello").unwrap();
        signer.verifier().verify(b"hello", &sig).unwrap();
        assert!(signer.verifier().verify(b"tampered", &sig).is_err());
    }

    #[test]
    fn p256_round_trip() {
        let signer = EcdsaP256Signer::generate("key-1");
        let sig = signer.sign(b"hello").unwrap();
        let verifier = EcdsaP256Verifier::from_sec1(&signer.public_key_sec1()).unwrap();
        verifier.verify(b"hello", &sig).unwrap();
        assert!(verifier.verify(b"tampered", &sig).is_err());
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn p384_round_trip() {
        let signer = EcdsaP384Signer::generate("key-1");
        let sig = signer.sign(b"hello").unwrap();
        let verifier = EcdsaP384Verifier::from_sec1(&signer.public_key_sec1()).unwrap();
        verifier.verify(b"hello", &sig).unwrap();
        assert_eq!(sig.len(), 96);
    }
}
