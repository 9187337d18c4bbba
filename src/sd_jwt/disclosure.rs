//! # SD-JWT Disclosures
//!
//! A disclosure is the base64url-encoded JSON array a holder reveals (or
//! withholds) to prove a claim: `[salt, name, value]` for an object
//! property, `[salt, value]` for an array element (`spec.md` §3, §4.2).

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::SdError;

/// A single selectively-disclosable claim or array element.
#[derive(Clone, Debug, PartialEq)]
pub struct Disclosure {
    /// Per-disclosure random salt (base64url-encoded, as generated).
    pub salt: String,
    /// The claim name, for an object-property disclosure; `None` for an
    /// array-element disclosure.
    pub name: Option<String>,
    /// The disclosed value.
    pub value: Value,
}

impl Disclosure {
    /// Build an object-property disclosure.
    #[must_use]
    pub fn object(salt: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self { salt: salt.into(), name: Some(name.into()), value }
    }

    /// Build an array-element disclosure.
    #[must_use]
    pub fn array_element(salt: impl Into<String>, value: Value) -> Self {
        Self { salt: salt.into(), name: None, value }
    }

    /// The base64url-encoded disclosure, as it appears in a compact SD-JWT.
    #[must_use]
    pub fn encode(&self) -> String {
        let array = match &self.name {
            Some(name) => serde_json::json!([self.salt, name, self.value]),
            None => serde_json::json!([self.salt, self.value]),
        };
        let bytes = serde_json::to_vec(&array).expect("disclosure array serializes");
        Base64UrlUnpadded::encode_string(&bytes)
    }

    /// The SHA-256 digest of [`Disclosure::encode`], base64url-encoded —
    /// what appears in an `_sd` array or `"..."` array-element marker.
    #[must_use]
    pub fn digest(&self) -> String {
        Base64UrlUnpadded::encode_string(&Sha256::digest(self.encode().as_bytes()))
    }

    /// Parse a disclosure from its base64url-encoded compact form.
    ///
    /// # Errors
    /// Returns [`SdError::Base64EncodedEmpty`] if `raw` is empty or not
    /// valid base64url, or [`SdError::NotKnownInstruction`] if the decoded
    /// JSON is not a 2- or 3-element array.
    pub fn decode(raw: &str) -> Result<Self, SdError> {
        if raw.is_empty() {
            return Err(SdError::Base64EncodedEmpty);
        }
        let bytes = Base64UrlUnpadded::decode_vec(raw).map_err(|_| SdError::Base64EncodedEmpty)?;
        let array: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(|_| SdError::NotKnownInstruction)?;
        match array.len() {
            3 => {
                let salt = array[0].as_str().ok_or(SdError::NotKnownInstruction)?.to_string();
                let name = array[1].as_str().ok_or(SdError::NotKnownInstruction)?.to_string();
                Ok(Self { salt, name: Some(name), value: array[2].clone() })
            }
            2 => {
                let salt = array[0].as_str().ok_or(SdError::NotKnownInstruction)?.to_string();
                Ok(Self { salt, name: None, value: array[1].clone() })
            }
            _ => Err(SdError::NotKnownInstruction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_disclosure_round_trips() {
        let disclosure = Disclosure::object("salt_zyx", "given_name", Value::String("Sam".into()));
        let encoded = disclosure.encode();
        let decoded = Disclosure::decode(&encoded).unwrap();
        assert_eq!(decoded, disclosure);
    }

    #[test]
    fn array_element_disclosure_round_trips() {
        let disclosure = Disclosure::array_element("salt_abc", Value::String("US".into()));
        let encoded = disclosure.encode();
        let decoded = Disclosure::decode(&encoded).unwrap();
        assert_eq!(decoded, disclosure);
    }

    #[test]
    fn digest_is_stable() {
        let disclosure = Disclosure::object("salt_zyx", "given_name", Value::String("Sam".into()));
        assert_eq!(disclosure.digest(), disclosure.digest());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(Disclosure::decode(""), Err(SdError::Base64EncodedEmpty)));
    }
}
