//! # Supplemental Structural Types
//!
//! Named types for document shapes `spec.md` calls out explicitly rather
//! than validating ad hoc: a language-tagged string (`name`/`description`,
//! rule 9) and a status list reference (`credentialStatus`, rule 7).

use serde_json::Value;

/// A single `name`/`description` entry: either a bare string or a
/// language-tagged value object (`{"@value": ..., "@language": ...}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LangString {
    /// A plain string with no language tag.
    Plain(String),
    /// A language-tagged value object.
    Tagged {
        /// `@value`.
        value: String,
        /// `@language`, if present.
        language: Option<String>,
        /// `@direction`, if present.
        direction: Option<String>,
    },
}

impl LangString {
    const TAGGED_KEYS: &'static [&'static str] = &["@value", "@language", "@direction", "@type", "@index"];

    /// Parse `value` as a [`LangString`], returning `None` if it is neither
    /// a string nor a well-formed language-tagged value object.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Plain(s.clone())),
            Value::Object(map) => {
                if map.is_empty() || !map.keys().all(|k| Self::TAGGED_KEYS.contains(&k.as_str())) {
                    return None;
                }
                let value = map.get("@value")?.as_str()?.to_string();
                let language = map.get("@language").and_then(Value::as_str).map(String::from);
                let direction = map.get("@direction").and_then(Value::as_str).map(String::from);
                Some(Self::Tagged { value, language, direction })
            }
            _ => None,
        }
    }
}

/// A `credentialStatus` entry: an opaque reference into a status mechanism
/// (e.g. a Bitstring Status List), identified by `type` and an optional
/// dereferenceable `id` (`spec.md` §4.8 rule 7).
#[derive(Debug, Clone)]
pub struct StatusListReference {
    /// `id`, if present — must be a URL when given.
    pub id: Option<String>,
    /// `type`: the status mechanism this entry refers to.
    pub status_type: String,
}

impl StatusListReference {
    /// Parse `value` as a [`StatusListReference`], returning `None` if it is
    /// not an object or carries no `type`.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else { return None };
        let status_type = obj.get("type").and_then(Value::as_str)?.to_string();
        let id = obj.get("id").and_then(Value::as_str).map(String::from);
        Some(Self { id, status_type })
    }
}
