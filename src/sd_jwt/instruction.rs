//! # Claim Instruction Tree
//!
//! The rooted, ordered tree an issuer builds to describe how a claim set
//! should be partitioned into always-visible, selectively-disclosable, and
//! recursively-disclosable fragments (`spec.md` §3). Represented as a
//! tagged sum rather than an untyped node list: every traversal site
//! (`builder::build`) matches exhaustively, so adding a variant is a
//! compile error everywhere it isn't handled.

use serde_json::Value;

/// One element of a [`Instruction::ChildArray`].
#[derive(Clone, Debug)]
pub struct ArrayElement {
    /// The element's value.
    pub value: Value,
    /// Whether this element is selectively disclosed (appears in the JWT
    /// as `{"...": claim_hash}` rather than inline).
    pub selective_disclosure: bool,
}

impl ArrayElement {
    /// An always-visible array element.
    #[must_use]
    pub fn plain(value: Value) -> Self {
        Self { value, selective_disclosure: false }
    }

    /// A selectively-disclosable array element.
    #[must_use]
    pub fn selective(value: Value) -> Self {
        Self { value, selective_disclosure: true }
    }
}

/// A node in the claim instruction tree (`spec.md` §3).
///
/// A node has either a value or children, never both — enforced by
/// construction here rather than by a shared struct with optional fields,
/// since the two shapes never coexist for any variant.
#[derive(Clone, Debug)]
pub enum Instruction {
    /// A leaf scalar. `uid` is an opaque per-build identifier used only for
    /// caller-side bookkeeping; it plays no role in hashing.
    Child { name: String, value: Value, selective_disclosure: bool, uid: String },
    /// An object property. When `selective_disclosure` is set, the whole
    /// subtree is disclosed as a single unit; otherwise its children are
    /// placed inline in the enclosing object.
    Parent { name: String, children: Vec<Instruction>, selective_disclosure: bool },
    /// An object property whose children are each independently
    /// disclosable; this node's own disclosure references its children by
    /// claim hash rather than embedding them.
    Recursive { name: String, children: Vec<Instruction>, uid: String },
    /// An array leaf whose elements may each be selectively disclosed.
    ChildArray { name: String, children: Vec<ArrayElement> },
    /// An array of objects, each object itself a list of instructions.
    ParentArray { name: String, children: Vec<Vec<Instruction>> },
}

impl Instruction {
    /// An always-visible leaf scalar.
    #[must_use]
    pub fn child(name: impl Into<String>, value: Value) -> Self {
        Self::Child { name: name.into(), value, selective_disclosure: false, uid: String::new() }
    }

    /// A selectively-disclosable leaf scalar.
    #[must_use]
    pub fn selective_child(name: impl Into<String>, value: Value) -> Self {
        Self::Child { name: name.into(), value, selective_disclosure: true, uid: String::new() }
    }

    /// An inline (non-selectively-disclosed) object property.
    #[must_use]
    pub fn parent(name: impl Into<String>, children: Vec<Instruction>) -> Self {
        Self::Parent { name: name.into(), children, selective_disclosure: false }
    }

    /// An atomically-disclosed object property.
    #[must_use]
    pub fn selective_parent(name: impl Into<String>, children: Vec<Instruction>) -> Self {
        Self::Parent { name: name.into(), children, selective_disclosure: true }
    }

    /// A recursively-disclosable object property.
    #[must_use]
    pub fn recursive(name: impl Into<String>, children: Vec<Instruction>) -> Self {
        Self::Recursive { name: name.into(), children, uid: String::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_expected_flags() {
        let child = Instruction::selective_child("given_name", Value::String("Sam".into()));
        match child {
            Instruction::Child { selective_disclosure, .. } => assert!(selective_disclosure),
            _ => panic!("expected Child"),
        }
    }
}
