//! Minimal scheme-aware URL shape check (`spec.md` §4.8 rule 1/3/4).
//!
//! Not a general URI parser — this crate never resolves or dereferences
//! these values, it only checks the shape the specification requires:
//! `http`/`https` need a non-empty authority, `did` needs a non-empty
//! method-specific string, anything else just needs a non-empty
//! scheme-specific part.

/// Check whether `value` has the URL shape `spec.md` §4.8 requires.
#[must_use]
pub fn looks_like_url(value: &str) -> bool {
    let Some(colon) = value.find(':') else { return false };
    let (scheme, rest) = value.split_at(colon);
    let rest = &rest[1..];
    if scheme.is_empty() {
        return false;
    }
    match scheme {
        "http" | "https" => {
            let Some(after_slashes) = rest.strip_prefix("//") else { return false };
            let authority_end = after_slashes.find('/').unwrap_or(after_slashes.len());
            !after_slashes[..authority_end].is_empty()
        }
        _ => !rest.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_with_authority() {
        assert!(looks_like_url("https://example.org/credentials/1"));
    }

    #[test]
    fn rejects_https_without_authority() {
        assert!(!looks_like_url("https:///no-authority"));
    }

    #[test]
    fn accepts_did_url() {
        assert!(looks_like_url("did:example:1234"));
    }

    #[test]
    fn rejects_bare_scheme() {
        assert!(!looks_like_url("did:"));
        assert!(!looks_like_url("not-a-url"));
    }
}
