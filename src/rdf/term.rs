//! # N-Quad Term Model and Serialization
//!
//! Thin helpers around [`oxrdf`]'s term types: a canonical-text serializer
//! that produces exactly the line format `spec.md` §3 requires ("one quad
//! per line, trailing `.`, sorted as produced by the algorithm") without
//! depending on any particular `Display` formatting from upstream.

use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};

/// Render a single RDF term (subject/object position) as N-Quads text.
#[must_use]
pub fn term_to_text(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => format!("<{}>", n.as_str()),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        Term::Literal(l) => literal_to_text(l),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

/// Render a subject term as N-Quads text.
#[must_use]
pub fn subject_to_text(subject: &Subject) -> String {
    match subject {
        Subject::NamedNode(n) => format!("<{}>", n.as_str()),
        Subject::BlankNode(b) => format!("_:{}", b.as_str()),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

/// Render a graph name as N-Quads text, or `None` for the default graph
/// (which contributes no fourth term).
#[must_use]
pub fn graph_name_to_text(graph: &GraphName) -> Option<String> {
    match graph {
        GraphName::NamedNode(n) => Some(format!("<{}>", n.as_str())),
        GraphName::BlankNode(b) => Some(format!("_:{}", b.as_str())),
        GraphName::DefaultGraph => None,
    }
}

fn literal_to_text(literal: &Literal) -> String {
    let escaped = escape_literal(literal.value());
    if let Some(lang) = literal.language() {
        format!("\"{escaped}\"@{lang}")
    } else if literal.datatype().as_str() == "http://www.w3.org/2001/XMLSchema#string" {
        format!("\"{escaped}\"")
    } else {
        format!("\"{escaped}\"^^<{}>", literal.datatype().as_str())
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a full quad (without trailing period or newline).
#[must_use]
pub fn quad_to_text(quad: &Quad) -> String {
    let s = subject_to_text(&quad.subject);
    let p = format!("<{}>", quad.predicate.as_str());
    let o = term_to_text(&quad.object);
    match graph_name_to_text(&quad.graph_name) {
        Some(g) => format!("{s} {p} {o} {g}"),
        None => format!("{s} {p} {o}"),
    }
}

/// Render a full quad as a terminated N-Quads line (`... .\n`).
#[must_use]
pub fn quad_to_line(quad: &Quad) -> String {
    format!("{} .\n", quad_to_text(quad))
}

/// Every blank node label mentioned anywhere in `quad` (subject, object,
/// graph name).
pub fn blank_labels_in(quad: &Quad) -> impl Iterator<Item = String> + '_ {
    let subj = match &quad.subject {
        Subject::BlankNode(b) => Some(b.as_str().to_string()),
        _ => None,
    };
    let obj = match &quad.object {
        Term::BlankNode(b) => Some(b.as_str().to_string()),
        _ => None,
    };
    let graph = match &quad.graph_name {
        GraphName::BlankNode(b) => Some(b.as_str().to_string()),
        _ => None,
    };
    [subj, obj, graph].into_iter().flatten()
}

/// Rewrite every blank node in `quad` whose label appears in `map`, leaving
/// unmapped labels (and non-blank-node terms) untouched.
#[must_use]
pub fn relabel_quad(quad: &Quad, map: &std::collections::HashMap<String, String>) -> Quad {
    let subject = match &quad.subject {
        Subject::BlankNode(b) => match map.get(b.as_str()) {
            Some(new_label) => Subject::BlankNode(BlankNode::new_unchecked(new_label.clone())),
            None => quad.subject.clone(),
        },
        other => other.clone(),
    };
    let object = match &quad.object {
        Term::BlankNode(b) => match map.get(b.as_str()) {
            Some(new_label) => Term::BlankNode(BlankNode::new_unchecked(new_label.clone())),
            None => quad.object.clone(),
        },
        other => other.clone(),
    };
    let graph_name = match &quad.graph_name {
        GraphName::BlankNode(b) => match map.get(b.as_str()) {
            Some(new_label) => GraphName::BlankNode(BlankNode::new_unchecked(new_label.clone())),
            None => quad.graph_name.clone(),
        },
        other => other.clone(),
    };
    Quad { subject, predicate: quad.predicate.clone(), object, graph_name }
}

/// Build a named-node IRI term, panicking only on a malformed static IRI
/// (a programmer error, never caller input).
#[must_use]
pub fn iri(s: &str) -> NamedNode {
    NamedNode::new_unchecked(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escaping() {
        let lit = Literal::new_simple_literal("line\nbreak \"quoted\"");
        assert_eq!(literal_to_text(&lit), "\"line\\nbreak \\\"quoted\\\"\"");
    }

    #[test]
    fn quad_line_has_trailing_period_and_newline() {
        let quad = Quad {
            subject: Subject::NamedNode(iri("http://example.org/s")),
            predicate: iri("http://example.org/p"),
            object: Term::NamedNode(iri("http://example.org/o")),
            graph_name: GraphName::DefaultGraph,
        };
        let line = quad_to_line(&quad);
        assert!(line.ends_with(" .\n"));
        assert_eq!(
            line,
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n"
        );
    }
}
