//! Human-readable rendering of terms and bindings.
//!
//! `Display` on [`Term`] and [`Mapping`] writes full IRIs; [`PrefixMap`]
//! shortens them with caller-supplied prefixes:
//!
//! ```text
//! {?s=ex:a, ?xs=<ex:b, ph:any-trail>, ?o=none}
//! ```
//!
//! Concrete lists render as `(a, b)`, unexpanded lists as `<a, b>`.

use std::fmt;

use crate::graph::RDF_NS;
use crate::mapping::Mapping;
use crate::model::OTTR_NS;
use crate::term::{Literal, Term, PLACEHOLDER_NS};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Namespace prefixes, longest namespace wins.
#[derive(Debug, Clone)]
pub struct PrefixMap {
    prefixes: Vec<(String, String)>,
}

impl Default for PrefixMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert("rdf", RDF_NS);
        map.insert("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
        map.insert("xsd", "http://www.w3.org/2001/XMLSchema#");
        map.insert("owl", "http://www.w3.org/2002/07/owl#");
        map.insert("ottr", OTTR_NS);
        map.insert("ph", PLACEHOLDER_NS);
        map
    }
}

impl PrefixMap {
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Add or replace `prefix`.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        self.prefixes.retain(|(p, _)| *p != prefix);
        self.prefixes.push((prefix, namespace.into()));
        self.prefixes
            .sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    }

    pub fn shorten(&self, iri: &str) -> Option<String> {
        self.prefixes.iter().find_map(|(prefix, ns)| {
            iri.strip_prefix(ns.as_str())
                .map(|local| format!("{prefix}:{local}"))
        })
    }

    pub fn term<'a>(&'a self, term: &'a Term) -> Rendered<'a, Term> {
        Rendered {
            value: term,
            prefixes: Some(self),
        }
    }

    pub fn mapping<'a>(&'a self, mapping: &'a Mapping) -> Rendered<'a, Mapping> {
        Rendered {
            value: mapping,
            prefixes: Some(self),
        }
    }

    fn iri(&self, iri: &str) -> String {
        self.shorten(iri).unwrap_or_else(|| format!("<{iri}>"))
    }
}

/// A value paired with an optional prefix table.
pub struct Rendered<'a, T> {
    value: &'a T,
    prefixes: Option<&'a PrefixMap>,
}

fn write_iri(f: &mut fmt::Formatter<'_>, iri: &str, prefixes: Option<&PrefixMap>) -> fmt::Result {
    match prefixes {
        Some(p) => f.write_str(&p.iri(iri)),
        None => write!(f, "<{iri}>"),
    }
}

fn write_literal(
    f: &mut fmt::Formatter<'_>,
    literal: &Literal,
    prefixes: Option<&PrefixMap>,
) -> fmt::Result {
    write!(f, "{:?}", literal.value)?;
    if let Some(lang) = &literal.language {
        write!(f, "@{lang}")?;
    } else if let Some(dt) = literal.datatype.as_deref().filter(|dt| *dt != XSD_STRING) {
        f.write_str("^^")?;
        write_iri(f, dt, prefixes)?;
    }
    Ok(())
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term, prefixes: Option<&PrefixMap>) -> fmt::Result {
    match term {
        Term::Iri(iri) => write_iri(f, iri, prefixes),
        Term::Literal(literal) => write_literal(f, literal, prefixes),
        Term::BlankNode(label) => write!(f, "_:{label}"),
        Term::None => f.write_str("none"),
        Term::Placeholder(p) => write_iri(f, &p.iri(), prefixes),
        Term::Var(var) => write!(f, "?{}", var.name()),
        Term::List(list) => {
            let (open, close) = if list.is_unexpanded() { ("<", ">") } else { ("(", ")") };
            f.write_str(open)?;
            for (i, element) in list.elements().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_term(f, element, prefixes)?;
            }
            f.write_str(close)
        }
    }
}

fn write_mapping(
    f: &mut fmt::Formatter<'_>,
    mapping: &Mapping,
    prefixes: Option<&PrefixMap>,
) -> fmt::Result {
    f.write_str("{")?;
    for (i, (var, term)) in mapping.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "?{}=", var.name())?;
        write_term(f, term, prefixes)?;
    }
    f.write_str("}")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self, None)
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_mapping(f, self, None)
    }
}

impl fmt::Display for Rendered<'_, Term> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self.value, self.prefixes)
    }
}

impl fmt::Display for Rendered<'_, Mapping> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_mapping(f, self.value, self.prefixes)
    }
}
