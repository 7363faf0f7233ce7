//! Term model.
//!
//! Every value that can appear in a binding is a [`Term`]: ground RDF terms
//! (IRIs, literals, blank nodes), the `none` sentinel, lists, and the five
//! placeholder sentinels of the lattice. Template variables are terms too
//! ([`Term::Var`]) so that instance arguments can mix variables and values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Namespace of the placeholder sentinels.
pub const PLACEHOLDER_NS: &str = "http://example.org/placeholder/";

/// A template variable (rendered `?name`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Var(String);

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Var {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An RDF literal. Plain literals carry neither a datatype nor a language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// The placeholder sentinels.
///
/// `Any`, `AnyNb`, `AnyNo` and `AnyNbNo` form a diamond
/// (`AnyNbNo <= AnyNb <= Any`, `AnyNbNo <= AnyNo <= Any`). `AnyTrail` only
/// ever appears as the last element of a list and means "the rest of this
/// list is unconstrained".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    Any,
    AnyNb,
    AnyNo,
    AnyNbNo,
    AnyTrail,
}

impl Placeholder {
    pub fn local_name(self) -> &'static str {
        match self {
            Placeholder::Any => "any",
            Placeholder::AnyNb => "any-nb",
            Placeholder::AnyNo => "any-no",
            Placeholder::AnyNbNo => "any-nbno",
            Placeholder::AnyTrail => "any-trail",
        }
    }

    pub fn iri(self) -> String {
        format!("{PLACEHOLDER_NS}{}", self.local_name())
    }
}

/// A finite list of terms.
///
/// `unexpanded` marks a generalization produced by list unexpansion: its
/// elements may be placeholders and a trailing [`ANY_TRAIL`] hides further
/// elements. `id` is the identity of a list read from a graph (its head node);
/// it takes no part in equality, ordering or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTerm {
    elements: Vec<Term>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    unexpanded: bool,
}

impl ListTerm {
    pub fn new(elements: Vec<Term>) -> Self {
        Self {
            elements,
            id: None,
            unexpanded: false,
        }
    }

    pub fn unexpanded(elements: Vec<Term>) -> Self {
        Self {
            elements,
            id: None,
            unexpanded: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn elements(&self) -> &[Term] {
        &self.elements
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_unexpanded(&self) -> bool {
        self.unexpanded
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Splits off a trailing [`ANY_TRAIL`]: `(prefix, has_trail)`.
    pub fn split_trail(&self) -> (&[Term], bool) {
        split_trail(&self.elements)
    }
}

/// Splits a trailing [`ANY_TRAIL`] off `elements`.
pub fn split_trail(elements: &[Term]) -> (&[Term], bool) {
    match elements.split_last() {
        Some((last, prefix)) if last.is_trail() => (prefix, true),
        _ => (elements, false),
    }
}

impl PartialEq for ListTerm {
    fn eq(&self, other: &Self) -> bool {
        self.unexpanded == other.unexpanded && self.elements == other.elements
    }
}

impl Eq for ListTerm {}

impl Hash for ListTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unexpanded.hash(state);
        self.elements.hash(state);
    }
}

impl PartialOrd for ListTerm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ListTerm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unexpanded
            .cmp(&other.unexpanded)
            .then_with(|| self.elements.cmp(&other.elements))
    }
}

/// A term of the reverse-evaluation model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Term {
    Iri(String),
    Literal(Literal),
    BlankNode(String),
    /// "Parameter omitted". All `none` terms are equal.
    None,
    List(ListTerm),
    Placeholder(Placeholder),
    Var(Var),
}

pub const ANY: Term = Term::Placeholder(Placeholder::Any);
pub const ANY_NB: Term = Term::Placeholder(Placeholder::AnyNb);
pub const ANY_NO: Term = Term::Placeholder(Placeholder::AnyNo);
pub const ANY_NBNO: Term = Term::Placeholder(Placeholder::AnyNbNo);
pub const ANY_TRAIL: Term = Term::Placeholder(Placeholder::AnyTrail);

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal::plain(value))
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(Var::new(name))
    }

    pub fn list(elements: Vec<Term>) -> Self {
        Term::List(ListTerm::new(elements))
    }

    pub fn unexpanded_list(elements: Vec<Term>) -> Self {
        Term::List(ListTerm::unexpanded(elements))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Term::None)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_trail(&self) -> bool {
        matches!(self, Term::Placeholder(Placeholder::AnyTrail))
    }

    pub fn as_list(&self) -> Option<&ListTerm> {
        match self {
            Term::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_placeholder(&self) -> Option<Placeholder> {
        match self {
            Term::Placeholder(p) => Some(*p),
            _ => None,
        }
    }
}

impl From<Var> for Term {
    fn from(value: Var) -> Self {
        Term::Var(value)
    }
}

impl From<Placeholder> for Term {
    fn from(value: Placeholder) -> Self {
        Term::Placeholder(value)
    }
}

impl From<ListTerm> for Term {
    fn from(value: ListTerm) -> Self {
        Term::List(value)
    }
}
