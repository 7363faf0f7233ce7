//! Statement graph and fact extraction.
//!
//! A graph arrives as plain [`Statement`]s (whatever parsed it). Fact
//! extraction converts nodes to [`Term`]s, folding RDF collections
//! (`rdf:first`/`rdf:rest` chains ending in `rdf:nil`) into [`ListTerm`]s, and
//! produces the binding sets the base templates evaluate to.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::lattice::param_placeholder;
use crate::library::{base_template, NULLABLE_TRIPLE_IRI, OBJECT, PREDICATE, SUBJECT};
use crate::mapping::{Mapping, MappingSet};
use crate::term::{ListTerm, Literal, Term};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

// ============================================================================
// Statement model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Node {
    Iri(String),
    Blank(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Object {
    Node(Node),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Node,
    pub predicate: String,
    pub object: Object,
}

impl Statement {
    pub fn new(subject: Node, predicate: impl Into<String>, object: Object) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    fn is_list_structure(&self) -> bool {
        self.predicate == RDF_FIRST || self.predicate == RDF_REST
    }
}

impl From<Node> for Object {
    fn from(node: Node) -> Self {
        Object::Node(node)
    }
}

// ============================================================================
// Fact sets
// ============================================================================

/// Binding sets of the two base templates over one graph.
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    triples: MappingSet,
    nullable: MappingSet,
}

impl FactSet {
    pub fn from_statements(statements: &[Statement]) -> Self {
        let lists = ListIndex::new(statements);

        let triples = statements
            .iter()
            .filter(|st| !st.is_list_structure())
            .map(|st| {
                fact(
                    lists.node_term(&st.subject),
                    Term::iri(st.predicate.as_str()),
                    lists.object_term(&st.object),
                )
            })
            .collect::<MappingSet>();

        debug!(
            statements = statements.len(),
            facts = triples.len(),
            "extracted facts"
        );
        Self::from_fact_bindings(triples)
    }

    pub fn from_triples(triples: impl IntoIterator<Item = (Term, Term, Term)>) -> Self {
        Self::from_fact_bindings(
            triples
                .into_iter()
                .map(|(s, p, o)| fact(s, p, o))
                .collect(),
        )
    }

    fn from_fact_bindings(triples: MappingSet) -> Self {
        let mut nullable = triples.clone();
        nullable.extend(omission_bindings());
        Self { triples, nullable }
    }

    /// Bindings of `ottr:Triple`: one per fact.
    pub fn triples(&self) -> &MappingSet {
        &self.triples
    }

    /// Bindings of `ottr:NullableTriple`: the facts plus one binding per
    /// omitted position.
    pub fn nullable(&self) -> &MappingSet {
        &self.nullable
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

fn fact(subject: Term, predicate: Term, object: Term) -> Mapping {
    Mapping::new()
        .with(SUBJECT, subject)
        .with(PREDICATE, predicate)
        .with(OBJECT, object)
}

fn omission_bindings() -> Vec<Mapping> {
    let Some(template) = base_template(NULLABLE_TRIPLE_IRI) else {
        return Vec::new();
    };

    template
        .parameters
        .iter()
        .map(|omitted| {
            template
                .parameters
                .iter()
                .map(|p| {
                    let term = if p.var == omitted.var {
                        Term::None
                    } else {
                        param_placeholder(p)
                    };
                    (p.var.clone(), term)
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// RDF collections
// ============================================================================

struct ListIndex<'a> {
    first: AHashMap<&'a str, Vec<&'a Object>>,
    rest: AHashMap<&'a str, Vec<&'a Object>>,
}

impl<'a> ListIndex<'a> {
    fn new(statements: &'a [Statement]) -> Self {
        let mut first: AHashMap<&str, Vec<&Object>> = AHashMap::new();
        let mut rest: AHashMap<&str, Vec<&Object>> = AHashMap::new();
        for st in statements {
            let Node::Blank(label) = &st.subject else {
                continue;
            };
            if st.predicate == RDF_FIRST {
                first.entry(label.as_str()).or_default().push(&st.object);
            } else if st.predicate == RDF_REST {
                rest.entry(label.as_str()).or_default().push(&st.object);
            }
        }
        Self { first, rest }
    }

    fn object_term(&self, object: &Object) -> Term {
        match object {
            Object::Node(node) => self.node_term(node),
            Object::Literal(literal) => Term::Literal(literal.clone()),
        }
    }

    fn node_term(&self, node: &Node) -> Term {
        match node {
            Node::Iri(iri) if iri == RDF_NIL => Term::list(Vec::new()),
            Node::Iri(iri) => Term::iri(iri.as_str()),
            Node::Blank(label) => self
                .unfold(label, &mut AHashSet::new())
                .unwrap_or_else(|| Term::blank(label.as_str())),
        }
    }

    /// Unfold the collection headed by `head`, `None` if it is not a
    /// well-formed list.
    fn unfold(&self, head: &str, visiting: &mut AHashSet<String>) -> Option<Term> {
        if !self.first.contains_key(head) && !self.rest.contains_key(head) {
            return None;
        }

        let mut elements = Vec::new();
        let mut cursor = head.to_string();
        let mut chain = Vec::new();
        loop {
            if !visiting.insert(cursor.clone()) {
                warn!(head = %head, node = %cursor, "cyclic rdf list left as blank node");
                return release(visiting, chain, None);
            }
            chain.push(cursor.clone());

            let (Some([first]), Some([rest])) = (
                self.first.get(cursor.as_str()).map(Vec::as_slice),
                self.rest.get(cursor.as_str()).map(Vec::as_slice),
            ) else {
                warn!(head = %head, node = %cursor, "malformed rdf list left as blank node");
                return release(visiting, chain, None);
            };

            let element = match first {
                Object::Node(Node::Blank(label)) => self
                    .unfold(label, visiting)
                    .unwrap_or_else(|| Term::blank(label.as_str())),
                other => self.object_term(other),
            };
            elements.push(element);

            match rest {
                Object::Node(Node::Iri(iri)) if iri == RDF_NIL => break,
                Object::Node(Node::Blank(next)) => cursor = next.clone(),
                _ => {
                    warn!(head = %head, node = %cursor, "rdf list does not end in rdf:nil");
                    return release(visiting, chain, None);
                }
            }
        }

        let list = Term::List(ListTerm::new(elements).with_id(head));
        release(visiting, chain, Some(list))
    }
}

/// Unmark `chain` so shared (acyclic) sub-lists can be unfolded again.
fn release(
    visiting: &mut AHashSet<String>,
    chain: Vec<String>,
    result: Option<Term>,
) -> Option<Term> {
    for node in chain {
        visiting.remove(&node);
    }
    result
}
