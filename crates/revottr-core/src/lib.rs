//! Reverse OTTR: template evaluation run backwards.
//!
//! A template, instantiated with arguments, generates RDF triples. Given a
//! graph, this crate computes every binding of a template's parameters that
//! could have generated (part of) it.
//!
//! Infinite families of answers are kept finite with a small lattice of
//! placeholder terms (`any`, `any-nb`, `any-no`, `any-nbno`, `any-trail`), and
//! list expansion (`cross`, `zipMin`, `zipMax`) is inverted by enumerating
//! candidate generating lists with a bounded number of repetitions.
//!
//! ## Module Organization
//!
//! - `term`: terms, lists, placeholders
//! - `lattice`: partial order and meet over terms
//! - `mapping`: bindings and the join algebra
//! - `model` / `library`: templates and the template store
//! - `graph`: statements and fact extraction
//! - `unexpander`: inversion of list expansion
//! - `evaluator`: recursive reverse evaluation
//! - `display`: prefix-aware rendering

pub mod combinatorics;
pub mod config;
pub mod display;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod lattice;
pub mod library;
pub mod mapping;
pub mod model;
pub mod term;
pub mod unexpander;

pub use config::EvalConfig;
pub use display::PrefixMap;
pub use error::{EvalError, EvalResult, LibraryError};
pub use evaluator::Evaluator;
pub use graph::{FactSet, Node, Object, Statement};
pub use lattice::{glb, less_or_equal, param_placeholder};
pub use library::{TemplateLibrary, NULLABLE_TRIPLE_IRI, TRIPLE_IRI};
pub use mapping::{join, join_all, Mapping, MappingSet};
pub use model::{Argument, Instance, ListExpander, Parameter, Template};
pub use term::{
    ListTerm, Literal, Placeholder, Term, Var, ANY, ANY_NB, ANY_NBNO, ANY_NO, ANY_TRAIL,
};
pub use unexpander::ListUnexpander;

/// Evaluate `iri` against `facts` in one call.
pub fn query(
    library: &TemplateLibrary,
    facts: &FactSet,
    iri: &str,
    config: EvalConfig,
) -> EvalResult<MappingSet> {
    Evaluator::new(library, facts, config).evaluate_query(iri)
}
