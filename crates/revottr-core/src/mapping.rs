//! Binding (mapping) algebra.
//!
//! A [`Mapping`] is a finite partial function from variables to terms and
//! stands for one candidate answer. Sets of mappings are combined with
//! [`join`], which merges shared keys through the lattice meet; argument
//! matching ([`inner_compatible`], [`transform`]) re-expresses a template's
//! bindings in terms of the variables of an instance that uses it.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use crate::lattice::{glb, less_or_equal};
use crate::term::{split_trail, ListTerm, Term, Var, ANY};

/// One binding. Keys are unique; iteration is in variable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping(BTreeMap<Var, Term>);

/// A deterministic set of bindings.
pub type MappingSet = BTreeSet<Mapping>;

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, var: impl Into<Var>, term: Term) -> Self {
        self.0.insert(var.into(), term);
        self
    }

    pub fn insert(&mut self, var: Var, term: Term) -> Option<Term> {
        self.0.insert(var, term)
    }

    pub fn get(&self, var: &Var) -> Option<&Term> {
        self.0.get(var)
    }

    pub fn contains(&self, var: &Var) -> bool {
        self.0.contains_key(var)
    }

    pub fn vars(&self) -> impl Iterator<Item = &Var> {
        self.0.keys()
    }

    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.0.values()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Var, Term> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff every shared variable has a defined meet.
    pub fn compatible(&self, other: &Mapping) -> bool {
        let (small, large) = self.by_size(other);
        small
            .iter()
            .all(|(var, term)| match large.get(var) {
                Some(other_term) => glb(term, other_term).is_some(),
                None => true,
            })
    }

    /// Merge two bindings, meeting shared keys. `None` if incompatible.
    pub fn union(&self, other: &Mapping) -> Option<Mapping> {
        let (small, large) = self.by_size(other);
        let mut out = large.clone();
        for (var, term) in small.iter() {
            let merged = match large.get(var) {
                Some(existing) => glb(term, existing)?,
                None => term.clone(),
            };
            out.0.insert(var.clone(), merged);
        }
        Some(out)
    }

    /// Restrict to `vars`, binding any missing variable to `fill`.
    pub fn project<'a>(&self, vars: impl IntoIterator<Item = &'a Var>, fill: &Term) -> Mapping {
        Mapping(
            vars.into_iter()
                .map(|var| {
                    let term = self.0.get(var).cloned().unwrap_or_else(|| fill.clone());
                    (var.clone(), term)
                })
                .collect(),
        )
    }

    /// Pointwise `<=` over identical domains.
    pub fn is_subsumed_by(&self, other: &Mapping) -> bool {
        self.len() == other.len()
            && self.iter().all(|(var, term)| match other.get(var) {
                Some(upper) => less_or_equal(term, upper),
                None => false,
            })
    }

    fn by_size<'a>(&'a self, other: &'a Mapping) -> (&'a Mapping, &'a Mapping) {
        if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        }
    }
}

impl FromIterator<(Var, Term)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Var, Term)>>(iter: I) -> Self {
        Mapping(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a Var, &'a Term);
    type IntoIter = btree_map::Iter<'a, Var, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Set operations
// ============================================================================

/// Pairwise union of all compatible pairs. An empty side imposes no
/// constraint.
pub fn join(left: &MappingSet, right: &MappingSet) -> MappingSet {
    if left.is_empty() {
        return right.clone();
    }
    if right.is_empty() {
        return left.clone();
    }

    left.iter()
        .flat_map(|l| right.iter().filter_map(move |r| l.union(r)))
        .collect()
}

/// Folds [`join`] over `sets`; empty sets are skipped.
pub fn join_all<'a>(sets: impl IntoIterator<Item = &'a MappingSet>) -> MappingSet {
    let mut acc: Option<MappingSet> = None;
    for set in sets {
        if set.is_empty() {
            continue;
        }
        acc = Some(match acc {
            Some(current) => join(&current, set),
            None => set.clone(),
        });
    }
    acc.unwrap_or_default()
}

/// Drop every binding that is pointwise below another binding of the set.
pub fn remove_subsumed(set: MappingSet) -> MappingSet {
    set.iter()
        .filter(|m| !set.iter().any(|other| other != *m && m.is_subsumed_by(other)))
        .cloned()
        .collect()
}

// ============================================================================
// Argument matching
// ============================================================================

/// Can `value` (bound by a template) be passed through argument `arg`?
pub fn term_compatible(value: &Term, arg: &Term) -> bool {
    match (value, arg) {
        (_, Term::Var(_)) => true,
        (Term::List(value), Term::List(arg)) => list_compatible(value, arg),
        (Term::BlankNode(_), Term::BlankNode(_)) => true,
        _ => glb(arg, value).is_some(),
    }
}

/// Element-wise [`term_compatible`]; a trailing `any-trail` in `value`
/// accepts any remaining argument positions.
pub fn list_compatible(value: &ListTerm, arg: &ListTerm) -> bool {
    let (prefix, trail) = value.split_trail();
    let (arg_elements, _) = split_trail(arg.elements());

    let length_ok = if trail {
        arg_elements.len() >= prefix.len()
    } else {
        arg_elements.len() == prefix.len()
    };

    length_ok
        && prefix
            .iter()
            .zip(arg_elements)
            .all(|(v, a)| term_compatible(v, a))
}

/// Every argument accepts its parameter's value (missing values accept).
pub fn inner_compatible(values: &Mapping, args: &Mapping) -> bool {
    args.iter().all(|(var, arg)| match values.get(var) {
        Some(value) => term_compatible(value, arg),
        None => true,
    })
}

/// Bindings of the variables inside `arg` implied by passing `value`.
pub fn term_transform(value: &Term, arg: &Term) -> Option<Mapping> {
    match (value, arg) {
        (_, Term::Var(var)) => Some(Mapping::new().with(var.clone(), value.clone())),
        (Term::List(value), Term::List(arg)) => list_transform(value, arg),
        (Term::Placeholder(_), Term::List(arg)) => {
            // The list exists but nothing is known about its elements.
            let glb_ok = glb(value, &Term::List(arg.clone())).is_some();
            glb_ok.then(|| unconstrained(arg.elements()))
        }
        (Term::BlankNode(_), Term::BlankNode(_)) => Some(Mapping::new()),
        _ => glb(arg, value).map(|_| Mapping::new()),
    }
}

fn list_transform(value: &ListTerm, arg: &ListTerm) -> Option<Mapping> {
    if !list_compatible(value, arg) {
        return None;
    }

    let (prefix, _) = value.split_trail();
    let (arg_elements, _) = split_trail(arg.elements());

    let mut out = Mapping::new();
    for (v, a) in prefix.iter().zip(arg_elements) {
        out = out.union(&term_transform(v, a)?)?;
    }
    out.union(&unconstrained(&arg_elements[prefix.len()..]))
}

/// Binds every variable occurring in `args` (at any depth) to `any`.
fn unconstrained(args: &[Term]) -> Mapping {
    fn collect(term: &Term, out: &mut Mapping) {
        match term {
            Term::Var(var) => {
                out.insert(var.clone(), ANY);
            }
            Term::List(list) => list.elements().iter().for_each(|t| collect(t, out)),
            _ => {}
        }
    }

    let mut out = Mapping::new();
    args.iter().for_each(|t| collect(t, &mut out));
    out
}

/// Re-express `values` (keyed by template parameters) through `args`
/// (parameter -> instance argument). Fails if any argument rejects its value
/// or two arguments disagree on a shared variable.
pub fn transform(values: &Mapping, args: &Mapping) -> Option<Mapping> {
    let mut out = Mapping::new();
    for (var, arg) in args.iter() {
        let value = values.get(var).unwrap_or(&ANY);
        let local = term_transform(value, arg)?;
        out = out.union(&local)?;
    }
    Some(out)
}
