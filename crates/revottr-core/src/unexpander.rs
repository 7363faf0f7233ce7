//! Inverting list expansion.
//!
//! An instance with a list expander (`cross`, `zipMin`, `zipMax`) expands into
//! one instance per combination or position of its `++` arguments. Given the
//! flat bindings of the expanded template, [`ListUnexpander`] reconstructs the
//! list-valued bindings that could have generated them.
//!
//! The parameters of the expanded template are split into *marked* (their
//! argument is list-expanded) and *unmarked* ones. Bindings are first grouped
//! into compatible sets, groups whose unmarked values have a common meet; each
//! group is a candidate for the elements of one generating list.
//!
//! Every marked value produced here is an unexpanded list.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::combinatorics::{list_variants, Permutations, Repetitions, Subsets};
use crate::lattice::{glb, less_or_equal};
use crate::mapping::{join_all, Mapping, MappingSet};
use crate::model::{Instance, ListExpander, Template};
use crate::term::{Term, Var, ANY, ANY_TRAIL};

/// Bindings whose unmarked projections share a meet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleSet {
    pub rows: Vec<Mapping>,
    /// Meet of the rows' unmarked projections.
    pub unmarked: Mapping,
}

/// Candidate element sets per marked variable.
type Candidate = BTreeMap<Var, BTreeSet<Term>>;

/// One ordered reading of a compatible set: a list per marked variable.
struct Unzipped {
    lists: Vec<(Var, Vec<Term>)>,
    unmarked: Mapping,
}

#[derive(Debug, Clone)]
pub struct ListUnexpander {
    marked: Vec<Var>,
    unmarked: Vec<Var>,
    max_repetitions: usize,
}

impl ListUnexpander {
    pub fn new(marked: Vec<Var>, unmarked: Vec<Var>, max_repetitions: usize) -> Self {
        Self {
            marked,
            unmarked,
            max_repetitions,
        }
    }

    /// Split `template`'s parameters by the list-expanded flags of
    /// `instance`'s arguments (positional).
    pub fn for_instance(template: &Template, instance: &Instance, max_repetitions: usize) -> Self {
        let (marked, unmarked): (Vec<_>, Vec<_>) = template
            .parameters
            .iter()
            .zip(&instance.arguments)
            .partition(|(_, arg)| arg.list_expanded);

        Self::new(
            marked.into_iter().map(|(p, _)| p.var.clone()).collect(),
            unmarked.into_iter().map(|(p, _)| p.var.clone()).collect(),
            max_repetitions,
        )
    }

    pub fn marked(&self) -> &[Var] {
        &self.marked
    }

    pub fn unmarked(&self) -> &[Var] {
        &self.unmarked
    }

    pub fn invert(&self, expander: ListExpander, set: &MappingSet) -> MappingSet {
        let out = match expander {
            ListExpander::Cross => self.uncross(set),
            ListExpander::ZipMin => self.unzip_min(set),
            ListExpander::ZipMax => self.unzip_max(set),
        };
        trace!(
            expander = %expander,
            marked = self.marked.len(),
            input = set.len(),
            output = out.len(),
            "inverted list expansion"
        );
        out
    }

    // ========================================================================
    // Compatible sets
    // ========================================================================

    /// All maximal groups of bindings whose unmarked projections meet.
    ///
    /// Bindings with identical unmarked projections always travel together,
    /// so the search runs over those classes.
    pub fn compatible_sets(&self, set: &MappingSet) -> Vec<CompatibleSet> {
        let mut classes: BTreeMap<Mapping, Vec<Mapping>> = BTreeMap::new();
        for row in set {
            classes
                .entry(self.unmarked_projection(row))
                .or_default()
                .push(row.clone());
        }

        let keys: Vec<&Mapping> = classes.keys().collect();
        let mut found = Vec::new();
        maximal_groups(
            &keys,
            Vec::new(),
            self.top(),
            (0..keys.len()).collect(),
            Vec::new(),
            &mut found,
        );

        found
            .into_iter()
            .map(|(members, unmarked)| CompatibleSet {
                rows: members
                    .iter()
                    .flat_map(|&i| classes.get(keys[i]).into_iter().flatten().cloned())
                    .collect(),
                unmarked,
            })
            .collect()
    }

    fn unmarked_projection(&self, row: &Mapping) -> Mapping {
        row.project(self.unmarked.iter(), &ANY)
    }

    /// All unmarked variables at `any`.
    fn top(&self) -> Mapping {
        Mapping::new().project(self.unmarked.iter(), &ANY)
    }

    // ========================================================================
    // cross
    // ========================================================================

    /// Lists whose cross product is covered by a compatible set.
    pub fn uncross(&self, set: &MappingSet) -> MappingSet {
        let mut out = MappingSet::new();
        for group in self.compatible_sets(set) {
            for candidate in self.compactify_all(&group.rows) {
                out.extend(self.cross_lists(&candidate, &group.rows));
            }
        }
        out.extend(self.min_empty());
        out
    }

    /// Merge two candidates along `var`: union `var`'s elements, meet the
    /// other marked variables' elements. `None` if any set empties.
    fn compactify(&self, left: &Candidate, right: &Candidate, var: &Var) -> Option<Candidate> {
        let mut out = Candidate::new();
        for marked in &self.marked {
            let (Some(l), Some(r)) = (left.get(marked), right.get(marked)) else {
                return None;
            };
            let merged = if marked == var {
                merge_union(l, r)
            } else {
                merge_meet(l, r)
            };
            if merged.is_empty() {
                return None;
            }
            out.insert(marked.clone(), merged);
        }
        Some(out)
    }

    /// Close the per-row candidates under [`Self::compactify`] and drop the
    /// ones another candidate absorbs.
    fn compactify_all(&self, rows: &[Mapping]) -> Vec<Candidate> {
        let mut candidates: BTreeSet<Candidate> = rows
            .iter()
            .map(|row| {
                self.marked
                    .iter()
                    .map(|var| {
                        let element = row.get(var).cloned().unwrap_or(ANY);
                        (var.clone(), BTreeSet::from([element]))
                    })
                    .collect()
            })
            .collect();

        let rounds = candidates.len();
        for _ in 0..rounds {
            let current: Vec<Candidate> = candidates.iter().cloned().collect();
            let mut grew = false;
            for (i, left) in current.iter().enumerate() {
                for right in &current[i + 1..] {
                    for var in &self.marked {
                        if let Some(merged) = self.compactify(left, right, var) {
                            grew |= candidates.insert(merged);
                        }
                    }
                }
            }
            if !grew {
                break;
            }
        }

        candidates
            .iter()
            .filter(|c| {
                !candidates
                    .iter()
                    .any(|other| other != *c && absorbed_by(c, other))
            })
            .cloned()
            .collect()
    }

    fn cross_lists(&self, candidate: &Candidate, rows: &[Mapping]) -> MappingSet {
        let per_var: Vec<MappingSet> = self
            .marked
            .iter()
            .map(|var| {
                let items: Vec<Term> = candidate
                    .get(var)
                    .map(|set| set.iter().cloned().collect())
                    .unwrap_or_default();
                list_variants(items, self.max_repetitions)
                    .map(|elements| Mapping::new().with(var.clone(), Term::unexpanded_list(elements)))
                    .collect()
            })
            .collect();

        join_all(per_var.iter())
            .iter()
            .filter_map(|lists| lists.union(&self.supporting_meet(lists, rows)?))
            .collect()
    }

    /// Meet of the unmarked projections of the rows a set of lists draws its
    /// elements from. A row supports the lists when each of its marked values
    /// lies above some element of the matching list. `None` when no row does.
    fn supporting_meet(&self, lists: &Mapping, rows: &[Mapping]) -> Option<Mapping> {
        let mut supporting = rows
            .iter()
            .filter(|row| {
                self.marked.iter().all(|var| {
                    let value = row.get(var).unwrap_or(&ANY);
                    lists
                        .get(var)
                        .and_then(Term::as_list)
                        .is_some_and(|list| list.elements().iter().any(|e| less_or_equal(e, value)))
                })
            })
            .peekable();
        supporting.peek()?;
        supporting.try_fold(self.top(), |acc, row| acc.union(&self.unmarked_projection(row)))
    }

    // ========================================================================
    // zipMin / zipMax
    // ========================================================================

    /// Every ordered, bounded-repetition reading of every non-empty
    /// sub-selection of every compatible set.
    fn unzip<'a>(&'a self, set: &MappingSet) -> impl Iterator<Item = Unzipped> + 'a {
        self.compatible_sets(set)
            .into_iter()
            .flat_map(|group| Subsets::new(group.rows))
            .filter_map(move |rows| {
                let unmarked = rows
                    .iter()
                    .try_fold(self.top(), |acc, row| acc.union(&self.unmarked_projection(row)))?;
                Some((rows, unmarked))
            })
            .flat_map(move |(rows, unmarked)| {
                Repetitions::new(rows, self.max_repetitions)
                    .flat_map(Permutations::new)
                    .map(move |ordered| self.unzip_rows(&ordered, unmarked.clone()))
            })
    }

    fn unzip_rows(&self, rows: &[Mapping], unmarked: Mapping) -> Unzipped {
        let lists = self
            .marked
            .iter()
            .map(|var| {
                let elements = rows
                    .iter()
                    .map(|row| row.get(var).cloned().unwrap_or(ANY))
                    .collect();
                (var.clone(), elements)
            })
            .collect();
        Unzipped { lists, unmarked }
    }

    /// Reverse of zipping up to the shortest list: one marked list is exact,
    /// the others may continue past it.
    pub fn unzip_min(&self, set: &MappingSet) -> MappingSet {
        let mut out = MappingSet::new();
        for unzipped in self.unzip(set) {
            for pick in &self.marked {
                let mut binding = unzipped.unmarked.clone();
                for (var, elements) in &unzipped.lists {
                    let mut elements = elements.clone();
                    if var != pick {
                        elements.push(ANY_TRAIL);
                    }
                    binding.insert(var.clone(), Term::unexpanded_list(elements));
                }
                out.insert(binding);
            }
        }
        out.extend(self.min_empty());
        out
    }

    /// Reverse of zipping up to the longest list with `none` padding: any
    /// run of trailing `none`s may have been padding.
    pub fn unzip_max(&self, set: &MappingSet) -> MappingSet {
        let mut out = MappingSet::new();
        for unzipped in self.unzip(set) {
            let per_var: Vec<MappingSet> = unzipped
                .lists
                .iter()
                .map(|(var, elements)| {
                    strip_trailing_none(elements)
                        .into_iter()
                        .map(|stripped| {
                            Mapping::new().with(var.clone(), Term::unexpanded_list(stripped))
                        })
                        .collect()
                })
                .collect();

            out.extend(
                join_all(per_var.iter())
                    .iter()
                    .filter_map(|lists| lists.union(&unzipped.unmarked)),
            );
        }
        out.insert(self.max_empty());
        out
    }

    // ========================================================================
    // Degenerate solutions
    // ========================================================================

    /// The instance expanded to nothing because one list was empty.
    fn min_empty(&self) -> MappingSet {
        self.marked
            .iter()
            .map(|pick| {
                let mut binding = self.top();
                for var in &self.marked {
                    let elements = if var == pick { Vec::new() } else { vec![ANY_TRAIL] };
                    binding.insert(var.clone(), Term::unexpanded_list(elements));
                }
                binding
            })
            .collect()
    }

    /// The instance expanded to nothing because every list was empty.
    fn max_empty(&self) -> Mapping {
        let mut binding = self.top();
        for var in &self.marked {
            binding.insert(var.clone(), Term::unexpanded_list(Vec::new()));
        }
        binding
    }
}

/// Bron–Kerbosch over classes, where a class may join a group iff it meets
/// the group's running meet.
fn maximal_groups(
    keys: &[&Mapping],
    chosen: Vec<usize>,
    meet: Mapping,
    mut candidates: Vec<usize>,
    mut excluded: Vec<usize>,
    out: &mut Vec<(Vec<usize>, Mapping)>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() && !chosen.is_empty() {
            out.push((chosen, meet));
        }
        return;
    }

    while !candidates.is_empty() {
        let v = candidates.remove(0);
        if let Some(next) = meet.union(keys[v]) {
            let narrow = |ids: &[usize]| -> Vec<usize> {
                ids.iter()
                    .copied()
                    .filter(|&u| next.compatible(keys[u]))
                    .collect()
            };
            let next_candidates = narrow(&candidates);
            let next_excluded = narrow(&excluded);

            let mut grown = chosen.clone();
            grown.push(v);
            maximal_groups(keys, grown, next, next_candidates, next_excluded, out);
        }
        excluded.push(v);
    }
}

/// Merging `candidate`'s elements into `other`'s leaves `other` unchanged.
fn absorbed_by(candidate: &Candidate, other: &Candidate) -> bool {
    candidate.iter().all(|(var, elements)| {
        other
            .get(var)
            .is_some_and(|wider| merge_union(elements, wider) == *wider)
    })
}

/// Union of two element sets where every meeting pair collapses to its meet.
fn merge_union(left: &BTreeSet<Term>, right: &BTreeSet<Term>) -> BTreeSet<Term> {
    let mut out = BTreeSet::new();
    for x in left {
        for y in right {
            match glb(x, y) {
                Some(meet) => {
                    out.insert(meet);
                }
                None => {
                    out.insert(x.clone());
                    out.insert(y.clone());
                }
            }
        }
    }
    out
}

/// Pairwise meets of two element sets.
fn merge_meet(left: &BTreeSet<Term>, right: &BTreeSet<Term>) -> BTreeSet<Term> {
    left.iter()
        .flat_map(|x| right.iter().filter_map(move |y| glb(x, y)))
        .collect()
}

/// `elements` and each shorter list obtained by dropping trailing `none`s.
fn strip_trailing_none(elements: &[Term]) -> Vec<Vec<Term>> {
    let mut current = elements.to_vec();
    let mut out = vec![current.clone()];
    while current.last().is_some_and(Term::is_none) {
        current.pop();
        out.push(current.clone());
    }
    out
}
