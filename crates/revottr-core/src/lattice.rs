//! The placeholder lattice.
//!
//! Terms are partially ordered by generality: `a <= b` when every graph
//! consistent with `a` is also consistent with `b`. Ground IRIs, literals and
//! lists sit below `any-nbno`, blank nodes below `any-no`, `none` below
//! `any-nb`, and the placeholders form the diamond
//!
//! ```text
//!            any
//!          /     \
//!      any-nb   any-no
//!          \     /
//!          any-nbno
//! ```
//!
//! Unexpanded lists sit above the lists that match them element-wise; a
//! trailing `any-trail` lets the smaller list be longer.
//!
//! [`glb`] is the meet of this order. It returns `None` when two terms have no
//! common lower bound, which is how incompatibility is signalled everywhere
//! in the engine.

use crate::model::Parameter;
use crate::term::{split_trail, ListTerm, Placeholder, Term, ANY, ANY_NB, ANY_NBNO, ANY_NO, ANY_TRAIL};

/// Order among the placeholder sentinels.
pub fn placeholder_le(a: Placeholder, b: Placeholder) -> bool {
    use Placeholder::*;

    if a == b {
        return true;
    }
    match (a, b) {
        (AnyTrail, _) | (_, AnyTrail) => false,
        (_, Any) => true,
        (AnyNbNo, AnyNb) | (AnyNbNo, AnyNo) => true,
        _ => false,
    }
}

/// `a <= b` in the lattice.
pub fn less_or_equal(a: &Term, b: &Term) -> bool {
    if a == b {
        return true;
    }

    match (a, b) {
        (_, Term::Placeholder(upper)) => match a {
            Term::Placeholder(lower) => placeholder_le(*lower, *upper),
            Term::None => placeholder_le(Placeholder::AnyNb, *upper),
            Term::BlankNode(_) => placeholder_le(Placeholder::AnyNo, *upper),
            Term::Iri(_) | Term::Literal(_) | Term::List(_) => {
                placeholder_le(Placeholder::AnyNbNo, *upper)
            }
            Term::Var(_) => false,
        },
        (Term::List(lower), Term::List(upper)) => list_le(lower, upper),
        _ => false,
    }
}

fn list_le(lower: &ListTerm, upper: &ListTerm) -> bool {
    if !upper.is_unexpanded() {
        return false;
    }

    let (prefix, trail) = upper.split_trail();
    let length_ok = if trail {
        lower.len() >= prefix.len()
    } else {
        lower.len() == prefix.len()
    };

    length_ok
        && lower
            .elements()
            .iter()
            .zip(prefix)
            .all(|(l, u)| less_or_equal(l, u))
}

/// Greatest lower bound of two terms, `None` if they are incompatible.
pub fn glb(a: &Term, b: &Term) -> Option<Term> {
    if less_or_equal(a, b) {
        return Some(a.clone());
    }
    if less_or_equal(b, a) {
        return Some(b.clone());
    }

    match (a, b) {
        (Term::Placeholder(x), Term::Placeholder(y)) => match (x, y) {
            (Placeholder::AnyNb, Placeholder::AnyNo) | (Placeholder::AnyNo, Placeholder::AnyNb) => {
                Some(ANY_NBNO)
            }
            _ => None,
        },
        (Term::List(x), Term::List(y)) => glb_list(x, y),
        _ => None,
    }
}

fn glb_list(a: &ListTerm, b: &ListTerm) -> Option<Term> {
    let elements = glb_elements(a.elements(), b.elements())?;

    // A concrete list can only meet a generalization of itself; the result
    // keeps the concrete side's identity.
    let concrete = |list: &ListTerm| {
        let out = ListTerm::new(elements.clone());
        match list.id() {
            Some(id) => out.with_id(id),
            None => out,
        }
    };

    match (a.is_unexpanded(), b.is_unexpanded()) {
        (true, true) => Some(Term::List(ListTerm::unexpanded(elements))),
        (false, true) => Some(Term::List(concrete(a))),
        (true, false) => Some(Term::List(concrete(b))),
        (false, false) => None,
    }
}

/// Element-wise meet of two element sequences honoring trailing markers.
fn glb_elements(left: &[Term], right: &[Term]) -> Option<Vec<Term>> {
    let (left_prefix, left_trail) = split_trail(left);
    let (right_prefix, right_trail) = split_trail(right);

    let length_ok = match (left_trail, right_trail) {
        (false, false) => left_prefix.len() == right_prefix.len(),
        (true, false) => right_prefix.len() >= left_prefix.len(),
        (false, true) => left_prefix.len() >= right_prefix.len(),
        (true, true) => true,
    };
    if !length_ok {
        return None;
    }

    let mut out = Vec::with_capacity(left_prefix.len().max(right_prefix.len()) + 1);
    for (l, r) in left_prefix.iter().zip(right_prefix) {
        out.push(glb(l, r)?);
    }

    let (longer, shorter) = if left_prefix.len() >= right_prefix.len() {
        (left_prefix, right_prefix)
    } else {
        (right_prefix, left_prefix)
    };
    out.extend(longer[shorter.len()..].iter().cloned());

    if left_trail && right_trail {
        out.push(ANY_TRAIL);
    }

    Some(out)
}

/// The widest placeholder a parameter's modifiers allow.
pub fn param_placeholder(parameter: &Parameter) -> Term {
    match (parameter.non_blank, parameter.optional) {
        (true, false) => ANY_NBNO,
        (true, true) => ANY_NB,
        (false, false) => ANY_NO,
        (false, true) => ANY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Var;

    fn iri(s: &str) -> Term {
        Term::iri(s)
    }

    #[test]
    fn ground_terms_sit_below_their_placeholders() {
        assert!(less_or_equal(&iri("a"), &ANY_NBNO));
        assert!(less_or_equal(&iri("a"), &ANY_NO));
        assert!(less_or_equal(&Term::blank("b"), &ANY_NO));
        assert!(!less_or_equal(&Term::blank("b"), &ANY_NB));
        assert!(less_or_equal(&Term::None, &ANY_NB));
        assert!(!less_or_equal(&Term::None, &ANY_NO));
        assert!(less_or_equal(&Term::None, &ANY));
        assert!(!less_or_equal(&ANY, &iri("a")));
    }

    #[test]
    fn diamond_meet_is_any_nbno() {
        assert_eq!(glb(&ANY_NB, &ANY_NO), Some(ANY_NBNO));
        assert_eq!(glb(&ANY_NO, &ANY_NB), Some(ANY_NBNO));
        assert_eq!(glb(&ANY, &ANY_NB), Some(ANY_NB));
        assert_eq!(glb(&ANY_TRAIL, &ANY), None);
    }

    #[test]
    fn distinct_ground_terms_are_incompatible() {
        assert_eq!(glb(&iri("a"), &iri("b")), None);
        assert_eq!(glb(&Term::None, &ANY_NO), None);
        assert_eq!(glb(&Term::None, &Term::None), Some(Term::None));
    }

    #[test]
    fn trailing_marker_lets_longer_lists_through() {
        let pattern = Term::unexpanded_list(vec![iri("a"), ANY_TRAIL]);
        assert!(less_or_equal(&Term::list(vec![iri("a")]), &pattern));
        assert!(less_or_equal(&Term::list(vec![iri("a"), iri("b")]), &pattern));
        assert!(!less_or_equal(&Term::list(vec![]), &pattern));
        assert!(!less_or_equal(&Term::list(vec![iri("b")]), &pattern));

        let fixed = Term::unexpanded_list(vec![iri("a")]);
        assert!(!less_or_equal(&Term::list(vec![iri("a"), iri("b")]), &fixed));
    }

    #[test]
    fn concrete_lists_only_sit_below_themselves() {
        let a = Term::list(vec![iri("a")]);
        let b = Term::list(vec![ANY]);
        assert!(!less_or_equal(&a, &b));
        assert_eq!(glb(&a, &b), None);
    }

    #[test]
    fn list_glb_appends_the_longer_tail() {
        let short = Term::unexpanded_list(vec![ANY_NB, ANY_TRAIL]);
        let long = Term::unexpanded_list(vec![ANY_NO, iri("b"), ANY_TRAIL]);
        let expected = Term::unexpanded_list(vec![ANY_NBNO, iri("b"), ANY_TRAIL]);
        assert_eq!(glb(&short, &long), Some(expected.clone()));
        assert_eq!(glb(&long, &short), Some(expected));
    }

    #[test]
    fn one_sided_trail_requires_the_fixed_side_to_be_long_enough() {
        let trailing = Term::unexpanded_list(vec![ANY, ANY, ANY_TRAIL]);
        let fixed = Term::unexpanded_list(vec![ANY_NB]);
        assert_eq!(glb(&trailing, &fixed), None);

        let fixed = Term::unexpanded_list(vec![ANY_NB, ANY_NO, Term::None]);
        assert_eq!(
            glb(&trailing, &fixed),
            Some(Term::unexpanded_list(vec![ANY_NB, ANY_NO, Term::None]))
        );
    }

    #[test]
    fn list_glb_with_concrete_side_keeps_identity() {
        let concrete = Term::List(ListTerm::new(vec![iri("a"), iri("b")]).with_id("l0"));
        let general = Term::unexpanded_list(vec![ANY, ANY_TRAIL]);
        let met = glb(&general, &concrete).expect("compatible");
        assert_eq!(met, concrete);
        assert_eq!(met.as_list().and_then(ListTerm::id), Some("l0"));
    }

    #[test]
    fn parameter_placeholders_follow_modifiers() {
        let p = Parameter::new(Var::new("x"));
        assert_eq!(param_placeholder(&p), ANY_NO);
        assert_eq!(param_placeholder(&p.clone().optional()), ANY);
        assert_eq!(param_placeholder(&p.clone().non_blank()), ANY_NBNO);
        assert_eq!(param_placeholder(&p.optional().non_blank()), ANY_NB);
    }
}
