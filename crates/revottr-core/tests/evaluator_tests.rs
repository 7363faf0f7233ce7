use revottr_core::graph::{RDF_FIRST, RDF_NIL, RDF_REST};
use revottr_core::{
    query, Argument, EvalConfig, EvalError, Evaluator, FactSet, Instance, ListExpander, Mapping,
    MappingSet, Node, Object, Parameter, Statement, Template, TemplateLibrary, Term, ANY, ANY_NBNO,
    ANY_NO, ANY_TRAIL, NULLABLE_TRIPLE_IRI, TRIPLE_IRI, Var,
};

fn iri(s: &str) -> Term {
    Term::iri(s)
}

fn triple(s: Term, p: Term, o: Term) -> Instance {
    Instance::new(
        TRIPLE_IRI,
        vec![Argument::new(s), Argument::new(p), Argument::new(o)],
    )
}

fn library(templates: Vec<Template>) -> TemplateLibrary {
    TemplateLibrary::from_templates(templates).unwrap()
}

/// `ex:T(?s, ! ?p, ? ?o) :: { ottr:Triple(?s, ?p, ?o) }`
fn t_template() -> Template {
    Template::new(
        "ex:T",
        vec![
            Parameter::new("s"),
            Parameter::new("p").non_blank(),
            Parameter::new("o").optional(),
        ],
        vec![triple(Term::var("s"), Term::var("p"), Term::var("o"))],
    )
}

#[test]
fn single_triple_template_end_to_end() {
    let lib = library(vec![t_template()]);
    let facts = FactSet::from_triples([(iri("ex:a"), iri("ex:b"), iri("ex:c"))]);

    let result = query(&lib, &facts, "ex:T", EvalConfig::default()).unwrap();

    let expected: MappingSet = [
        Mapping::new()
            .with("s", iri("ex:a"))
            .with("p", iri("ex:b"))
            .with("o", iri("ex:c")),
        Mapping::new()
            .with("s", Term::None)
            .with("p", ANY_NBNO)
            .with("o", ANY),
        Mapping::new()
            .with("s", ANY_NO)
            .with("p", Term::None)
            .with("o", ANY),
    ]
    .into_iter()
    .collect();
    assert_eq!(result, expected);
}

#[test]
fn triple_round_trips_the_fact_set() {
    let facts = FactSet::from_triples([
        (iri("ex:a"), iri("ex:p"), iri("ex:b")),
        (iri("ex:b"), iri("ex:p"), Term::literal("x")),
    ]);
    let result = query(&TemplateLibrary::new(), &facts, TRIPLE_IRI, EvalConfig::default()).unwrap();
    assert_eq!(&result, facts.triples());
    assert_eq!(result.len(), 2);
}

#[test]
fn nested_template_sees_absence_of_inner_parameters() {
    let u = Template::new(
        "ex:U",
        vec![Parameter::new("x")],
        vec![Instance::new(
            "ex:T",
            vec![
                Argument::new(Term::var("x")),
                Argument::new(iri("ex:b")),
                Argument::new(iri("ex:c")),
            ],
        )],
    );
    let lib = library(vec![t_template(), u]);
    let facts = FactSet::from_triples([(iri("ex:a"), iri("ex:b"), iri("ex:c"))]);

    let result = query(&lib, &facts, "ex:U", EvalConfig::default()).unwrap();
    let expected: MappingSet = [
        Mapping::new().with("x", iri("ex:a")),
        Mapping::new().with("x", Term::None),
    ]
    .into_iter()
    .collect();
    assert_eq!(result, expected);
}

#[test]
fn defaulted_values_split_into_both_readings() {
    let d = Template::new(
        "ex:D",
        vec![
            Parameter::new("s"),
            Parameter::new("p").optional().with_default(iri("ex:b")),
            Parameter::new("o").optional().with_default(iri("ex:c")),
        ],
        vec![triple(Term::var("s"), Term::var("p"), Term::var("o"))],
    );
    let lib = library(vec![d]);
    let facts = FactSet::from_triples([(iri("ex:a"), iri("ex:b"), iri("ex:c"))]);

    let result = query(&lib, &facts, "ex:D", EvalConfig::default()).unwrap();
    assert_eq!(result.len(), 5);
    for (p, o) in [
        (iri("ex:b"), iri("ex:c")),
        (Term::None, iri("ex:c")),
        (iri("ex:b"), Term::None),
        (Term::None, Term::None),
    ] {
        let binding = Mapping::new().with("s", iri("ex:a")).with("p", p).with("o", o);
        assert!(result.contains(&binding), "missing {binding}");
    }
}

#[test]
fn cross_instance_recovers_every_generating_list() {
    let l = Template::new(
        "ex:L",
        vec![Parameter::new("xs")],
        vec![Instance::new(
            TRIPLE_IRI,
            vec![
                Argument::new(iri("ex:s")),
                Argument::new(iri("ex:p")),
                Argument::expanded(Term::var("xs")),
            ],
        )
        .with_expander(ListExpander::Cross)],
    );
    let lib = library(vec![l]);
    let facts = FactSet::from_triples([
        (iri("ex:s"), iri("ex:p"), iri("ex:a")),
        (iri("ex:s"), iri("ex:p"), iri("ex:b")),
    ]);

    let config = EvalConfig::default().with_max_repetitions(0);
    let result = query(&lib, &facts, "ex:L", config).unwrap();

    let expected: MappingSet = [
        Term::unexpanded_list(vec![iri("ex:a")]),
        Term::unexpanded_list(vec![iri("ex:b")]),
        Term::unexpanded_list(vec![iri("ex:a"), iri("ex:b")]),
        Term::unexpanded_list(vec![iri("ex:b"), iri("ex:a")]),
        Term::unexpanded_list(vec![]),
        Term::None,
    ]
    .into_iter()
    .map(|xs| Mapping::new().with("xs", xs))
    .collect();
    assert_eq!(result, expected);
}

#[test]
fn cross_with_one_repetition_recovers_the_crossed_list() {
    let l = Template::new(
        "ex:L",
        vec![Parameter::new("xs")],
        vec![Instance::new(
            TRIPLE_IRI,
            vec![
                Argument::new(iri("ex:s")),
                Argument::new(iri("ex:p")),
                Argument::expanded(Term::var("xs")),
            ],
        )
        .with_expander(ListExpander::Cross)],
    );
    let lib = library(vec![l]);
    let facts = FactSet::from_triples([
        (iri("ex:s"), iri("ex:p"), iri("ex:a")),
        (iri("ex:s"), iri("ex:p"), iri("ex:b")),
    ]);

    let config = EvalConfig::default().with_max_repetitions(1);
    let result = query(&lib, &facts, "ex:L", config).unwrap();

    let found = result.iter().any(|m| {
        m.get(&Var::new("xs"))
            .and_then(Term::as_list)
            .is_some_and(|xs| {
                let mut elements = xs.elements().to_vec();
                elements.sort();
                elements == vec![iri("ex:a"), iri("ex:b")]
            })
    });
    assert!(found, "no permutation of [a, b] in {result:?}");
    assert!(result.contains(
        &Mapping::new().with("xs", Term::unexpanded_list(vec![iri("ex:a"), iri("ex:a"), iri("ex:b")]))
    ));
}

/// `name(?xs, ?ys) :: expander | base(++?xs, ex:p, ++?ys)`
fn zip_template(name: &str, base: &str, expander: ListExpander) -> Template {
    Template::new(
        name,
        vec![Parameter::new("xs"), Parameter::new("ys")],
        vec![Instance::new(
            base,
            vec![
                Argument::expanded(Term::var("xs")),
                Argument::new(iri("ex:p")),
                Argument::expanded(Term::var("ys")),
            ],
        )
        .with_expander(expander)],
    )
}

#[test]
fn zip_min_instance_lets_the_longer_list_trail_off() {
    let lib = library(vec![zip_template("ex:Z", TRIPLE_IRI, ListExpander::ZipMin)]);
    let facts = FactSet::from_triples([
        (iri("ex:a"), iri("ex:p"), iri("ex:1")),
        (iri("ex:b"), iri("ex:p"), iri("ex:2")),
        (iri("ex:c"), iri("ex:q"), iri("ex:3")),
    ]);

    let config = EvalConfig::default().with_max_repetitions(0);
    let result = query(&lib, &facts, "ex:Z", config).unwrap();

    let binding = |xs: Vec<Term>, ys: Vec<Term>| {
        Mapping::new()
            .with("xs", Term::unexpanded_list(xs))
            .with("ys", Term::unexpanded_list(ys))
    };
    for expected in [
        binding(
            vec![iri("ex:a"), iri("ex:b")],
            vec![iri("ex:1"), iri("ex:2"), ANY_TRAIL],
        ),
        binding(
            vec![iri("ex:a"), iri("ex:b"), ANY_TRAIL],
            vec![iri("ex:1"), iri("ex:2")],
        ),
        binding(vec![], vec![ANY_TRAIL]),
    ] {
        assert!(result.contains(&expected), "missing {expected}");
    }

    // positions are kept together and the other predicate never matches
    assert!(!result.contains(&binding(
        vec![iri("ex:a"), iri("ex:b")],
        vec![iri("ex:2"), iri("ex:1"), ANY_TRAIL],
    )));
    assert!(result.iter().all(|m| m
        .terms()
        .filter_map(Term::as_list)
        .all(|list| !list.elements().contains(&iri("ex:c")))));
}

#[test]
fn zip_max_instance_strips_none_padding() {
    let lib = library(vec![zip_template(
        "ex:M",
        NULLABLE_TRIPLE_IRI,
        ListExpander::ZipMax,
    )]);
    let facts = FactSet::from_triples([(iri("ex:a"), iri("ex:p"), iri("ex:1"))]);

    let config = EvalConfig::default().with_max_repetitions(0);
    let result = query(&lib, &facts, "ex:M", config).unwrap();

    let binding = |xs: Vec<Term>, ys: Vec<Term>| {
        Mapping::new()
            .with("xs", Term::unexpanded_list(xs))
            .with("ys", Term::unexpanded_list(ys))
    };
    for expected in [
        binding(vec![iri("ex:a")], vec![iri("ex:1")]),
        // the second position produced an omitted object
        binding(vec![iri("ex:a"), ANY], vec![iri("ex:1"), Term::None]),
        binding(vec![iri("ex:a"), ANY], vec![iri("ex:1")]),
    ] {
        assert!(result.contains(&expected), "missing {expected}");
    }
}

#[test]
fn unknown_templates_are_fatal() {
    let broken = Template::new(
        "ex:Broken",
        vec![Parameter::new("x")],
        vec![Instance::new("ex:Missing", vec![Argument::new(Term::var("x"))])],
    );
    let lib = library(vec![broken]);
    let facts = FactSet::default();

    assert_eq!(
        query(&lib, &facts, "ex:Broken", EvalConfig::default()),
        Err(EvalError::UnknownTemplate {
            iri: "ex:Missing".into()
        })
    );
    assert!(matches!(
        query(&lib, &facts, "ex:Nowhere", EvalConfig::default()),
        Err(EvalError::UnknownTemplate { .. })
    ));
}

#[test]
fn malformed_instances_are_fatal() {
    let arity = Template::new(
        "ex:Arity",
        vec![Parameter::new("x")],
        vec![Instance::new(TRIPLE_IRI, vec![Argument::new(Term::var("x"))])],
    );
    let no_marks = Template::new(
        "ex:NoMarks",
        vec![Parameter::new("x")],
        vec![triple(iri("ex:s"), iri("ex:p"), Term::var("x")).with_expander(ListExpander::ZipMin)],
    );
    let no_expander = Template::new(
        "ex:NoExpander",
        vec![Parameter::new("x")],
        vec![Instance::new(
            TRIPLE_IRI,
            vec![
                Argument::new(iri("ex:s")),
                Argument::new(iri("ex:p")),
                Argument::expanded(Term::var("x")),
            ],
        )],
    );
    let lib = library(vec![arity, no_marks, no_expander]);
    let facts = FactSet::default();

    for iri in ["ex:Arity", "ex:NoMarks", "ex:NoExpander"] {
        let err = query(&lib, &facts, iri, EvalConfig::default()).unwrap_err();
        assert!(
            matches!(err, EvalError::MalformedInstance { .. }),
            "{iri}: {err}"
        );
    }
}

#[test]
fn surviving_bindings_are_pairwise_incomparable() {
    let lib = library(vec![t_template()]);
    let facts = FactSet::from_triples([
        (iri("ex:a"), iri("ex:b"), iri("ex:c")),
        (Term::blank("x"), iri("ex:b"), Term::None),
        (iri("ex:a"), iri("ex:q"), Term::blank("y")),
    ]);
    let result = query(&lib, &facts, "ex:T", EvalConfig::default()).unwrap();
    assert!(!result.is_empty());
    for m1 in &result {
        for m2 in &result {
            if m1 != m2 {
                assert!(!m1.is_subsumed_by(m2), "{m1} is below {m2}");
            }
        }
    }
}

#[test]
fn parallel_and_memoized_evaluation_agree() {
    let pair = Template::new(
        "ex:Pair",
        vec![Parameter::new("x"), Parameter::new("y").optional()],
        vec![
            triple(Term::var("x"), iri("ex:p"), Term::var("y")),
            triple(Term::var("x"), iri("ex:type"), iri("ex:Thing")),
        ],
    );
    let lib = library(vec![pair]);
    let facts = FactSet::from_triples([
        (iri("ex:a"), iri("ex:p"), iri("ex:b")),
        (iri("ex:a"), iri("ex:type"), iri("ex:Thing")),
        (iri("ex:c"), iri("ex:type"), iri("ex:Thing")),
    ]);

    let sequential = EvalConfig {
        memoize: false,
        ..EvalConfig::default()
    };
    let parallel = EvalConfig::default().with_parallel(true);

    let a = query(&lib, &facts, "ex:Pair", sequential).unwrap();
    let b = query(&lib, &facts, "ex:Pair", parallel).unwrap();
    assert_eq!(a, b);
    assert!(a.contains(&Mapping::new().with("x", iri("ex:a")).with("y", iri("ex:b"))));
}

#[test]
fn query_rejects_one_graph_list_at_two_positions() {
    let blank = |label: &str| Node::Blank(label.into());
    let node = |value: &str| Node::Iri(value.into());
    let statements = vec![
        Statement::new(node("ex:s"), "ex:p", blank("l0").into()),
        Statement::new(node("ex:s"), "ex:q", blank("l0").into()),
        Statement::new(blank("l0"), RDF_FIRST, node("ex:a").into()),
        Statement::new(blank("l0"), RDF_REST, Object::Node(node(RDF_NIL))),
    ];
    let facts = FactSet::from_statements(&statements);

    let shared = Template::new(
        "ex:Shared",
        vec![Parameter::new("x"), Parameter::new("y")],
        vec![
            triple(iri("ex:s"), iri("ex:p"), Term::var("x")),
            triple(iri("ex:s"), iri("ex:q"), Term::var("y")),
        ],
    );
    let lib = library(vec![shared]);
    let evaluator = Evaluator::new(&lib, &facts, EvalConfig::default());

    let template = lib.resolve("ex:Shared").unwrap();
    let unchecked = evaluator.evaluate_template(template).unwrap();
    assert_eq!(unchecked.len(), 3);

    let result = evaluator.evaluate_query("ex:Shared").unwrap();
    assert_eq!(result.len(), 2);
    assert!(result
        .iter()
        .all(|m| m.terms().all(|t| t.as_list().is_none())));
}
