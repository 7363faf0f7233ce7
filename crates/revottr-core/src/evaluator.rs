//! Reverse evaluation of templates.
//!
//! Evaluating a template yields every binding of its parameters that is
//! consistent with the fact set. The base templates evaluate directly to the
//! fact bindings; any other template joins the bindings of its pattern
//! instances and then
//!
//! 1. projects onto its parameters (missing ones become `any`),
//! 2. drops bindings that violate a parameter's modifiers,
//! 3. splits bindings whose value equals a parameter default into the
//!    "given" and "omitted" readings,
//! 4. narrows placeholders to what each parameter admits,
//! 5. adds one binding per required parameter for "that parameter could not
//!    be supplied",
//! 6. prunes bindings dominated by a more general one.
//!
//! A query additionally rejects bindings that use one graph list twice.

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};
use crate::graph::FactSet;
use crate::lattice::{glb, param_placeholder};
use crate::library::{is_base_template, TemplateLibrary, NULLABLE_TRIPLE_IRI};
use crate::mapping::{inner_compatible, join_all, remove_subsumed, transform, Mapping, MappingSet};
use crate::model::{Instance, Template};
use crate::term::{Term, ANY};
use crate::unexpander::ListUnexpander;

pub struct Evaluator<'a> {
    library: &'a TemplateLibrary,
    facts: &'a FactSet,
    config: EvalConfig,
    memo: Mutex<AHashMap<String, Arc<MappingSet>>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(library: &'a TemplateLibrary, facts: &'a FactSet, config: EvalConfig) -> Self {
        Self {
            library,
            facts,
            config,
            memo: Mutex::new(AHashMap::new()),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate the template named `iri` as a top-level query.
    pub fn evaluate_query(&self, iri: &str) -> EvalResult<MappingSet> {
        let template = self.library.resolve(iri)?;
        let result = self.evaluate_template(template)?;

        let linear: MappingSet = result.iter().filter(|m| is_linear(m)).cloned().collect();
        debug!(
            template = %iri,
            bindings = linear.len(),
            rejected = result.len() - linear.len(),
            "query evaluated"
        );
        Ok(linear)
    }

    pub fn evaluate_template(&self, template: &Template) -> EvalResult<Arc<MappingSet>> {
        if self.config.memoize {
            if let Some(cached) = self.memo.lock().get(&template.iri) {
                return Ok(Arc::clone(cached));
            }
        }

        let result = Arc::new(if is_base_template(&template.iri) {
            self.base_bindings(template)
        } else {
            self.evaluate_pattern(template)?
        });

        if self.config.memoize {
            self.memo
                .lock()
                .insert(template.iri.clone(), Arc::clone(&result));
        }
        Ok(result)
    }

    fn base_bindings(&self, template: &Template) -> MappingSet {
        if template.iri == NULLABLE_TRIPLE_IRI {
            self.facts.nullable().clone()
        } else {
            self.facts.triples().clone()
        }
    }

    fn evaluate_pattern(&self, template: &Template) -> EvalResult<MappingSet> {
        let per_instance: Vec<MappingSet> = if self.config.parallel {
            template
                .pattern
                .par_iter()
                .map(|instance| self.evaluate_instance(instance))
                .collect::<EvalResult<_>>()?
        } else {
            template
                .pattern
                .iter()
                .map(|instance| self.evaluate_instance(instance))
                .collect::<EvalResult<_>>()?
        };

        let internal = if template.pattern.is_empty() {
            MappingSet::from([Mapping::new()])
        } else {
            join_all(per_instance.iter())
        };

        let mut results = MappingSet::new();
        for binding in &internal {
            let projected = binding.project(template.vars(), &ANY);
            if !respects_modifiers(template, &projected) {
                continue;
            }
            for variant in default_variants(template, projected) {
                if let Some(narrowed) = narrow_placeholders(template, variant) {
                    results.insert(narrowed);
                }
            }
        }
        results.extend(absent_bindings(template));

        let pruned = remove_subsumed(results);
        debug!(
            template = %template.iri,
            instances = template.pattern.len(),
            internal = internal.len(),
            bindings = pruned.len(),
            "template evaluated"
        );
        Ok(pruned)
    }

    /// Bindings of `instance`'s own argument variables.
    pub fn evaluate_instance(&self, instance: &Instance) -> EvalResult<MappingSet> {
        let template = self.library.resolve(&instance.template)?;
        check_instance(template, instance)?;

        let mut values = self.evaluate_template(template)?;
        if let Some(expander) = instance.list_expander {
            let unexpander =
                ListUnexpander::for_instance(template, instance, self.config.max_repetitions);
            values = Arc::new(unexpander.invert(expander, &values));
        }

        let args: Mapping = template
            .vars()
            .cloned()
            .zip(instance.arguments.iter().map(|arg| arg.term.clone()))
            .collect();

        let out: MappingSet = values
            .iter()
            .filter(|m| inner_compatible(m, &args))
            .filter_map(|m| transform(m, &args))
            .collect();

        trace!(
            template = %instance.template,
            expander = ?instance.list_expander,
            values = values.len(),
            bindings = out.len(),
            "instance evaluated"
        );
        Ok(out)
    }
}

fn check_instance(template: &Template, instance: &Instance) -> EvalResult<()> {
    let malformed = |reason: String| EvalError::MalformedInstance {
        template: instance.template.clone(),
        reason,
    };

    if template.parameters.len() != instance.arguments.len() {
        return Err(malformed(format!(
            "expected {} arguments, got {}",
            template.parameters.len(),
            instance.arguments.len()
        )));
    }
    match (instance.list_expander, instance.has_expanded_arguments()) {
        (Some(expander), false) => Err(malformed(format!(
            "list expander {expander} without list-expanded arguments"
        ))),
        (None, true) => Err(malformed(
            "list-expanded arguments without a list expander".to_string(),
        )),
        _ => Ok(()),
    }
}

fn respects_modifiers(template: &Template, binding: &Mapping) -> bool {
    template.parameters.iter().all(|p| match binding.get(&p.var) {
        Some(Term::None) => p.optional,
        Some(Term::BlankNode(_)) => !p.non_blank,
        _ => true,
    })
}

/// Both readings of every value that equals its parameter's default.
fn default_variants(template: &Template, binding: Mapping) -> Vec<Mapping> {
    let mut variants = vec![binding];
    for p in &template.parameters {
        let Some(default) = &p.default else {
            continue;
        };
        if variants[0].get(&p.var) != Some(default) {
            continue;
        }
        let omitted: Vec<Mapping> = variants
            .iter()
            .map(|v| v.clone().with(p.var.clone(), Term::None))
            .collect();
        variants.extend(omitted);
    }
    variants
}

fn narrow_placeholders(template: &Template, mut binding: Mapping) -> Option<Mapping> {
    for p in &template.parameters {
        let Some(Term::Placeholder(placeholder)) = binding.get(&p.var) else {
            continue;
        };
        let narrowed = glb(&Term::Placeholder(*placeholder), &param_placeholder(p))?;
        binding.insert(p.var.clone(), narrowed);
    }
    Some(binding)
}

fn absent_bindings(template: &Template) -> impl Iterator<Item = Mapping> + '_ {
    template
        .parameters
        .iter()
        .filter(|absent| !absent.optional)
        .map(|absent| {
            template
                .parameters
                .iter()
                .map(|p| {
                    let term = if p.var == absent.var {
                        Term::None
                    } else {
                        param_placeholder(p)
                    };
                    (p.var.clone(), term)
                })
                .collect()
        })
}

/// No graph list (by identity) occurs twice in `binding`.
fn is_linear(binding: &Mapping) -> bool {
    fn visit<'t>(term: &'t Term, seen: &mut AHashSet<&'t str>) -> bool {
        let Term::List(list) = term else {
            return true;
        };
        if !list.is_unexpanded() && !list.is_empty() {
            if let Some(id) = list.id() {
                if !seen.insert(id) {
                    return false;
                }
            }
        }
        list.elements().iter().all(|t| visit(t, seen))
    }

    let mut seen = AHashSet::new();
    binding.terms().all(|t| visit(t, &mut seen))
}
