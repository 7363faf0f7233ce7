//! Template store with the standard library fallback.

use ahash::AHashMap;
use std::sync::OnceLock;

use crate::error::{EvalError, EvalResult, LibraryError};
use crate::model::{Parameter, Template, OTTR_NS};

pub const TRIPLE_IRI: &str = "http://ns.ottr.xyz/0.4/Triple";
pub const NULLABLE_TRIPLE_IRI: &str = "http://ns.ottr.xyz/0.4/NullableTriple";

/// Formal variable names shared by both base templates.
pub const SUBJECT: &str = "subject";
pub const PREDICATE: &str = "predicate";
pub const OBJECT: &str = "object";

fn standard_library() -> &'static AHashMap<String, Template> {
    static STANDARD: OnceLock<AHashMap<String, Template>> = OnceLock::new();
    STANDARD.get_or_init(|| {
        let triple = Template::new(
            TRIPLE_IRI,
            vec![
                Parameter::new(SUBJECT),
                Parameter::new(PREDICATE).non_blank(),
                Parameter::new(OBJECT),
            ],
            Vec::new(),
        );
        let nullable = Template::new(
            NULLABLE_TRIPLE_IRI,
            vec![
                Parameter::new(SUBJECT).optional(),
                Parameter::new(PREDICATE).optional().non_blank(),
                Parameter::new(OBJECT).optional(),
            ],
            Vec::new(),
        );

        let mut map = AHashMap::new();
        map.insert(triple.iri.clone(), triple);
        map.insert(nullable.iri.clone(), nullable);
        map
    })
}

/// Is `iri` one of the base templates evaluated directly from facts?
pub fn is_base_template(iri: &str) -> bool {
    iri == TRIPLE_IRI || iri == NULLABLE_TRIPLE_IRI
}

/// The base template signatures (`ottr:Triple`, `ottr:NullableTriple`).
pub fn base_template(iri: &str) -> Option<&'static Template> {
    standard_library().get(iri)
}

/// User-supplied templates, resolved before the standard library.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: AHashMap<String, Template>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: Template) -> Result<(), LibraryError> {
        if self.templates.contains_key(&template.iri) {
            return Err(LibraryError::Duplicate { iri: template.iri });
        }
        self.templates.insert(template.iri.clone(), template);
        Ok(())
    }

    pub fn from_templates(
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<Self, LibraryError> {
        let mut library = Self::new();
        for template in templates {
            library.insert(template)?;
        }
        Ok(library)
    }

    /// Load a JSON array of templates.
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let templates: Vec<Template> = serde_json::from_str(json)?;
        Self::from_templates(templates)
    }

    /// Look up `iri`, falling back to the standard library. Short names such
    /// as `Triple` are read relative to the OTTR namespace.
    pub fn resolve(&self, iri: &str) -> EvalResult<&Template> {
        if let Some(template) = self.templates.get(iri) {
            return Ok(template);
        }
        if let Some(template) = base_template(iri) {
            return Ok(template);
        }
        if !iri.contains(':') {
            if let Some(template) = base_template(&format!("{OTTR_NS}{iri}")) {
                return Ok(template);
            }
        }
        Err(EvalError::UnknownTemplate {
            iri: iri.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Var;

    #[test]
    fn standard_templates_resolve_without_user_store() {
        let library = TemplateLibrary::new();
        let triple = library.resolve(TRIPLE_IRI).unwrap();
        assert_eq!(triple.parameters.len(), 3);
        assert!(triple.parameter(&Var::new(PREDICATE)).unwrap().non_blank);

        let nullable = library.resolve("NullableTriple").unwrap();
        assert!(nullable.parameters.iter().all(|p| p.optional));
    }

    #[test]
    fn unknown_iri_is_an_error() {
        let library = TemplateLibrary::new();
        assert_eq!(
            library.resolve("http://example.com/Missing").unwrap_err(),
            EvalError::UnknownTemplate {
                iri: "http://example.com/Missing".into()
            }
        );
    }

    #[test]
    fn json_library_rejects_duplicates() {
        let json = r#"[
            {"iri": "ex:T", "parameters": [{"var": "x"}]},
            {"iri": "ex:T", "parameters": []}
        ]"#;
        assert!(matches!(
            TemplateLibrary::from_json(json),
            Err(LibraryError::Duplicate { .. })
        ));
    }
}
