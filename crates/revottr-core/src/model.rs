//! Template model: parameters, arguments, instances and templates.
//!
//! These are already-parsed structures; building them from a template
//! language is the job of a loader (see [`crate::library::TemplateLibrary::from_json`]
//! for the JSON form used by the CLI).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EvalError;
use crate::term::{Term, Var};

pub const OTTR_NS: &str = "http://ns.ottr.xyz/0.4/";

// ============================================================================
// Parameters
// ============================================================================

/// A formal template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub var: Var,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub non_blank: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Term>,
}

impl Parameter {
    pub fn new(var: impl Into<Var>) -> Self {
        Self {
            var: var.into(),
            optional: false,
            non_blank: false,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn non_blank(mut self) -> Self {
        self.non_blank = true;
        self
    }

    pub fn with_default(mut self, default: Term) -> Self {
        self.default = Some(default);
        self
    }
}

// ============================================================================
// Instances
// ============================================================================

/// An instance argument; `list_expanded` marks the `++` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub term: Term,
    #[serde(default)]
    pub list_expanded: bool,
}

impl Argument {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            list_expanded: false,
        }
    }

    pub fn expanded(term: Term) -> Self {
        Self {
            term,
            list_expanded: true,
        }
    }
}

impl From<Term> for Argument {
    fn from(term: Term) -> Self {
        Argument::new(term)
    }
}

/// Forward list-expansion strategy of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListExpander {
    Cross,
    ZipMin,
    ZipMax,
}

impl ListExpander {
    pub fn as_str(self) -> &'static str {
        match self {
            ListExpander::Cross => "cross",
            ListExpander::ZipMin => "zipMin",
            ListExpander::ZipMax => "zipMax",
        }
    }
}

impl fmt::Display for ListExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListExpander {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.strip_prefix(OTTR_NS).unwrap_or(s);
        match local {
            "cross" => Ok(ListExpander::Cross),
            "zipMin" => Ok(ListExpander::ZipMin),
            "zipMax" => Ok(ListExpander::ZipMax),
            _ => Err(EvalError::UnsupportedListExpander {
                expander: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ListExpander {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListExpander> for String {
    fn from(value: ListExpander) -> Self {
        value.as_str().to_string()
    }
}

/// A use of a template inside another template's pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub template: String,
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_expander: Option<ListExpander>,
}

impl Instance {
    pub fn new(template: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            template: template.into(),
            arguments,
            list_expander: None,
        }
    }

    pub fn with_expander(mut self, expander: ListExpander) -> Self {
        self.list_expander = Some(expander);
        self
    }

    pub fn has_expanded_arguments(&self) -> bool {
        self.arguments.iter().any(|a| a.list_expanded)
    }
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub iri: String,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub pattern: Vec<Instance>,
}

impl Template {
    pub fn new(iri: impl Into<String>, parameters: Vec<Parameter>, pattern: Vec<Instance>) -> Self {
        Self {
            iri: iri.into(),
            parameters,
            pattern,
        }
    }

    pub fn vars(&self) -> impl Iterator<Item = &Var> {
        self.parameters.iter().map(|p| &p.var)
    }

    pub fn parameter(&self, var: &Var) -> Option<&Parameter> {
        self.parameters.iter().find(|p| &p.var == var)
    }
}
