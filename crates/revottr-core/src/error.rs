use thiserror::Error;

/// Fatal evaluation errors.
///
/// Incompatible bindings are not errors; they surface as `None` or an empty
/// binding set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown template: {iri}")]
    UnknownTemplate { iri: String },

    #[error("malformed instance of {template}: {reason}")]
    MalformedInstance { template: String, reason: String },

    #[error("unsupported list expander: {expander}")]
    UnsupportedListExpander { expander: String },
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("template library JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate template definition: {iri}")]
    Duplicate { iri: String },
}

pub type EvalResult<T> = Result<T, EvalError>;
