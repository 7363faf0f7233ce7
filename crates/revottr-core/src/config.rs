use serde::{Deserialize, Serialize};

/// Evaluation knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// How many extra times a list element may be repeated when inverting list
    /// expansion. Bounds the otherwise infinite space of generating lists.
    pub max_repetitions: usize,
    /// Evaluate the instances of a pattern on the rayon pool.
    pub parallel: bool,
    /// Cache template results by IRI for the lifetime of an evaluator.
    pub memoize: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_repetitions: 1,
            parallel: false,
            memoize: true,
        }
    }
}

impl EvalConfig {
    pub fn with_max_repetitions(mut self, max_repetitions: usize) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: EvalConfig = serde_json::from_str(r#"{"parallel": true}"#).unwrap();
        assert_eq!(cfg.max_repetitions, 1);
        assert!(cfg.parallel);
        assert!(cfg.memoize);
    }
}
