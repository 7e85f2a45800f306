use std::fmt;

use thiserror::Error;

pub type FeedbackResult<T> = Result<T, FeedbackError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExampleSet {
    Relevant,
    NonRelevant,
}

impl ExampleSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExampleSet::Relevant => "relevant",
            ExampleSet::NonRelevant => "non-relevant",
        }
    }
}

impl fmt::Display for ExampleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FeedbackError {
    #[error("no relevant or non-relevant examples supplied")]
    NoExamples,

    #[error("query vector is empty")]
    EmptyQuery,

    #[error(
        "{set} example {index} has dimensionality {actual}, query has {expected}"
    )]
    DimensionMismatch {
        set: ExampleSet,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("weight {name} must be finite, got {value}")]
    NonFiniteWeight { name: &'static str, value: f64 },

    #[error("non-finite value in {origin}")]
    NonFiniteValue { origin: String },
}
