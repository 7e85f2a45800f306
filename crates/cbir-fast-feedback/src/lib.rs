//! Relevance feedback for retrieval queries.

mod error;
mod rocchio;

pub use error::{ExampleSet, FeedbackError, FeedbackResult};
pub use rocchio::refine_query;
