use cbir_fast_types::RelevanceFeedbackRequest;
use tracing::debug;

use crate::error::{ExampleSet, FeedbackError, FeedbackResult};

/// Rocchio query point movement: `q' = q + alpha * mean(R) - beta * mean(N)`.
///
/// Each term is applied only when its example set is non-empty. Inputs are
/// validated before any arithmetic; a request either yields a full vector of
/// the query's dimensionality or an error.
pub fn refine_query(request: &RelevanceFeedbackRequest) -> FeedbackResult<Vec<f64>> {
    validate(request)?;

    let query = &request.query_fingerprint;
    let mut refined = query.clone();

    if let Some(centroid) = centroid(&request.relevant_examples, query.len()) {
        for (value, mean) in refined.iter_mut().zip(centroid) {
            *value += request.alpha * mean;
        }
    }
    if let Some(centroid) = centroid(&request.non_relevant_examples, query.len()) {
        for (value, mean) in refined.iter_mut().zip(centroid) {
            *value -= request.beta * mean;
        }
    }

    if refined.iter().any(|v| !v.is_finite()) {
        return Err(FeedbackError::NonFiniteValue {
            origin: "refined query".into(),
        });
    }

    debug!(
        dims = query.len(),
        relevant = request.relevant_examples.len(),
        non_relevant = request.non_relevant_examples.len(),
        alpha = request.alpha,
        beta = request.beta,
        "refined query vector"
    );
    Ok(refined)
}

fn validate(request: &RelevanceFeedbackRequest) -> FeedbackResult<()> {
    if request.relevant_examples.is_empty() && request.non_relevant_examples.is_empty() {
        return Err(FeedbackError::NoExamples);
    }
    let expected = request.query_fingerprint.len();
    if expected == 0 {
        return Err(FeedbackError::EmptyQuery);
    }
    for (name, value) in [("alpha", request.alpha), ("beta", request.beta)] {
        if !value.is_finite() {
            return Err(FeedbackError::NonFiniteWeight { name, value });
        }
    }
    if request.query_fingerprint.iter().any(|v| !v.is_finite()) {
        return Err(FeedbackError::NonFiniteValue {
            origin: "query vector".into(),
        });
    }

    let sets = [
        (ExampleSet::Relevant, &request.relevant_examples),
        (ExampleSet::NonRelevant, &request.non_relevant_examples),
    ];
    for (set, examples) in sets {
        for (index, example) in examples.iter().enumerate() {
            if example.len() != expected {
                return Err(FeedbackError::DimensionMismatch {
                    set,
                    index,
                    expected,
                    actual: example.len(),
                });
            }
            if example.iter().any(|v| !v.is_finite()) {
                return Err(FeedbackError::NonFiniteValue {
                    origin: format!("{set} example {index}"),
                });
            }
        }
    }
    Ok(())
}

fn centroid(examples: &[Vec<f64>], dims: usize) -> Option<Vec<f64>> {
    if examples.is_empty() {
        return None;
    }
    let mut sums = vec![0.0f64; dims];
    for example in examples {
        for (sum, value) in sums.iter_mut().zip(example) {
            *sum += value;
        }
    }
    let count = examples.len() as f64;
    for sum in sums.iter_mut() {
        *sum /= count;
    }
    Some(sums)
}
