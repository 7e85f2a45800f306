use serde::{Deserialize, Serialize};

pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_BETA: f64 = 0.5;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

/// Query vector plus user relevance judgments, consumed by one refinement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceFeedbackRequest {
    pub query_fingerprint: Vec<f64>,
    #[serde(default)]
    pub relevant_examples: Vec<Vec<f64>>,
    #[serde(default)]
    pub non_relevant_examples: Vec<Vec<f64>>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_beta")]
    pub beta: f64,
}

impl RelevanceFeedbackRequest {
    pub fn new(query: Vec<f64>) -> Self {
        Self {
            query_fingerprint: query,
            relevant_examples: Vec::new(),
            non_relevant_examples: Vec::new(),
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }

    pub fn with_relevant(mut self, example: Vec<f64>) -> Self {
        self.relevant_examples.push(example);
        self
    }

    pub fn with_non_relevant(mut self, example: Vec<f64>) -> Self {
        self.non_relevant_examples.push(example);
        self
    }

    pub fn with_weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_weights_use_defaults() {
        let request: RelevanceFeedbackRequest =
            serde_json::from_str(r#"{"queryFingerprint":[1.0],"relevantExamples":[[2.0]]}"#)
                .unwrap();
        assert_eq!(request.alpha, DEFAULT_ALPHA);
        assert_eq!(request.beta, DEFAULT_BETA);
        assert!(request.non_relevant_examples.is_empty());
    }
}
