use std::fmt;
use std::path::Path;

use cbir_fast_descriptors::ArtifactKind;
use cbir_fast_types::Fingerprint;
use serde::Serialize;

/// A persisted overlay, addressed through the static prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub url: String,
}

/// One entry of a batch run. Exactly one of `fingerprint` and `error` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintRecord {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FingerprintRecord {
    pub fn completed(
        image: &Path,
        fingerprint: Fingerprint,
        degraded: &[&str],
        artifacts: Vec<ArtifactRecord>,
    ) -> Self {
        Self {
            image: image.display().to_string(),
            fingerprint: Some(fingerprint),
            artifacts,
            degraded: degraded.iter().map(|name| name.to_string()).collect(),
            error: None,
        }
    }

    pub fn failed(image: &Path, error: impl fmt::Display) -> Self {
        Self {
            image: image.display().to_string(),
            fingerprint: None,
            artifacts: Vec::new(),
            degraded: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRecord {
    pub refined_query: Vec<f64>,
    pub dimensions: usize,
}

impl RefineRecord {
    pub fn new(refined_query: Vec<f64>) -> Self {
        Self {
            dimensions: refined_query.len(),
            refined_query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_record_omits_fingerprint_fields() {
        let record = FingerprintRecord::failed(Path::new("broken.png"), "failed to decode image");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({ "image": "broken.png", "error": "failed to decode image" })
        );
        assert!(record.is_failed());
    }

    #[test]
    fn completed_record_lists_artifacts_and_degradations() {
        let artifact = ArtifactRecord {
            kind: ArtifactKind::ShapeContour,
            file_name: "a.png".into(),
            url: "/static/a.png".into(),
        };
        let record = FingerprintRecord::completed(
            Path::new("in.jpg"),
            Fingerprint::default(),
            &["dominant_colors"],
            vec![artifact],
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fingerprint"]["schemaVersion"], 1);
        assert_eq!(value["artifacts"][0]["kind"], "shapeContour");
        assert_eq!(value["artifacts"][0]["fileName"], "a.png");
        assert_eq!(value["degraded"], json!(["dominant_colors"]));
        assert!(value.get("error").is_none());
    }
}
