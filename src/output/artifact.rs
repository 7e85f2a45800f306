use std::io;
use std::path::{Path, PathBuf};

use cbir_fast_descriptors::{Artifact, encode_png};
use tokio::{fs, task};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::output::error::OutputError;
use crate::output::types::ArtifactRecord;
use crate::settings::ArtifactSettings;

/// Persists overlay images as `<uuid>.png` so concurrent runs never collide.
pub struct ArtifactStore {
    directory: PathBuf,
    static_prefix: String,
}

impl ArtifactStore {
    pub fn new(settings: ArtifactSettings) -> Self {
        Self {
            directory: settings.dir,
            static_prefix: settings.static_prefix,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn prepare(&self) -> Result<(), OutputError> {
        fs::create_dir_all(&self.directory).await?;
        Ok(())
    }

    pub async fn persist(&self, artifact: Artifact) -> Result<ArtifactRecord, OutputError> {
        let file_name = format!("{}.png", Uuid::new_v4());
        let path = self.directory.join(&file_name);
        let image = artifact.image;
        task::spawn_blocking(move || -> Result<(), OutputError> {
            let encoded = encode_png(&image)?;
            std::fs::write(path, encoded)?;
            Ok(())
        })
        .await??;
        debug!(kind = artifact.kind.as_str(), file = %file_name, "artifact written");
        Ok(ArtifactRecord {
            kind: artifact.kind,
            url: self.url_for(&file_name),
            file_name,
        })
    }

    /// Persists every artifact in order. If one fails, the files already
    /// written for this batch are removed before the error is returned.
    pub async fn persist_all(
        &self,
        artifacts: Vec<Artifact>,
    ) -> Result<Vec<ArtifactRecord>, OutputError> {
        let mut records = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match self.persist(artifact).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    self.discard(&records).await;
                    return Err(err);
                }
            }
        }
        Ok(records)
    }

    /// Removes persisted files. Missing files are ignored; other failures
    /// are logged and skipped.
    pub async fn discard(&self, records: &[ArtifactRecord]) {
        for record in records {
            let path = self.directory.join(&record.file_name);
            match fs::remove_file(&path).await {
                Ok(()) => debug!(file = %record.file_name, "artifact discarded"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(file = %path.display(), error = %err, "artifact not removed"),
            }
        }
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.static_prefix, file_name)
    }
}
