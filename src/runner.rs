use std::path::{Path, PathBuf};
use std::sync::Arc;

use cbir_fast_descriptors::{DescriptorAggregator, FingerprintReport};
use cbir_fast_feedback::refine_query;
use cbir_fast_types::RelevanceFeedbackRequest;
use tokio::{fs, task};
use tracing::{info, warn};

use crate::cli::Command;
use crate::error::AppError;
use crate::output::{ArtifactStore, FingerprintRecord, RefineRecord, write_json};
use crate::progress::batch_bar;
use crate::settings::EffectiveSettings;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Executes one subcommand and writes its JSON document.
pub async fn run(command: Command, settings: &EffectiveSettings) -> Result<RunSummary, AppError> {
    let output = &settings.output;
    match command {
        Command::Fingerprint(args) => {
            let records = fingerprint_images(&args.images, settings).await?;
            write_json(output.path.as_deref(), &records, output.pretty).await?;
            Ok(RunSummary {
                processed: records.len(),
                failed: records.iter().filter(|record| record.is_failed()).count(),
            })
        }
        Command::Refine(args) => {
            let record = refine_request(&args.request).await?;
            write_json(output.path.as_deref(), &record, output.pretty).await?;
            Ok(RunSummary {
                processed: 1,
                failed: 0,
            })
        }
    }
}

/// Fingerprints every image in order. A failing image yields an error
/// entry and the batch moves on; only setup failures abort.
pub async fn fingerprint_images(
    images: &[PathBuf],
    settings: &EffectiveSettings,
) -> Result<Vec<FingerprintRecord>, AppError> {
    let aggregator = Arc::new(DescriptorAggregator::new(settings.descriptors.clone())?);
    let store = match settings.output.artifacts.clone() {
        Some(artifacts) => {
            let store = ArtifactStore::new(artifacts);
            store.prepare().await?;
            Some(store)
        }
        None => None,
    };

    let bar = batch_bar(images.len() as u64);
    let mut records = Vec::with_capacity(images.len());
    for path in images {
        bar.set_message(display_name(path));
        let record = match fingerprint_one(&aggregator, store.as_ref(), path).await {
            Ok(record) => record,
            Err(err) => {
                warn!(image = %path.display(), error = %err, "image skipped");
                FingerprintRecord::failed(path, &err)
            }
        };
        records.push(record);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let failed = records.iter().filter(|record| record.is_failed()).count();
    info!(images = records.len(), failed, "batch finished");
    Ok(records)
}

async fn fingerprint_one(
    aggregator: &Arc<DescriptorAggregator>,
    store: Option<&ArtifactStore>,
    path: &Path,
) -> Result<FingerprintRecord, AppError> {
    let bytes = fs::read(path).await.map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let worker = Arc::clone(aggregator);
    let report = task::spawn_blocking(move || worker.compute_encoded(&bytes)).await??;

    let FingerprintReport {
        fingerprint,
        artifacts,
        degraded,
    } = report;
    let persisted = match store {
        Some(store) => store.persist_all(artifacts).await?,
        None => Vec::new(),
    };
    Ok(FingerprintRecord::completed(
        path,
        fingerprint,
        &degraded,
        persisted,
    ))
}

pub async fn refine_request(path: &Path) -> Result<RefineRecord, AppError> {
    let bytes = fs::read(path).await.map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let request: RelevanceFeedbackRequest =
        serde_json::from_slice(&bytes).map_err(|source| AppError::Request {
            path: path.to_path_buf(),
            source,
        })?;
    let refined = refine_query(&request)?;
    info!(
        dimensions = refined.len(),
        relevant = request.relevant_examples.len(),
        non_relevant = request.non_relevant_examples.len(),
        "query refined"
    );
    Ok(RefineRecord::new(refined))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
