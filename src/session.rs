//! Holder of the most recent successful batch, read by the export step.

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result, codec, model::PredictionResult, normalize::SkippedRow};

/// Results of one successful batch run.
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<PredictionResult>,
    pub skipped_rows: Vec<SkippedRow>,
    pub vacuous_rows: usize,
}

impl ScoredBatch {
    pub fn new(
        results: Vec<PredictionResult>,
        skipped_rows: Vec<SkippedRow>,
        vacuous_rows: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed_at: Utc::now(),
            results,
            skipped_rows,
            vacuous_rows,
        }
    }

    pub fn scored_count(&self) -> usize {
        self.results.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_rows.len()
    }

    pub fn flagged_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_fraud).count()
    }
}

/// Process-wide slot for the latest batch. Cloning shares the slot.
///
/// The slot is replaced whole by the batch workflow and never merged.
#[derive(Debug, Clone, Default)]
pub struct BatchSession {
    slot: Arc<RwLock<Option<Arc<ScoredBatch>>>>,
}

impl BatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replace(&self, batch: ScoredBatch) -> Arc<ScoredBatch> {
        let batch = Arc::new(batch);
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.replace(batch.clone()) {
            info!("Batch {} replaced by {}", previous.id, batch.id);
        }
        batch
    }

    pub fn current(&self) -> Option<Arc<ScoredBatch>> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drops the stored batch, as on page teardown.
    pub fn clear(&self) {
        self.slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    pub fn export(&self) -> Result<Vec<u8>> {
        let batch = self
            .current()
            .filter(|b| !b.results.is_empty())
            .ok_or(Error::ExportWithNoData)?;
        codec::encode(&batch.results)
    }

    /// Writes the export to `path`; nothing is created when there is no batch.
    pub async fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.export()?;
        tokio::fs::write(path.as_ref(), &bytes).await?;
        info!(
            "Exported {} bytes to {}",
            bytes.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
