//! Persistence of summary views as Parquet artifacts.
//!
//! Each view is converted to an Arrow batch, encoded to Parquet in memory,
//! and handed to an [`ArtifactStore`] that publishes it all-or-nothing.
//! [`LocalStore`] renames a synced temp file into place; [`S3Store`] relies
//! on `PutObject` replacing the object atomically.

pub mod batch;
pub mod encode;
mod local;
mod s3;
mod store;

pub use batch::{ToRecordBatch, view_batch};
pub use encode::encode_parquet;
pub use local::LocalStore;
pub use s3::S3Store;
pub use store::ArtifactStore;

use bytes::Bytes;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Instrument, error, info};

use crate::analyzers::{ViewName, Views};
use crate::error::{EtlError, Result};

/// Root under which artifacts are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Local(PathBuf),
    S3 { bucket: String, prefix: String },
}

impl FromStr for Destination {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("s3://") {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(EtlError::InvalidConfig(format!(
                    "S3 destination '{s}' has no bucket"
                )));
            }
            return Ok(Destination::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            });
        }
        if s.is_empty() {
            return Err(EtlError::InvalidConfig("destination is empty".into()));
        }
        Ok(Destination::Local(PathBuf::from(s)))
    }
}

impl Destination {
    /// Builds the store for this destination.
    pub async fn open_store(&self) -> Arc<dyn ArtifactStore> {
        match self {
            Destination::Local(root) => Arc::new(LocalStore::new(root.clone())),
            Destination::S3 { bucket, prefix } => {
                Arc::new(S3Store::from_env(bucket.clone(), prefix.clone()).await)
            }
        }
    }
}

/// Result of publishing one view.
#[derive(Debug)]
pub struct ViewWriteOutcome {
    pub view: ViewName,
    pub rows: usize,
    /// Published location on success.
    pub result: Result<String>,
}

fn as_write_failure(view: ViewName, err: EtlError) -> EtlError {
    match err {
        EtlError::WriteFailure { .. } => err,
        other => EtlError::WriteFailure {
            view: view.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Publishes every view concurrently.
///
/// A failure in one view does not stop the others; each outcome is returned
/// in [`ViewName::ALL`] order.
#[tracing::instrument(skip_all)]
pub async fn write_views(store: Arc<dyn ArtifactStore>, views: &Views) -> Vec<ViewWriteOutcome> {
    let mut tasks = Vec::new();

    for view in ViewName::ALL {
        let rows = views.row_count(view);
        let encoded = view_batch(views, view).and_then(|batch| encode_parquet(&batch));
        let store = Arc::clone(&store);
        let span = tracing::info_span!("write_view", view = %view, rows);

        let task = tokio::spawn(
            async move {
                let bytes = encoded?;
                store.put(view.as_str(), Bytes::from(bytes)).await
            }
            .instrument(span),
        );
        tasks.push((view, rows, task));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (view, rows, task) in tasks {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(EtlError::TaskJoin(e.to_string())),
        }
        .map_err(|e| as_write_failure(view, e));

        match &result {
            Ok(location) => info!(view = %view, rows, location = %location, "View written"),
            Err(e) => error!(view = %view, error = %e, "View write failed"),
        }

        outcomes.push(ViewWriteOutcome { view, rows, result });
    }

    outcomes
}
