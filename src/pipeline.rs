//! End-to-end orchestration: load, clean, derive, aggregate, write.
//!
//! Each stage fully materializes its output before the next one starts.
//! Only the three aggregations and the three writes run concurrently.

use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, warn};

use crate::analyzers::plan::explain_monthly_revenue;
use crate::analyzers::{Aggregator, AggregatorConfig, DEFAULT_HIGH_VALUE_THRESHOLD, ViewName};
use crate::cleaner::{CleanReport, clean};
use crate::error::{EtlError, Result};
use crate::features::{FeatureDeriver, PeakHours};
use crate::loader::load_trips;
use crate::output::export_snapshot;
use crate::schema::TripSchema;
use crate::sink::{ArtifactStore, Destination, write_views};

/// Everything a single run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub delimiter: u8,
    pub destination: Destination,
    pub schema: TripSchema,
    pub peak_hours: PeakHours,
    pub high_value_threshold: f64,
    /// Log the monthly revenue plan after aggregation.
    pub explain: bool,
    /// Also write the derived dataset as CSV here.
    pub snapshot: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, destination: Destination) -> Self {
        Self {
            input: input.into(),
            delimiter: b',',
            destination,
            schema: TripSchema::default(),
            peak_hours: PeakHours::default(),
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
            explain: false,
            snapshot: None,
        }
    }
}

/// Outcome of one view in a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub name: String,
    pub rows: usize,
    pub location: Option<String>,
    pub error: Option<String>,
}

/// What a run did, suitable for JSON reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub input: String,
    pub clean: CleanReport,
    pub derived_rows: usize,
    pub views: Vec<ViewSummary>,
    pub snapshot: Option<String>,
}

impl RunSummary {
    pub fn view(&self, name: ViewName) -> Option<&ViewSummary> {
        self.views.iter().find(|v| v.name == name.as_str())
    }

    pub fn failed_views(&self) -> Vec<String> {
        self.views
            .iter()
            .filter(|v| v.error.is_some())
            .map(|v| v.name.clone())
            .collect()
    }
}

/// Lifetime of one pipeline run.
///
/// Dropping the scope logs how the run ended, on success and failure alike.
struct RunScope {
    run_id: String,
    started: Instant,
    completed: bool,
}

impl RunScope {
    fn begin() -> Self {
        let run_id = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        info!(run_id = %run_id, "Pipeline run started");
        Self {
            run_id,
            started: Instant::now(),
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if self.completed {
            info!(run_id = %self.run_id, elapsed_ms, "Pipeline run finished");
        } else {
            warn!(run_id = %self.run_id, elapsed_ms, "Pipeline run aborted");
        }
    }
}

/// Runs the pipeline, publishing to `config.destination`.
///
/// The store is opened inside the run scope, so destination setup is part of
/// the run's span and lifecycle log.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    run_scoped(config, || config.destination.open_store()).await
}

/// Runs the pipeline against an already-built store.
///
/// # Errors
///
/// Fails before reading any data on invalid configuration, on load errors,
/// and with [`EtlError::WriteFailures`] if any view could not be published.
/// The other views are still written in that case.
pub async fn run_pipeline_with_store(
    config: &PipelineConfig,
    store: Arc<dyn ArtifactStore>,
) -> Result<RunSummary> {
    run_scoped(config, || std::future::ready(store)).await
}

async fn run_scoped<F, Fut>(config: &PipelineConfig, open_store: F) -> Result<RunSummary>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Arc<dyn ArtifactStore>>,
{
    let mut scope = RunScope::begin();
    let span = tracing::info_span!("pipeline_run", run_id = %scope.run_id);
    let run_id = scope.run_id.clone();

    let summary = async move {
        let store = open_store().await;
        run_stages(config, store, run_id).await
    }
    .instrument(span)
    .await?;

    let failed = summary.failed_views();
    if !failed.is_empty() {
        error!(failed = ?failed, "Some views were not written");
        return Err(EtlError::WriteFailures(failed));
    }

    scope.complete();
    Ok(summary)
}

async fn run_stages(
    config: &PipelineConfig,
    store: Arc<dyn ArtifactStore>,
    run_id: String,
) -> Result<RunSummary> {
    let deriver = FeatureDeriver::new(config.peak_hours);
    let aggregator = Aggregator::new(AggregatorConfig {
        high_value_threshold: config.high_value_threshold,
    })?;

    let raw = {
        let input = config.input.clone();
        let schema = config.schema.clone();
        let delimiter = config.delimiter;
        tokio::task::spawn_blocking(move || load_trips(&input, &schema, delimiter))
            .await
            .map_err(|e| EtlError::TaskJoin(e.to_string()))??
    };

    let cleaned = clean(raw);
    let report = cleaned.report;
    let derived = deriver.derive(cleaned.trips);
    let derived_rows = derived.len();

    let snapshot = match &config.snapshot {
        Some(path) => {
            export_snapshot(path, &derived)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let views = aggregator.compute_views(Arc::new(derived)).await?;

    if config.explain {
        let plan = explain_monthly_revenue(
            &config.input.display().to_string(),
            &report,
            derived_rows,
            views.monthly_revenue.len(),
        );
        info!("\n{plan}");
    }

    let outcomes = write_views(store, &views).await;

    let views = outcomes
        .into_iter()
        .map(|outcome| {
            let (location, error) = match outcome.result {
                Ok(location) => (Some(location), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ViewSummary {
                name: outcome.view.to_string(),
                rows: outcome.rows,
                location,
                error,
            }
        })
        .collect();

    Ok(RunSummary {
        run_id,
        input: config.input.display().to_string(),
        clean: report,
        derived_rows,
        views,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LocalStore;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_trips.csv")
    }

    #[tokio::test]
    async fn test_store_is_opened_inside_run_span() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("parquet");
        let config = PipelineConfig::new(fixture(), Destination::Local(out.clone()));
        let seen = Arc::new(Mutex::new(None));

        let summary = {
            let seen = Arc::clone(&seen);
            run_scoped(&config, move || {
                let span = tracing::Span::current();
                *seen.lock().unwrap() = span.metadata().map(|m| m.name());
                let store: Arc<dyn ArtifactStore> = Arc::new(LocalStore::new(&out));
                std::future::ready(store)
            })
            .await
            .unwrap()
        };

        assert_eq!(*seen.lock().unwrap(), Some("pipeline_run"));
        assert_eq!(summary.views.len(), 3);
        assert!(summary.failed_views().is_empty());
    }
}
