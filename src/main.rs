//! CLI entry point for the trip ETL pipeline.
//!
//! Provides subcommands for running the clean → derive → aggregate → write
//! pipeline over a trip record file, and for printing the schema description
//! of the derived dataset.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use trip_etl::{
    analyzers::DEFAULT_HIGH_VALUE_THRESHOLD,
    features::PeakHours,
    output::{SCHEMA_DESCRIPTION, print_summary_json},
    pipeline::{PipelineConfig, run_pipeline},
    schema::TripSchema,
    sink::Destination,
};

#[derive(Parser)]
#[command(name = "trip_etl")]
#[command(about = "Clean trip records and publish summary views as Parquet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a delimited trip record file
    Run {
        /// Delimited input file with a header row
        #[arg(short, long, env = "TRIP_ETL_INPUT")]
        input: PathBuf,

        /// Destination root: a local directory or s3://bucket/prefix
        #[arg(short, long, env = "TRIP_ETL_OUTPUT", default_value = "parquet")]
        output: String,

        /// Field delimiter of the input file
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,

        /// JSON file overriding input column names per role
        #[arg(long, env = "TRIP_ETL_SCHEMA_FILE")]
        schema_file: Option<PathBuf>,

        /// Hours of the day counted as peak
        #[arg(long, value_delimiter = ',', default_values_t = PeakHours::RUSH_HOURS)]
        peak_hours: Vec<u32>,

        /// Revenue per mile above which a trip is high value
        #[arg(long, default_value_t = DEFAULT_HIGH_VALUE_THRESHOLD)]
        high_value_threshold: f64,

        /// Also write the cleaned and derived dataset as CSV to this path
        #[arg(long, env = "TRIP_ETL_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Log a description of how monthly revenue is computed
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
    /// Print the schema description of the derived dataset
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/trip_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("trip_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            delimiter,
            schema_file,
            peak_hours,
            high_value_threshold,
            snapshot,
            explain,
        } => {
            if !delimiter.is_ascii() {
                bail!("delimiter must be a single ASCII character, got '{delimiter}'");
            }

            let schema = match &schema_file {
                Some(path) => TripSchema::load(path)
                    .with_context(|| format!("loading schema overrides from {}", path.display()))?,
                None => TripSchema::default(),
            };

            let config = PipelineConfig {
                delimiter: delimiter as u8,
                schema,
                peak_hours: PeakHours::new(peak_hours)?,
                high_value_threshold,
                explain,
                snapshot,
                ..PipelineConfig::new(input, output.parse::<Destination>()?)
            };

            info!(
                input = %config.input.display(),
                output = %output,
                peak_hours = ?config.peak_hours.hours(),
                high_value_threshold,
                "Starting pipeline"
            );

            let summary = run_pipeline(&config).await?;
            print_summary_json(&summary)?;
        }
        Commands::Schema => {
            print!("{SCHEMA_DESCRIPTION}");
        }
    }

    Ok(())
}
