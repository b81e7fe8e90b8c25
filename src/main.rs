//! CLI entry point for the NMI meter summarizer.
//!
//! Runs the summary handler for one meter file, either by identifier or from
//! a raw invocation event, against S3 or a local directory.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nmi_summarizer::{
    config::StorageConfig,
    handler::{InvocationEvent, handle, handle_json},
    output::{print_json, print_pretty, write_json},
    store::{BlobStore, LocalBlobStore, S3BlobStore},
    summarizer::TimeSeriesSummarizer,
};
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "nmi_summarizer")]
#[command(about = "Summarize interval meter CSV files into hourly and daily buckets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one meter file by identifier
    Summarize {
        /// File name within the configured folder (e.g. "6001234567.csv")
        #[arg(value_name = "FILE")]
        file: String,

        /// Optional: write the response JSON to this path as well
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Handle a raw invocation event such as {"file": "6001234567.csv"}
    Invoke {
        /// Path to the event JSON, or "-" for stdin
        #[arg(value_name = "EVENT_JSON")]
        event: String,

        #[command(flatten)]
        storage: StorageArgs,
    },
}

#[derive(Args)]
struct StorageArgs {
    /// Optional: JSON storage config file
    #[arg(long)]
    config: Option<String>,

    /// Serve objects from this directory instead of S3
    #[arg(long)]
    local_dir: Option<PathBuf>,

    #[arg(long)]
    bucket: Option<String>,

    /// Key prefix prepended to the file name (e.g. "nmi/")
    #[arg(long)]
    folder: Option<String>,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    endpoint: Option<String>,

    /// Directory the fetched file is staged in before parsing
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

impl StorageArgs {
    /// Defaults, then the config file, then `NMI_*` env vars, then flags.
    fn resolve(&self) -> Result<StorageConfig> {
        let base = match &self.config {
            Some(path) => StorageConfig::load(path)?,
            None => StorageConfig::default(),
        };
        let mut config = base.with_env();

        if let Some(v) = &self.bucket {
            config.bucket = v.clone();
        }
        if let Some(v) = &self.folder {
            config.folder = v.clone();
        }
        if let Some(v) = &self.region {
            config.region = v.clone();
        }
        if let Some(v) = &self.endpoint {
            config.endpoint = v.clone();
        }
        if let Some(v) = &self.scratch_dir {
            config.scratch_dir = v.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            file,
            output,
            storage,
        } => {
            let summarizer = build_summarizer(&storage).await?;
            let response = handle(&summarizer, InvocationEvent { file }).await?;

            print_pretty(&response);
            print_json(&response)?;
            if let Some(path) = output {
                write_json(&path, &response)?;
            }
        }
        Commands::Invoke { event, storage } => {
            let raw = read_event(&event)?;
            let summarizer = build_summarizer(&storage).await?;
            let response = handle_json(&summarizer, &raw).await?;

            print_pretty(&response);
            print_json(&response)?;
        }
    }

    Ok(())
}

/// Builds a summarizer over the store selected by `storage`: a local
/// directory when `--local-dir` is given, S3 otherwise.
async fn build_summarizer(storage: &StorageArgs) -> Result<TimeSeriesSummarizer<Box<dyn BlobStore>>> {
    let config = storage.resolve()?;

    let store: Box<dyn BlobStore> = match &storage.local_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Serving objects from local directory");
            Box::new(LocalBlobStore::new(dir))
        }
        None => {
            info!(
                bucket = %config.bucket,
                region = %config.region,
                endpoint = %config.endpoint,
                "Serving objects from S3"
            );
            Box::new(S3BlobStore::from_config(&config).await)
        }
    };

    Ok(TimeSeriesSummarizer::new(store, config))
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read event from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read event '{source}'"))
    }
}

/// Logging setup: colored stderr + JSON rolling log file.
///
/// The returned guard flushes the file writer on drop and must outlive `main`'s work.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/nmi_summarizer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("nmi_summarizer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

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

    Ok(file_guard)
}
