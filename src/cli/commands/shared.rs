//! Shared components for CLI commands
//!
//! This module contains logging setup, layered configuration loading,
//! progress-bar driven ingestion and output helpers used by every command.

use crate::app::services::workspace::Workspace;
use crate::cli::args::CommonArgs;
use crate::config::Config;
use crate::constants::progress::COMPLETE;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run statistics reported by every command
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Data rows accepted during ingestion
    pub rows_ingested: usize,
    /// Data rows skipped for a field count mismatch
    pub rows_skipped: usize,
    /// Rows kept after sampling
    pub rows_sampled: usize,
    /// Parameters reported or exported
    pub parameters: usize,
    /// Bytes written to an output file, if any
    pub output_size: Option<u64>,
    /// Total run time
    pub processing_time: Duration,
}

impl RunStats {
    /// Format a byte count in human-readable form
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` overrides the level derived from `-v` / `--quiet`.
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flight_processor={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber installed earlier in the process keeps precedence
    match result {
        Ok(()) => debug!("Logging initialized at level: {}", log_level),
        Err(e) => debug!("Logging already initialized: {}", e),
    }
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration(args: &CommonArgs) -> Result<Config> {
    match &args.config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => debug!("No config file given, checking the default location"),
    }

    let mut config = Config::load_layered(args.config_file.as_deref())?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, args: &CommonArgs) {
    if let Some(target_rows) = args.target_rows {
        config.sampling.target_rows = target_rows;
    }
    if let Some(batch_size) = args.batch_size {
        config.ingest.batch_size = batch_size;
    }
    if let Some(units_row) = args.units_row {
        config.ingest.units_row = units_row;
    }
    if args.fail_on_empty {
        config.ingest.fail_on_empty = true;
    }
}

/// Create a percentage progress bar for ingestion
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(u64::from(COMPLETE));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Ingest `path` into a fresh workspace, driving a progress bar from the event channel
pub async fn ingest_with_progress(
    path: &Path,
    config: Config,
    cancel: CancellationToken,
    show_progress: bool,
) -> Result<Workspace> {
    let pb = if show_progress {
        create_progress_bar("Starting...")
    } else {
        ProgressBar::hidden()
    };

    let started = Instant::now();
    let mut workspace = Workspace::new(config);
    let result = workspace
        .ingest_file(path, cancel, |event| {
            pb.set_position(u64::from(event.percent));
            pb.set_message(event.message.clone());
        })
        .await;

    match result {
        Ok(dataset) => {
            pb.finish_and_clear();
            info!(
                "Ingested {} in {:.2}s: {} parameters, {} rows ({} sampled)",
                path.display(),
                started.elapsed().as_secs_f64(),
                dataset.headers.len(),
                dataset.total_row_count,
                dataset.sampled_row_count()
            );
        }
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    }

    Ok(workspace)
}

/// Write `content` to a file, or stdout when no path is given
///
/// Returns the number of bytes written to the file.
pub fn write_output(path: Option<&Path>, content: &str) -> Result<Option<u64>> {
    match path {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| {
                Error::io(format!("Failed to write output to {}", path.display()), e)
            })?;
            info!("Output written to: {}", path.display());
            Ok(Some(content.len() as u64))
        }
        None => {
            println!("{}", content.trim_end());
            Ok(None)
        }
    }
}

/// Fill the statistics common to every command from a loaded workspace
pub fn workspace_stats(workspace: &Workspace, parameters: usize, started: Instant) -> RunStats {
    let (rows_ingested, rows_skipped) = workspace
        .stats()
        .map(|stats| (stats.rows_accepted, stats.rows_skipped))
        .unwrap_or_default();

    RunStats {
        rows_ingested,
        rows_skipped,
        rows_sampled: workspace
            .dataset()
            .map(|dataset| dataset.sampled_row_count())
            .unwrap_or_default(),
        parameters,
        output_size: None,
        processing_time: started.elapsed(),
    }
}
