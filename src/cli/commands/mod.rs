//! Command implementations for the flight processor CLI
//!
//! Each subcommand lives in its own module; shared logging, configuration and
//! ingestion helpers are in [`shared`].

pub mod export;
pub mod shared;
pub mod summary;

pub use shared::RunStats;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler:
/// - `summary`: headers, row counts and per-parameter metadata
/// - `export`: filtered and gap-filled series as CSV or JSON
pub async fn run(args: Args, cancel: CancellationToken) -> Result<RunStats> {
    match args.command {
        Some(Commands::Summary(summary_args)) => summary::run_summary(summary_args, cancel).await,
        Some(Commands::Export(export_args)) => export::run_export(export_args, cancel).await,
        None => Err(Error::configuration("No command specified")),
    }
}
