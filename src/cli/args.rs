//! Command-line argument definitions for the flight processor
//!
//! This module defines the CLI interface using the clap derive API. Shared
//! ingestion and logging flags live in [`CommonArgs`] and are flattened into
//! every subcommand.

use crate::app::models::{FilterConfig, InterpolationMethod};
use crate::config::UnitsRowMode;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the flight data processor
///
/// Turns raw flight-parameter recordings into a bounded, analysis-ready
/// dataset with per-parameter classification and gap-filled series.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flight-processor",
    version,
    about = "Summarize and export flight-parameter CSV recordings",
    long_about = "Streams flight-parameter recordings (a header row, an optional units row and \
                  any number of data rows) into a bounded sample, classifies every parameter as \
                  numeric or categorical, and exports filtered, gap-filled series as CSV or JSON."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print headers, row counts and per-parameter metadata for a recording
    Summary(SummaryArgs),
    /// Write filtered and gap-filled series for selected parameters
    Export(ExportArgs),
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to a JSON configuration file
    ///
    /// If not specified, looks for config.json in the platform configuration
    /// directory under flight-processor/.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Upper bound on rows kept after sampling
    #[arg(
        short = 't',
        long = "target-rows",
        value_name = "COUNT",
        help = "Maximum rows kept after sampling"
    )]
    pub target_rows: Option<usize>,

    /// Data lines per ingestion batch
    #[arg(
        short = 'b',
        long = "batch-size",
        value_name = "COUNT",
        help = "Data lines processed per batch"
    )]
    pub batch_size: Option<usize>,

    /// Override units row detection for the second line
    #[arg(
        long = "units-row",
        value_name = "MODE",
        help = "Treat the second line as units: auto, present or absent"
    )]
    pub units_row: Option<UnitsRowMode>,

    /// Fail when every data line is skipped
    #[arg(long = "fail-on-empty", help = "Fail when no data line is usable")]
    pub fail_on_empty: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings and hides the progress bar.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl CommonArgs {
    /// Get the logging level based on verbosity and quiet flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }

        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Check if the progress bar should be shown
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Arguments for the summary command
#[derive(Debug, Clone, Parser)]
pub struct SummaryArgs {
    /// Flight recording to read
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Output format for the report
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for the report"
    )]
    pub output_format: OutputFormat,

    /// Output file for the report
    ///
    /// If not specified, the report goes to stdout
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Output file for the report"
    )]
    pub output_file: Option<PathBuf>,
}

/// Arguments for the export command
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    /// Flight recording to read
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Parameters to export (comma-separated list)
    ///
    /// If not specified, every parameter of the recording is exported.
    #[arg(
        short = 'p',
        long = "parameters",
        value_name = "LIST",
        help = "Comma-separated list of parameters to export"
    )]
    pub parameters: Option<ParameterList>,

    /// Gap-filling method, overriding the configured one
    #[arg(
        short = 'i',
        long = "interpolation",
        value_name = "METHOD",
        help = "Gap filling: forward, linear, backward or none"
    )]
    pub interpolation: Option<InterpolationMethod>,

    /// Fill gaps even in parameters that are not sparse
    #[arg(
        long = "force-interpolation",
        help = "Fill gaps even when a parameter is not sparse"
    )]
    pub force_interpolation: bool,

    /// Lower bound of the custom range; values below become missing
    #[arg(long = "min", value_name = "VALUE", allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Upper bound of the custom range; values above become missing
    #[arg(long = "max", value_name = "VALUE", allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Outlier threshold as a percentage of the parameter range
    #[arg(
        long = "outlier-threshold",
        value_name = "PERCENT",
        allow_negative_numbers = true,
        help = "Null values further than PERCENT of the range from its midpoint"
    )]
    pub outlier_threshold: Option<f64>,

    /// Output format for the series
    #[arg(
        long = "format",
        value_enum,
        default_value = "csv",
        help = "Output format for exported series"
    )]
    pub export_format: ExportFormat,

    /// Output file for the series
    ///
    /// If not specified, the series are written to stdout
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Output file for exported series"
    )]
    pub output_file: Option<PathBuf>,
}

impl ExportArgs {
    /// Validate the export arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(Error::configuration(format!(
                    "--min ({}) must not exceed --max ({})",
                    min, max
                )));
            }
        }

        if let Some(threshold) = self.outlier_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(Error::configuration(format!(
                    "Outlier threshold must be a non-negative percentage (got {})",
                    threshold
                )));
            }
        }

        Ok(())
    }

    /// Layer the command-line filter flags over a configured filter
    pub fn apply_filter_overrides(&self, base: &FilterConfig) -> FilterConfig {
        let mut filter = base.clone();

        if let Some(method) = self.interpolation {
            filter.interpolation_method = method;
        }
        if self.force_interpolation {
            filter.force_interpolation = true;
        }

        if self.min.is_some() || self.max.is_some() {
            filter.enable_filtering = true;
            filter.use_custom_range = true;
            if let Some(min) = self.min {
                filter.custom_range.min = min;
            }
            if let Some(max) = self.max {
                filter.custom_range.max = max;
            }
        }

        if let Some(threshold) = self.outlier_threshold {
            filter.enable_filtering = true;
            filter.remove_outliers = true;
            filter.outlier_threshold = threshold;
        }

        filter
    }

    /// Selected parameter names, or `None` for all
    pub fn get_parameters(&self) -> Option<Vec<String>> {
        self.parameters.as_ref().map(|list| list.names.clone())
    }
}

/// Output format options for the summary report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// Output format options for exported series
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Header row, units row and one row per sample
    Csv,
    /// Series objects with metadata
    Json,
}

/// Wrapper for parsing comma-separated parameter lists
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterList {
    pub names: Vec<String>,
}

impl FromStr for ParameterList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }

        if names.is_empty() {
            return Err(Error::configuration("Parameter list cannot be empty"));
        }

        Ok(ParameterList { names })
    }
}
