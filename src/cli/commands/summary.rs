//! Summary command implementation
//!
//! Ingests one recording and reports its headers, row counts and the
//! metadata and sparsity of every parameter.

use super::shared::{
    RunStats, ingest_with_progress, load_configuration, setup_logging, workspace_stats,
    write_output,
};
use crate::app::models::{Dataset, ParameterMetadata};
use crate::app::services::flight_csv_parser::IngestStats;
use crate::app::services::series_builder::{SparsityDetector, missing_fraction};
use crate::cli::args::{OutputFormat, SummaryArgs};
use crate::{Error, Result};
use colored::*;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// States listed per categorical parameter in the human report
const MAX_STATES_SHOWN: usize = 8;

/// Report for one parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSummary {
    pub name: String,
    pub unit: String,
    #[serde(flatten)]
    pub metadata: ParameterMetadata,
    pub missing_fraction: f64,
    pub is_sparse: bool,
}

/// Report for one recording
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub source: String,
    pub generated_at: String,
    pub original_byte_length: u64,
    pub total_row_count: usize,
    pub sampled_row_count: usize,
    pub rows_skipped: usize,
    pub units_detected: bool,
    pub headers: Vec<String>,
    pub units: Vec<String>,
    pub parameters: Vec<ParameterSummary>,
}

impl SummaryReport {
    /// Assemble a report from a sampled dataset and its analysis
    pub fn build(
        source: &str,
        dataset: &Dataset,
        stats: Option<&IngestStats>,
        metadata: &HashMap<String, ParameterMetadata>,
        sparsity: SparsityDetector,
    ) -> Self {
        let parameters = dataset
            .headers
            .iter()
            .filter_map(|name| {
                let metadata = metadata.get(name)?;
                let column = dataset.column(name)?;
                let (missing, is_sparse) = if metadata.is_numeric {
                    let values = column.numeric();
                    (missing_fraction(&values), sparsity.is_sparse(&values))
                } else {
                    let values = column.categorical();
                    (missing_fraction(&values), sparsity.is_sparse(&values))
                };

                Some(ParameterSummary {
                    name: name.clone(),
                    unit: dataset.unit(name).to_string(),
                    metadata: metadata.clone(),
                    missing_fraction: missing,
                    is_sparse,
                })
            })
            .collect();

        Self {
            source: source.to_string(),
            generated_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            original_byte_length: dataset.original_byte_length,
            total_row_count: dataset.total_row_count,
            sampled_row_count: dataset.sampled_row_count(),
            rows_skipped: stats.map(|stats| stats.rows_skipped).unwrap_or_default(),
            units_detected: stats.is_some_and(|stats| stats.units_detected),
            headers: dataset.headers.clone(),
            units: dataset.units.clone(),
            parameters,
        }
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::serialization("Failed to serialize summary report", e))
    }

    /// Render as a colored human-readable table
    pub fn to_human(&self) -> String {
        let mut output = format!(
            "{}\n\
             {} {}\n\
             {} {}\n\
             {} {} total, {} sampled, {} skipped\n\
             {} {}\n\n",
            "Flight Recording Summary".bright_green().bold(),
            "Source:".bright_cyan(),
            self.source,
            "Size:".bright_cyan(),
            RunStats::format_size(self.original_byte_length),
            "Rows:".bright_cyan(),
            self.total_row_count.to_string().bright_white().bold(),
            self.sampled_row_count,
            self.rows_skipped,
            "Units row:".bright_cyan(),
            if self.units_detected { "detected" } else { "absent" }
        );

        output.push_str(&format!(
            "{:<24} | {:<8} | {:<11} | {:>12} | {:>12} | {:>8} | States\n",
            "Parameter", "Unit", "Type", "Min", "Max", "Missing"
        ));
        output.push_str(&format!("{}\n", "-".repeat(100)));

        for parameter in &self.parameters {
            let kind = if parameter.metadata.is_numeric {
                "numeric".normal()
            } else {
                "categorical".yellow()
            };
            let missing = format!("{:.1}%", parameter.missing_fraction * 100.0);
            let missing = if parameter.is_sparse {
                missing.bright_red()
            } else {
                missing.normal()
            };

            output.push_str(&format!(
                "{:<24} | {:<8} | {:<11} | {:>12} | {:>12} | {:>8} | {}\n",
                truncate(&parameter.name, 24),
                truncate(&parameter.unit, 8),
                kind,
                format_bound(parameter.metadata.min),
                format_bound(parameter.metadata.max),
                missing,
                format_states(&parameter.metadata)
            ));
        }

        let sparse = self.parameters.iter().filter(|p| p.is_sparse).count();
        if sparse > 0 {
            output.push_str(&format!(
                "\n{} {} sparse parameter(s) will be gap-filled on export\n",
                "Note:".bright_yellow(),
                sparse
            ));
        }

        output
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        kept + "..."
    } else {
        text.to_string()
    }
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e12 {
        format!("{}", value)
    } else {
        format!("{:.4}", value)
    }
}

fn format_states(metadata: &ParameterMetadata) -> String {
    if metadata.is_numeric {
        return format!("{} distinct", metadata.states.len());
    }

    let shown: Vec<&str> = metadata
        .states
        .iter()
        .take(MAX_STATES_SHOWN)
        .map(String::as_str)
        .collect();
    let mut states = shown.join(", ");
    if metadata.states.len() > MAX_STATES_SHOWN {
        states.push_str(&format!(", ... ({} total)", metadata.states.len()));
    }
    states
}

/// Summary command runner
pub async fn run_summary(args: SummaryArgs, cancel: CancellationToken) -> Result<RunStats> {
    let started = Instant::now();

    setup_logging(&args.common)?;
    info!("Starting summary of {}", args.input.display());
    debug!("Summary arguments: {:?}", args);

    let config = load_configuration(&args.common)?;
    let sparsity = SparsityDetector::new(config.analysis.sparsity_threshold);

    let mut workspace =
        ingest_with_progress(&args.input, config, cancel, args.common.show_progress()).await?;
    let metadata = workspace.analyze_all().await?.clone();

    let dataset = workspace
        .dataset()
        .ok_or_else(|| Error::processing_interrupted("No dataset was loaded"))?;
    let report = SummaryReport::build(
        &args.input.display().to_string(),
        dataset,
        workspace.stats(),
        &metadata,
        sparsity,
    );

    let content = match args.output_format {
        OutputFormat::Human => report.to_human(),
        OutputFormat::Json => report.to_json()?,
    };

    let mut stats = workspace_stats(&workspace, report.parameters.len(), started);
    stats.output_size = write_output(args.output_file.as_deref(), &content)?;

    info!(
        "Summary completed in {:.2}s",
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}
