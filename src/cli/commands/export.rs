//! Export command implementation
//!
//! Builds filtered, gap-filled series for the selected parameters and writes
//! them as CSV (header row, optional units row, one row per sample) or JSON.

use super::shared::{
    RunStats, ingest_with_progress, load_configuration, setup_logging, workspace_stats,
    write_output,
};
use crate::app::models::ParameterSeries;
use crate::cli::args::{ExportArgs, ExportFormat};
use crate::{Error, Result};
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// JSON document written by `export --format json`
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument<'a> {
    pub source: String,
    pub generated_at: String,
    pub total_row_count: usize,
    pub sampled_row_count: usize,
    pub series: &'a [ParameterSeries],
}

fn write_record<'a, W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    fields: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    writer
        .write_record(fields)
        .map_err(|e| Error::csv_writing("Failed to write CSV record", e))
}

/// Render series side by side as CSV
///
/// The units row is written only when at least one series has a unit.
pub fn render_csv(series: &[ParameterSeries]) -> Result<String> {
    if series.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    write_record(&mut writer, series.iter().map(|s| s.name.as_str()))?;

    if series.iter().any(|s| !s.unit.is_empty()) {
        write_record(&mut writer, series.iter().map(|s| s.unit.as_str()))?;
    }

    let rows = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    for index in 0..rows {
        let values: Vec<String> = series.iter().map(|s| s.values.display_at(index)).collect();
        write_record(&mut writer, values.iter().map(String::as_str))?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        Error::io(
            "Failed to flush CSV output",
            std::io::Error::new(e.error().kind(), e.to_string()),
        )
    })?;
    String::from_utf8(bytes).map_err(|e| {
        Error::io(
            "CSV output is not valid UTF-8",
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })
}

/// Export command runner
pub async fn run_export(args: ExportArgs, cancel: CancellationToken) -> Result<RunStats> {
    let started = Instant::now();

    setup_logging(&args.common)?;
    info!("Starting export of {}", args.input.display());
    debug!("Export arguments: {:?}", args);

    args.validate()?;
    let config = load_configuration(&args.common)?;

    let mut workspace =
        ingest_with_progress(&args.input, config, cancel, args.common.show_progress()).await?;

    let names = match args.get_parameters() {
        Some(names) => names,
        None => workspace
            .dataset()
            .map(|dataset| dataset.headers.clone())
            .unwrap_or_default(),
    };

    let mut series = Vec::with_capacity(names.len());
    for name in &names {
        let filter = args.apply_filter_overrides(workspace.config().filters.for_parameter(name));
        let built = workspace.series_with(name, &filter)?;
        if built.is_sparse && built.filled_count == 0 {
            warn!(
                "{} is sparse ({:.1}% missing) and was not gap-filled",
                name,
                built.missing_fraction * 100.0
            );
        }
        series.push(built);
    }

    let dataset = workspace
        .dataset()
        .ok_or_else(|| Error::processing_interrupted("No dataset was loaded"))?;

    let content = match args.export_format {
        ExportFormat::Csv => render_csv(&series)?,
        ExportFormat::Json => {
            let document = ExportDocument {
                source: args.input.display().to_string(),
                generated_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                total_row_count: dataset.total_row_count,
                sampled_row_count: dataset.sampled_row_count(),
                series: &series,
            };
            serde_json::to_string_pretty(&document)
                .map_err(|e| Error::serialization("Failed to serialize exported series", e))?
        }
    };

    let mut stats = workspace_stats(&workspace, series.len(), started);
    stats.output_size = write_output(args.output_file.as_deref(), &content)?;

    info!(
        "Exported {} series in {:.2}s",
        series.len(),
        stats.processing_time.as_secs_f64()
    );
    Ok(stats)
}
