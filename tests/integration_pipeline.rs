//! End-to-end tests for the ingestion-to-series pipeline
//!
//! These tests write synthetic flight recordings to temporary files and drive
//! them through ingestion, sampling, analysis, series building and the CLI
//! commands.

use clap::Parser;
use flight_processor::app::models::{FilterConfig, InterpolationMethod, SeriesValues};
use flight_processor::app::services::flight_csv_parser::StreamIngestor;
use flight_processor::app::services::workspace::Workspace;
use flight_processor::cli::args::Args;
use flight_processor::cli::commands;
use flight_processor::{Config, Error};
use std::fmt::Write as _;
use std::io::Write as _;
use tempfile::{NamedTempFile, TempDir};
use tokio_util::sync::CancellationToken;

/// Synthetic recording with a reserved time column, a climbing altitude with
/// periodic dropouts, an airspeed column and a gear state column
fn synthetic_recording(rows: usize) -> String {
    let mut content = String::from("Time,ALT,IAS,GEAR\ns,ft,kt,\n");
    for i in 0..rows {
        let alt = if i % 4 == 1 {
            String::new()
        } else {
            (i * 10).to_string()
        };
        let gear = if i < rows / 2 { "DOWN" } else { "UP" };
        writeln!(content, "{},{},{},{}", i, alt, 100 + i % 50, gear).unwrap();
    }
    content
}

fn write_recording(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Test the full pipeline on a recording larger than the sampling target
///
/// Purpose: Validate that ingestion, sampling, analysis and gap filling compose
/// Benefit: Catches regressions where one stage breaks another's assumptions
#[tokio::test]
async fn test_large_recording_pipeline() {
    let file = write_recording(&synthetic_recording(50_000));
    let config = Config::default().with_target_rows(1_000).with_batch_size(2_048);

    let mut workspace = Workspace::new(config);
    let mut percents = Vec::new();
    let dataset = workspace
        .ingest_file(file.path(), CancellationToken::new(), |event| {
            percents.push(event.percent)
        })
        .await
        .unwrap();

    assert_eq!(dataset.headers, vec!["ALT", "IAS", "GEAR"]);
    assert_eq!(dataset.units, vec!["ft", "kt", ""]);
    assert_eq!(dataset.total_row_count, 50_000);
    assert_eq!(dataset.sampled_row_count(), 1_001);
    assert_eq!(dataset.rows[0].get("Time"), Some("0"));
    assert_eq!(
        dataset.rows.last().and_then(|row| row.get("Time")),
        Some("49999")
    );

    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(percents.last(), Some(&100));

    let metadata = workspace.analyze_all().await.unwrap();
    assert!(metadata["ALT"].is_numeric);
    assert!(metadata["IAS"].is_numeric);
    assert!(!metadata["GEAR"].is_numeric);
    assert_eq!(metadata["GEAR"].states, vec!["DOWN", "UP"]);

    let alt = workspace
        .series_with(
            "ALT",
            &FilterConfig {
                interpolation_method: InterpolationMethod::Linear,
                force_interpolation: true,
                ..FilterConfig::default()
            },
        )
        .unwrap();
    assert_eq!(alt.values.missing_count(), 0);
    assert_eq!(alt.unit, "ft");
}

/// Test that malformed rows are skipped without failing the ingestion
///
/// Purpose: Validate row-level tolerance on a realistic on-disk file
/// Benefit: A single corrupt line in a multi-gigabyte recording must not abort it
#[test]
fn test_corrupt_rows_are_skipped() {
    let mut content = synthetic_recording(1_000);
    content.push_str("truncated,line\n");
    content.push_str("1,2,3,4,5\n");
    let file = write_recording(&content);

    let result = StreamIngestor::default()
        .ingest_path(
            file.path(),
            &mut flight_processor::app::services::flight_csv_parser::ProgressSink::disabled(),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(result.row_count(), 1_000);
    assert_eq!(result.stats.rows_skipped, 2);
}

/// Test that cancelling an ingestion leaves no partial dataset behind
#[tokio::test]
async fn test_cancelled_ingestion_keeps_workspace_empty() {
    let file = write_recording(&synthetic_recording(10_000));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut workspace = Workspace::new(Config::default().with_batch_size(100));
    let result = workspace.ingest_file(file.path(), cancel, |_| {}).await;

    assert!(matches!(result, Err(Error::ProcessingInterrupted { .. })));
    assert!(workspace.dataset().is_none());
    assert_eq!(workspace.version(), 0);
}

/// Test the summary command end to end with JSON output
#[tokio::test]
async fn test_summary_command_json() {
    let file = write_recording(&synthetic_recording(200));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("summary.json");

    let args = Args::parse_from([
        "flight-processor",
        "summary",
        file.path().to_str().unwrap(),
        "--format",
        "json",
        "--quiet",
        "--output",
        output.to_str().unwrap(),
    ]);
    let stats = commands::run(args, CancellationToken::new()).await.unwrap();
    assert_eq!(stats.rows_ingested, 200);
    assert_eq!(stats.parameters, 3);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["total_row_count"], 200);
    assert_eq!(report["headers"], serde_json::json!(["ALT", "IAS", "GEAR"]));
    assert_eq!(report["parameters"][0]["name"], "ALT");
    assert_eq!(report["parameters"][0]["is_sparse"], true);
}

/// Test that exported CSV can be ingested again with the same parameters
///
/// Purpose: Validate the export format against the ingestor's own expectations
/// Benefit: Exported series stay usable as input for later processing
#[tokio::test]
async fn test_export_command_csv_reingests() {
    let file = write_recording(&synthetic_recording(300));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("series.csv");

    let args = Args::parse_from([
        "flight-processor",
        "export",
        file.path().to_str().unwrap(),
        "--parameters",
        "ALT,GEAR",
        "--interpolation",
        "linear",
        "--quiet",
        "--output",
        output.to_str().unwrap(),
    ]);
    let stats = commands::run(args, CancellationToken::new()).await.unwrap();
    assert_eq!(stats.parameters, 2);

    let exported = std::fs::read_to_string(&output).unwrap();
    let result = StreamIngestor::default().ingest_str(&exported).unwrap();
    assert_eq!(result.dataset.headers, vec!["ALT", "GEAR"]);
    assert_eq!(result.dataset.units, vec!["ft", ""]);
    assert_eq!(result.row_count(), 300);

    // ALT was 25% missing, so it is sparse and was linearly filled
    let alt = result.dataset.numeric_column("ALT").unwrap();
    assert!(alt.iter().all(Option::is_some));
    assert_eq!(alt[1], Some(10.0));
}

/// Test that an unknown parameter fails the export
#[tokio::test]
async fn test_export_unknown_parameter() {
    let file = write_recording(&synthetic_recording(20));

    let args = Args::parse_from([
        "flight-processor",
        "export",
        file.path().to_str().unwrap(),
        "--parameters",
        "VSPD",
        "--quiet",
    ]);
    let result = commands::run(args, CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::UnknownParameter { .. })));
}

/// Test that a file with only a header line is rejected
#[tokio::test]
async fn test_header_only_file_is_malformed() {
    let file = write_recording("Time,ALT,IAS\n\n\n");

    let mut workspace = Workspace::default();
    let error = workspace
        .ingest_file(file.path(), CancellationToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, Error::MalformedFile { line_count: 1, .. }));
    assert!(error.to_string().contains("1 non-blank line"));
}

/// Test categorical series through the workspace with default filters
#[test]
fn test_categorical_series_from_memory() {
    let result = StreamIngestor::default()
        .ingest_str("MODE,ALT\n,ft\nCRZ,100\n\n,110\nCLB,120\n")
        .unwrap();
    assert_eq!(result.row_count(), 3);

    let mut workspace = Workspace::default();
    workspace.load(result);
    let series = workspace.series("MODE").unwrap();

    // One of three states missing is sparse, so the default forward fill applies
    assert!(series.is_sparse);
    assert_eq!(
        series.values,
        SeriesValues::Categorical(vec![
            Some("CRZ".to_string()),
            Some("CRZ".to_string()),
            Some("CLB".to_string())
        ])
    );
}
