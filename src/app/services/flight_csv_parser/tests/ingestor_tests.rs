//! Tests for streaming ingestion

use super::{build_recording, small_batch_config};
use crate::Error;
use crate::app::services::flight_csv_parser::{ProgressEvent, ProgressSink, StreamIngestor};
use crate::config::{IngestConfig, UnitsRowMode};
use std::fmt::Write as _;
use std::io::Write as _;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

fn ingestor() -> StreamIngestor {
    StreamIngestor::new(IngestConfig::default())
}

fn drain(receiver: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

#[test]
fn test_headers_units_and_rows() {
    let result = ingestor().ingest_str(&build_recording(3, true)).unwrap();
    let dataset = &result.dataset;

    // Time is reserved, so it is not a parameter but stays in the rows
    assert_eq!(dataset.headers, vec!["ALT", "IAS", "GEAR"]);
    assert_eq!(dataset.units, vec!["ft", "kt", ""]);
    assert_eq!(dataset.rows.len(), 3);
    assert_eq!(dataset.total_row_count, 3);
    assert_eq!(dataset.rows[0].get("Time"), Some("0"));
    assert_eq!(dataset.rows[2].get("ALT"), Some("1020"));
    assert!(result.stats.units_detected);
}

#[test]
fn test_second_line_used_as_data_without_units() {
    let result = ingestor().ingest_str(&build_recording(4, false)).unwrap();

    assert_eq!(result.dataset.rows.len(), 4);
    assert_eq!(result.dataset.units, vec!["", "", ""]);
    assert_eq!(result.dataset.rows[0].get("IAS"), Some("120"));
    assert!(!result.stats.units_detected);
}

#[test]
fn test_units_override() {
    let content = "ALT,IAS\n0,0\n100,120\n";

    let auto = ingestor().ingest_str(content).unwrap();
    assert_eq!(auto.dataset.rows.len(), 2);

    let forced = StreamIngestor::new(IngestConfig {
        units_row: UnitsRowMode::Present,
        ..IngestConfig::default()
    })
    .ingest_str(content)
    .unwrap();
    assert_eq!(forced.dataset.rows.len(), 1);
    assert_eq!(forced.dataset.units, vec!["0", "0"]);

    let textual = "MODE,STATE\nON,ARMED\nOFF,SAFE\n";
    let absent = StreamIngestor::new(IngestConfig {
        units_row: UnitsRowMode::Absent,
        ..IngestConfig::default()
    })
    .ingest_str(textual)
    .unwrap();
    assert_eq!(absent.dataset.rows.len(), 2);
    assert_eq!(absent.dataset.rows[0].get("MODE"), Some("ON"));
}

#[test]
fn test_blank_lines_are_ignored() {
    let content = "\n  \nALT,IAS\n\nft,kt\n1,2\n   \n3,4\n\n";
    let result = ingestor().ingest_str(content).unwrap();

    assert_eq!(result.dataset.headers, vec!["ALT", "IAS"]);
    assert_eq!(result.dataset.units, vec!["ft", "kt"]);
    assert_eq!(result.dataset.rows.len(), 2);
    assert_eq!(result.stats.blank_lines, 5);
    assert_eq!(result.stats.rows_skipped, 0);
}

#[test]
fn test_single_line_is_malformed() {
    let error = ingestor().ingest_str("ALT,IAS\n\n   \n").unwrap_err();
    match error {
        Error::MalformedFile { line_count, .. } => assert_eq!(line_count, 1),
        other => panic!("Expected MalformedFile, got {:?}", other),
    }
}

#[test]
fn test_empty_input_is_malformed() {
    let error = ingestor().ingest_str("").unwrap_err();
    assert!(matches!(error, Error::MalformedFile { line_count: 0, .. }));
}

#[test]
fn test_skip_tolerance() {
    let mut content = String::from("ALT,IAS,FLAPS\n");
    for i in 0..1000 {
        if i == 10 || i == 500 || i == 999 {
            writeln!(content, "{},{}", i, i).unwrap();
        } else {
            writeln!(content, "{},{},{}", i, i * 2, i % 3).unwrap();
        }
    }

    let result = ingestor().ingest_str(&content).unwrap();
    assert_eq!(result.dataset.rows.len(), 997);
    assert_eq!(result.stats.rows_skipped, 3);
    // Header is line 1, so data row i sits on line i + 2
    assert_eq!(result.stats.skipped_lines, vec![12, 502, 1001]);
}

#[test]
fn test_all_rows_skipped() {
    let content = "A,B,C\n1,2\n3,4\n";

    let lenient = ingestor().ingest_str(content).unwrap();
    assert!(lenient.dataset.rows.is_empty());
    assert_eq!(lenient.stats.rows_skipped, 2);

    let strict = StreamIngestor::new(IngestConfig {
        fail_on_empty: true,
        ..IngestConfig::default()
    });
    assert!(matches!(
        strict.ingest_str(content),
        Err(Error::NoUsableRows { skipped: 2 })
    ));
}

#[test]
fn test_quoted_fields_in_data_rows() {
    let content = "NAME,ALT\n\"Smith, J\",100\n\"say \"\"hi\"\"\",200\n";
    let result = ingestor().ingest_str(content).unwrap();

    assert_eq!(result.dataset.rows[0].get("NAME"), Some("Smith, J"));
    assert_eq!(result.dataset.rows[1].get("NAME"), Some("say \"hi\""));
}

#[test]
fn test_crlf_line_endings() {
    let content = "ALT,IAS\r\nft,kt\r\n1,2\r\n3,4\r\n";
    let result = ingestor().ingest_str(content).unwrap();

    assert_eq!(result.dataset.units, vec!["ft", "kt"]);
    assert_eq!(result.dataset.rows[1].get("IAS"), Some("4"));
}

#[test]
fn test_unlabelled_index_column_is_not_a_parameter() {
    let content = ",ALT,IAS\n,ft,kt\n0,1,2\n1,3,4\n";
    let result = ingestor().ingest_str(content).unwrap();

    assert_eq!(result.dataset.headers, vec!["ALT", "IAS"]);
    assert_eq!(result.dataset.units, vec!["ft", "kt"]);
    assert_eq!(result.dataset.rows[1].get(""), Some("1"));
}

#[test]
fn test_batches_are_counted() {
    let result = StreamIngestor::new(small_batch_config(5))
        .ingest_str(&build_recording(12, true))
        .unwrap();

    assert_eq!(result.stats.batches, 3);
    assert_eq!(result.stats.rows_accepted, 12);
}

#[test]
fn test_original_byte_length() {
    let content = build_recording(20, true);
    let result = ingestor().ingest_str(&content).unwrap();
    assert_eq!(result.dataset.original_byte_length, content.len() as u64);
}

#[test]
fn test_progress_phases() {
    let (mut sink, mut receiver) = ProgressSink::channel();
    StreamIngestor::new(small_batch_config(10))
        .ingest_str_with(&build_recording(100, true), &mut sink, &CancellationToken::new())
        .unwrap();

    let events = drain(&mut receiver);
    let percents: Vec<u8> = events.iter().map(|event| event.percent).collect();

    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(percents[0], 0);
    assert!(percents.contains(&30));
    assert!(percents.contains(&60));
    assert!(events.iter().any(|event| event.message == "Reading file..."));
    assert!(events.iter().any(|event| event.message == "Processing records..."));

    let last = events.last().unwrap();
    assert_eq!(last.percent, 100);
    assert_eq!(last.message, "Complete!");
}

#[test]
fn test_cancelled_ingestion_returns_no_result() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = StreamIngestor::new(small_batch_config(5)).ingest_str_with(
        &build_recording(50, true),
        &mut ProgressSink::disabled(),
        &cancel,
    );
    assert!(matches!(result, Err(Error::ProcessingInterrupted { .. })));
}

#[test]
fn test_ingest_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(build_recording(25, true).as_bytes()).unwrap();

    let result = ingestor()
        .ingest_path(file.path(), &mut ProgressSink::disabled(), &CancellationToken::new())
        .unwrap();
    assert_eq!(result.dataset.rows.len(), 25);
}

#[test]
fn test_missing_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let result = ingestor().ingest_path(
        &dir.path().join("missing.csv"),
        &mut ProgressSink::disabled(),
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(Error::UnreadableSource { .. })));
}

#[test]
fn test_invalid_utf8_is_unreadable() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"ALT,IAS\n1,2\n\xff\xfe,3\n").unwrap();

    let result = ingestor().ingest_path(
        file.path(),
        &mut ProgressSink::disabled(),
        &CancellationToken::new(),
    );
    assert!(matches!(result, Err(Error::UnreadableSource { .. })));
}
