//! Tests for the flight CSV parser module
//!
//! Unit tests for the leaf components live next to their code; these cover
//! the ingestor end to end.

pub mod ingestor_tests;

use crate::config::IngestConfig;
use std::fmt::Write;

/// Build a recording with `rows` data lines and optional units row
pub fn build_recording(rows: usize, with_units: bool) -> String {
    let mut content = String::from("Time,ALT,IAS,GEAR\n");
    if with_units {
        content.push_str("s,ft,kt,\n");
    }
    for i in 0..rows {
        let gear = if i % 2 == 0 { "DOWN" } else { "UP" };
        writeln!(content, "{},{},{},{}", i, 1000 + i * 10, 120 + i % 7, gear).unwrap();
    }
    content
}

/// Ingest config with a small batch size so batching is exercised
pub fn small_batch_config(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        ..IngestConfig::default()
    }
}
