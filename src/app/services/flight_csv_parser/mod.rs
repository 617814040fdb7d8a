//! Streaming parser for flight-parameter CSV recordings
//!
//! This module turns the raw text of a recording into a [`Dataset`]: a header
//! row, an optional units row and any number of data rows. It is built to
//! handle inputs from kilobytes to multiple gigabytes without holding the raw
//! text in memory.
//!
//! ## Architecture
//!
//! The parser is organized into logical components:
//! - [`line_parser`] - Splits one line into trimmed fields with quote handling
//! - [`header_classifier`] - Decides whether the second line is a units row
//! - [`ingestor`] - Batched line processing, row assembly and task spawning
//! - [`progress`] - Ordered, non-decreasing progress event channel
//! - [`stats`] - Ingestion statistics and result structures
//!
//! ## Error policy
//!
//! Quote mismatches and empty fields never raise. A data line whose field
//! count differs from the header is skipped and counted. Only structural
//! failures (fewer than two non-blank lines, an unreadable source) abort.
//!
//! ## Usage
//!
//! ```rust
//! use flight_processor::app::services::flight_csv_parser::StreamIngestor;
//! use flight_processor::config::IngestConfig;
//!
//! # fn example() -> flight_processor::Result<()> {
//! let ingestor = StreamIngestor::new(IngestConfig::default());
//! let result = ingestor.ingest_str("ALT,IAS\nft,kt\n1000,120\n1010,121\n")?;
//!
//! assert_eq!(result.dataset.headers, vec!["ALT", "IAS"]);
//! assert_eq!(result.dataset.units, vec!["ft", "kt"]);
//! assert_eq!(result.stats.rows_accepted, 2);
//! # Ok(())
//! # }
//! ```
//!
//! [`Dataset`]: crate::app::models::Dataset

pub mod header_classifier;
pub mod ingestor;
pub mod line_parser;
pub mod progress;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use header_classifier::{SecondLine, classify_second_line, is_unit_like};
pub use ingestor::{IngestionHandle, SourceInfo, StreamIngestor, spawn_ingestion};
pub use line_parser::parse_line;
pub use progress::{ProgressEvent, ProgressSink};
pub use stats::{IngestResult, IngestStats};
