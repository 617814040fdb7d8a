//! Flight Processor Library
//!
//! A Rust library for turning raw flight-parameter recordings (a header row, an
//! optional units row and up to millions of data rows of comma-separated text)
//! into a bounded, analysis-ready dataset.
//!
//! This library provides tools for:
//! - Streaming line/field parsing with quote handling and malformed-row tolerance
//! - Detecting whether the second line of a recording is a units row
//! - Shape-preserving downsampling of arbitrarily large row sets
//! - Per-parameter numeric/categorical classification with min/max and states
//! - Sparsity detection, range/outlier filtering and four gap-filling strategies
//! - Progress reporting over an ordered event channel with cancellation support

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod flight_csv_parser;
        pub mod series_builder;
        pub mod workspace;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    Column, Dataset, FilterConfig, InterpolationMethod, ParameterMetadata, ParameterSeries, Row,
};
pub use config::Config;

/// Result type alias for the flight processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for flight data ingestion and analysis
///
/// Only structural failures live here. A data line with the wrong number of
/// fields is skipped and counted in the ingestion statistics instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input does not have the minimum header + data structure
    #[error("Malformed file: {message} (found {line_count} non-blank line(s))")]
    MalformedFile { line_count: usize, message: String },

    /// The underlying source could not be opened or read
    #[error("Unreadable source '{path}': {source}")]
    UnreadableSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Every data line was rejected and the caller asked for that to be fatal
    #[error("No usable rows: all {skipped} data line(s) had a mismatched field count")]
    NoUsableRows { skipped: usize },

    /// A series was requested for a parameter that is not in the dataset
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization or deserialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing CSV output failed
    #[error("CSV writing error: {message}")]
    CsvWriting {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a malformed file error
    pub fn malformed_file(line_count: usize, message: impl Into<String>) -> Self {
        Self::MalformedFile {
            line_count,
            message: message.into(),
        }
    }

    /// Create an unreadable source error
    pub fn unreadable_source(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::UnreadableSource {
            path: path.into(),
            source,
        }
    }

    /// Create a no usable rows error
    pub fn no_usable_rows(skipped: usize) -> Self {
        Self::NoUsableRows { skipped }
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV writing error with context
    pub fn csv_writing(message: impl Into<String>, source: csv::Error) -> Self {
        Self::CsvWriting {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether this error aborts an ingestion (as opposed to a usage error)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MalformedFile { .. } | Self::UnreadableSource { .. } | Self::NoUsableRows { .. }
        )
    }

    /// Process exit code for the CLI
    ///
    /// Structural input failures exit with 2, interruption with 130 and
    /// everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            error if error.is_structural() => 2,
            Self::ProcessingInterrupted { .. } => 130,
            _ => 1,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_file_message_includes_line_count() {
        let error = Error::malformed_file(1, "expected a header line and at least one data line");
        let message = error.to_string();
        assert!(message.contains("found 1 non-blank line"));
        assert!(message.contains("header line"));
        assert!(error.is_structural());
    }

    #[test]
    fn test_usage_errors_are_not_structural() {
        assert!(!Error::unknown_parameter("ALT").is_structural());
        assert!(!Error::configuration("bad").is_structural());
    }

    #[test]
    fn test_exit_codes_separate_input_failures_from_usage_errors() {
        assert_eq!(Error::malformed_file(1, "too short").exit_code(), 2);
        assert_eq!(Error::no_usable_rows(3).exit_code(), 2);
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::unreadable_source("flight.csv", missing).exit_code(), 2);

        assert_eq!(Error::processing_interrupted("ctrl-c").exit_code(), 130);
        assert_eq!(Error::unknown_parameter("ALT").exit_code(), 1);
        assert_eq!(Error::configuration("bad").exit_code(), 1);
    }
}
