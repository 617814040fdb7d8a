//! Application constants for the flight processor
//!
//! This module contains configuration defaults, classification thresholds
//! and progress milestones used throughout the ingestion and analysis pipeline.

// =============================================================================
// Ingestion
// =============================================================================

/// Number of data lines processed between progress reports and cancellation checks
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Column names treated as row indices rather than flight parameters (case-insensitive)
pub const DEFAULT_RESERVED_COLUMNS: &[&str] = &["time", "index", "phase"];

/// Skip rate above which ingestion logs a warning
pub const DEFAULT_SKIP_WARNING_RATIO: f64 = 0.05;

/// Field delimiter; the comma is the only supported delimiter
pub const FIELD_DELIMITER: char = ',';

/// Quote character used to protect delimiters inside fields
pub const QUOTE_CHAR: char = '"';

// =============================================================================
// Units Row Heuristic
// =============================================================================

/// Fraction of unit-like fields above which the second line is a units row
pub const UNITS_ROW_RATIO: f64 = 0.6;

/// Fields shorter than this that are not plain numbers count as unit-like
pub const UNIT_FIELD_MAX_LEN: usize = 10;

// =============================================================================
// Sampling and Analysis
// =============================================================================

/// Default bounded row count after sampling
pub const DEFAULT_TARGET_ROWS: usize = 10_000;

/// Numeric share of non-empty values above which a parameter is numeric
pub const NUMERIC_RATIO_THRESHOLD: f64 = 0.8;

/// Missing share above which a parameter is sparse
pub const SPARSITY_THRESHOLD: f64 = 0.2;

/// Fallback range when a parameter has no numeric values
pub const DEFAULT_MIN: f64 = 0.0;
pub const DEFAULT_MAX: f64 = 1.0;

// =============================================================================
// Progress Milestones
// =============================================================================

pub mod progress {
    /// Start of the reading phase
    pub const READING_START: u8 = 0;

    /// Header line located and being parsed
    pub const HEADERS_PARSING: u8 = 10;

    /// End of the reading phase, header and units resolved
    pub const READING_DONE: u8 = 30;

    /// Start of the record processing phase
    pub const PROCESSING_START: u8 = 60;

    /// Highest percentage reported before completion
    pub const PROCESSING_END: u8 = 99;

    /// Completion
    pub const COMPLETE: u8 = 100;

    /// Message sent with the completion event
    pub const COMPLETE_MESSAGE: &str = "Complete!";
}

// =============================================================================
// Configuration Environment
// =============================================================================

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "flight-processor";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable overrides
pub const ENV_BATCH_SIZE: &str = "FLIGHT_PROCESSOR_BATCH_SIZE";
pub const ENV_TARGET_ROWS: &str = "FLIGHT_PROCESSOR_TARGET_ROWS";
pub const ENV_UNITS_ROW: &str = "FLIGHT_PROCESSOR_UNITS_ROW";
