//! Configuration management and validation.
//!
//! Provides layered configuration (defaults -> JSON file -> environment ->
//! CLI overrides) for ingestion, sampling, analysis and per-parameter
//! filtering.

use crate::app::models::FilterConfig;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE, DEFAULT_RESERVED_COLUMNS,
    DEFAULT_SKIP_WARNING_RATIO, DEFAULT_TARGET_ROWS, ENV_BATCH_SIZE, ENV_TARGET_ROWS,
    ENV_UNITS_ROW, NUMERIC_RATIO_THRESHOLD, SPARSITY_THRESHOLD,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// How the second non-blank line of a recording is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsRowMode {
    /// Decide with the units-row heuristic
    #[default]
    Auto,
    /// The second line is always a units row
    Present,
    /// The second line is always data
    Absent,
}

impl fmt::Display for UnitsRowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Present => "present",
            Self::Absent => "absent",
        };
        f.write_str(name)
    }
}

impl FromStr for UnitsRowMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "present" | "yes" | "true" => Ok(Self::Present),
            "absent" | "no" | "false" => Ok(Self::Absent),
            other => Err(format!(
                "Invalid units row mode '{}' (expected auto, present or absent)",
                other
            )),
        }
    }
}

/// Ingestion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Data lines per batch (progress and cancellation granularity)
    pub batch_size: usize,

    /// Units row detection override
    pub units_row: UnitsRowMode,

    /// Column names that are not parameters, matched case-insensitively
    pub reserved_columns: Vec<String>,

    /// Treat "every data line skipped" as a hard failure
    pub fail_on_empty: bool,

    /// Skip rate above which a warning is logged
    pub skip_warning_ratio: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            units_row: UnitsRowMode::Auto,
            reserved_columns: DEFAULT_RESERVED_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            fail_on_empty: false,
            skip_warning_ratio: DEFAULT_SKIP_WARNING_RATIO,
        }
    }
}

impl IngestConfig {
    /// Whether a column name is reserved (not a flight parameter)
    ///
    /// Unlabelled columns are always reserved.
    pub fn is_reserved(&self, column: &str) -> bool {
        let column = column.trim();
        column.is_empty()
            || self
                .reserved_columns
                .iter()
                .any(|reserved| reserved.trim().eq_ignore_ascii_case(column))
    }
}

/// Sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Upper bound on rows kept after sampling
    pub target_rows: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target_rows: DEFAULT_TARGET_ROWS,
        }
    }
}

/// Analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Numeric share of non-empty values required (strictly exceeded) to be numeric
    pub numeric_ratio_threshold: f64,

    /// Missing share that must be exceeded for a parameter to be sparse
    pub sparsity_threshold: f64,

    /// Parameters analysed concurrently
    pub parallel_workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            numeric_ratio_threshold: NUMERIC_RATIO_THRESHOLD,
            sparsity_threshold: SPARSITY_THRESHOLD,
            parallel_workers: num_cpus::get(),
        }
    }
}

/// Filter configuration for all parameters plus per-parameter overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub default: FilterConfig,
    pub per_parameter: HashMap<String, FilterConfig>,
}

impl FilterSettings {
    /// Filter configuration for a parameter, falling back to the default
    pub fn for_parameter(&self, name: &str) -> &FilterConfig {
        self.per_parameter.get(name).unwrap_or(&self.default)
    }
}

/// Complete processing configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub sampling: SamplingConfig,
    pub analysis: AnalysisConfig,
    pub filters: FilterSettings,
}

impl Config {
    /// Default config file location under the platform config directory
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::configuration("Could not determine user configuration directory")
        })?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::serialization(
                format!("Invalid config file '{}'", path.display()),
                e,
            )
        })
    }

    /// Build a configuration from defaults, an optional file and the environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => {
                    debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FLIGHT_PROCESSOR_*` overrides from an iterator of variables
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_BATCH_SIZE => {
                    self.ingest.batch_size = parse_env_usize(&key, &value)?;
                    debug!("Batch size overridden from environment: {}", value);
                }
                ENV_TARGET_ROWS => {
                    self.sampling.target_rows = parse_env_usize(&key, &value)?;
                    debug!("Target rows overridden from environment: {}", value);
                }
                ENV_UNITS_ROW => {
                    self.ingest.units_row = value.parse().map_err(Error::configuration)?;
                    debug!("Units row mode overridden from environment: {}", value);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 {
            return Err(Error::configuration(
                "Batch size must be greater than 0",
            ));
        }

        if self.sampling.target_rows < 2 {
            return Err(Error::configuration(format!(
                "Target rows must be at least 2 to keep the first and last rows (got {})",
                self.sampling.target_rows
            )));
        }

        for (name, value) in [
            ("numeric_ratio_threshold", self.analysis.numeric_ratio_threshold),
            ("sparsity_threshold", self.analysis.sparsity_threshold),
            ("skip_warning_ratio", self.ingest.skip_warning_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::configuration(format!(
                    "{} must be between 0 and 1 (got {})",
                    name, value
                )));
            }
        }

        if self.analysis.parallel_workers == 0 {
            return Err(Error::configuration(
                "Number of parallel workers must be greater than 0",
            ));
        }

        validate_filter("default", &self.filters.default)?;
        for (name, filter) in &self.filters.per_parameter {
            validate_filter(name, filter)?;
        }

        Ok(())
    }

    pub fn with_target_rows(mut self, target_rows: usize) -> Self {
        self.sampling.target_rows = target_rows;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.ingest.batch_size = batch_size;
        self
    }

    pub fn with_units_row(mut self, units_row: UnitsRowMode) -> Self {
        self.ingest.units_row = units_row;
        self
    }
}

fn parse_env_usize(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        Error::configuration(format!("Invalid value '{}' for {}: {}", value, key, e))
    })
}

fn validate_filter(name: &str, filter: &FilterConfig) -> Result<()> {
    if filter.use_custom_range && filter.custom_range.min > filter.custom_range.max {
        return Err(Error::configuration(format!(
            "Filter '{}': custom range min {} exceeds max {}",
            name, filter.custom_range.min, filter.custom_range.max
        )));
    }

    if filter.outlier_threshold < 0.0 || !filter.outlier_threshold.is_finite() {
        return Err(Error::configuration(format!(
            "Filter '{}': outlier threshold must be a non-negative percentage (got {})",
            name, filter.outlier_threshold
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{CustomRange, InterpolationMethod};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ingest.batch_size, 5_000);
        assert_eq!(config.sampling.target_rows, 10_000);
        assert_eq!(config.analysis.sparsity_threshold, 0.2);
    }

    #[test]
    fn test_reserved_columns_case_insensitive() {
        let config = IngestConfig::default();
        assert!(config.is_reserved("Time"));
        assert!(config.is_reserved(" PHASE "));
        assert!(config.is_reserved(""));
        assert!(!config.is_reserved("ALTITUDE"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(vec![
                (ENV_BATCH_SIZE.to_string(), "250".to_string()),
                (ENV_TARGET_ROWS.to_string(), "500".to_string()),
                (ENV_UNITS_ROW.to_string(), "absent".to_string()),
                ("UNRELATED".to_string(), "ignored".to_string()),
            ])
            .unwrap();

        assert_eq!(config.ingest.batch_size, 250);
        assert_eq!(config.sampling.target_rows, 500);
        assert_eq!(config.ingest.units_row, UnitsRowMode::Absent);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = Config::default();
        let result =
            config.apply_env_overrides(vec![(ENV_BATCH_SIZE.to_string(), "many".to_string())]);
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_validation_failures() {
        assert!(Config::default().with_batch_size(0).validate().is_err());
        assert!(Config::default().with_target_rows(1).validate().is_err());

        let mut config = Config::default();
        config.analysis.sparsity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.filters.per_parameter.insert(
            "ALT".to_string(),
            FilterConfig {
                use_custom_range: true,
                custom_range: CustomRange {
                    min: 10.0,
                    max: 0.0,
                },
                ..FilterConfig::default()
            },
        );
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("ALT"));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "ingest": {{ "batch_size": 100, "units_row": "present" }},
                "sampling": {{ "target_rows": 2000 }},
                "filters": {{
                    "per_parameter": {{
                        "IAS": {{ "interpolation_method": "linear", "force_interpolation": true }}
                    }}
                }}
            }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.ingest.batch_size, 100);
        assert_eq!(config.ingest.units_row, UnitsRowMode::Present);
        assert_eq!(config.sampling.target_rows, 2000);
        // Unspecified sections keep their defaults
        assert_eq!(config.analysis.numeric_ratio_threshold, 0.8);

        let ias = config.filters.for_parameter("IAS");
        assert_eq!(ias.interpolation_method, InterpolationMethod::Linear);
        assert!(ias.force_interpolation);
        assert_eq!(
            config.filters.for_parameter("ALT"),
            &FilterConfig::default()
        );
    }

    #[test]
    fn test_invalid_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(Error::Serialization { .. })
        ));
    }

    #[test]
    fn test_units_row_mode_parsing() {
        assert_eq!("AUTO".parse(), Ok(UnitsRowMode::Auto));
        assert_eq!("present".parse(), Ok(UnitsRowMode::Present));
        assert_eq!("no".parse(), Ok(UnitsRowMode::Absent));
        assert!("maybe".parse::<UnitsRowMode>().is_err());
    }
}
