//! Run configuration for the generator
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. Command line flags are applied on top by the CLI.

use crate::random::SeedPolicy;
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Semantically invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// On-disk format of generated tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::JsonLines => "jsonl",
        }
    }
}

/// Where tables are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Filesystem root of the table store
    pub root: PathBuf,
    /// Catalog name (first path component under root)
    pub catalog: String,
    /// Schema name (second path component under root)
    pub schema: String,
    pub format: TableFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            catalog: "zivile".to_string(),
            schema: "telco".to_string(),
            format: TableFormat::Csv,
        }
    }
}

/// Generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Single switch between reproducible and varied output
    pub seed: SeedPolicy,
    /// Reference instant; `None` means the current hour
    pub as_of: Option<DateTime<Utc>>,
    /// Real premises represented by one synthetic premise row
    pub premises_compression_ratio: u32,
    /// Trailing days of hourly telemetry per POI
    pub telemetry_days: u32,
    /// Candidate incident slots per POI
    pub incident_slots: u32,
    /// Probability that an incident slot is kept
    pub incident_retention: f64,
    /// Incidents start somewhere in this many trailing days
    pub incident_lookback_days: u32,
    /// Fraction of active customers that get usage history
    pub usage_sample_fraction: f64,
    /// Seed for the usage sample, independent of `seed`
    pub usage_sample_seed: u64,
    /// Trailing days of usage per sampled customer
    pub usage_days: u32,
    /// Forecast horizon in months
    pub forecast_months: u32,
    /// Telemetry window aggregated into the current peak
    pub forecast_window_days: u32,
    /// Replaces the built-in seed catalog when set
    pub locations_file: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: SeedPolicy::default(),
            as_of: None,
            premises_compression_ratio: 100,
            telemetry_days: 30,
            incident_slots: 5,
            incident_retention: 0.7,
            incident_lookback_days: 365,
            usage_sample_fraction: 0.3,
            usage_sample_seed: 42,
            usage_days: 90,
            forecast_months: 6,
            forecast_window_days: 7,
            locations_file: None,
            output: OutputConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration from a YAML (or JSON) file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            _ => Self::from_yaml_str(&text)?,
        };
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.premises_compression_ratio == 0 {
            return Err(ConfigError::Invalid(
                "premises_compression_ratio must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("incident_retention", self.incident_retention),
            ("usage_sample_fraction", self.usage_sample_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("telemetry_days", self.telemetry_days),
            ("incident_slots", self.incident_slots),
            ("incident_lookback_days", self.incident_lookback_days),
            ("usage_days", self.usage_days),
            ("forecast_months", self.forecast_months),
            ("forecast_window_days", self.forecast_window_days),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
            }
        }

        if self.forecast_window_days > self.telemetry_days {
            return Err(ConfigError::Invalid(format!(
                "forecast_window_days ({}) exceeds telemetry_days ({})",
                self.forecast_window_days, self.telemetry_days
            )));
        }

        if self.output.catalog.trim().is_empty() || self.output.schema.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "output catalog and schema names must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The instant every "N days ago" is measured from, truncated to the hour
    pub fn reference_time(&self) -> DateTime<Utc> {
        let instant = self.as_of.unwrap_or_else(Utc::now);
        instant.duration_trunc(Duration::hours(1)).unwrap_or(instant)
    }
}
