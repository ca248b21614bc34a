//! The generation pipeline
//!
//! Seven stages, run strictly in dependency order:
//!
//! ```text
//! seed catalog -> infrastructure -> premises -> customers -> usage
//!                       |  \
//!                       |   +-> telemetry -> forecasts
//!                       +-> incidents
//! ```
//!
//! Each stage is a pure function of the configuration, the random source
//! and the fully materialised rows of earlier stages. A stage whose input
//! table is empty fails with [`GeneratorError::MissingDependency`] and the
//! run stops there; nothing is persisted until every stage has succeeded.

pub mod customers;
pub mod forecasts;
pub mod ids;
pub mod incidents;
pub mod infrastructure;
pub mod premises;
pub mod telemetry;
pub mod usage;
pub mod util;

pub use customers::Customer;
pub use forecasts::{CapacityForecast, RiskTier};
pub use incidents::Incident;
pub use infrastructure::PoiInfrastructure;
pub use premises::Premise;
pub use telemetry::{CongestionStatus, TelemetrySample};
pub use usage::UsageRecord;

use crate::catalog::{builtin_locations, load_locations_file, CatalogError, SeedLocation};
use crate::config::{ConfigError, GeneratorConfig};
use crate::random::RandomSource;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Generator errors
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Empty or malformed seed catalog
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An upstream table the stage reads is empty
    #[error("Missing dependency: stage '{stage}' requires rows from '{table}'")]
    MissingDependency {
        stage: &'static str,
        table: &'static str,
    },

    /// An upstream table lacks the rows for one key
    #[error("Missing dependency: stage '{stage}' found no '{table}' rows for {key}")]
    MissingUpstreamRow {
        stage: &'static str,
        table: &'static str,
        key: String,
    },
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Fail fast when a stage's input table is empty
pub(crate) fn require_rows<T>(
    stage: &'static str,
    table: &'static str,
    rows: &[T],
) -> GeneratorResult<()> {
    if rows.is_empty() {
        return Err(GeneratorError::MissingDependency { stage, table });
    }
    Ok(())
}

/// Everything a stage needs besides its input rows
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub config: &'a GeneratorConfig,
    pub random: &'a RandomSource,
    /// Reference instant shared by every stage of the run
    pub as_of: DateTime<Utc>,
}

/// The seven generated tables of one run
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub infrastructure: Vec<PoiInfrastructure>,
    pub premises: Vec<Premise>,
    pub customers: Vec<Customer>,
    pub telemetry: Vec<TelemetrySample>,
    pub incidents: Vec<Incident>,
    pub usage: Vec<UsageRecord>,
    pub forecasts: Vec<CapacityForecast>,
}

impl Dataset {
    /// Row counts keyed by table name, in pipeline order
    pub fn row_counts(&self) -> IndexMap<&'static str, usize> {
        let mut counts = IndexMap::new();
        counts.insert(infrastructure::TABLE_NAME, self.infrastructure.len());
        counts.insert(premises::TABLE_NAME, self.premises.len());
        counts.insert(customers::TABLE_NAME, self.customers.len());
        counts.insert(telemetry::TABLE_NAME, self.telemetry.len());
        counts.insert(incidents::TABLE_NAME, self.incidents.len());
        counts.insert(usage::TABLE_NAME, self.usage.len());
        counts.insert(forecasts::TABLE_NAME, self.forecasts.len());
        counts
    }

    pub fn total_rows(&self) -> usize {
        self.row_counts().values().sum()
    }
}

/// Runs the pipeline for one configuration
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    random: RandomSource,
    as_of: DateTime<Utc>,
}

impl Generator {
    /// Validate the configuration and resolve its seed policy
    pub fn new(config: GeneratorConfig) -> GeneratorResult<Self> {
        let random = RandomSource::new(config.seed);
        Self::with_random(config, random)
    }

    /// Use an explicit random source instead of the configured policy
    pub fn with_random(config: GeneratorConfig, random: RandomSource) -> GeneratorResult<Self> {
        config.validate()?;
        let as_of = config.reference_time();
        Ok(Self {
            config,
            random,
            as_of,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn master_seed(&self) -> u64 {
        self.random.master_seed()
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn context(&self) -> StageContext<'_> {
        StageContext {
            config: &self.config,
            random: &self.random,
            as_of: self.as_of,
        }
    }

    /// Seed catalog for this run: the configured file, or the built-in one
    pub fn locations(&self) -> GeneratorResult<Vec<SeedLocation>> {
        match &self.config.locations_file {
            Some(path) => Ok(load_locations_file(path)?),
            None => Ok(builtin_locations()),
        }
    }

    pub fn run(&self) -> GeneratorResult<Dataset> {
        let locations = self.locations()?;
        self.run_with_locations(&locations)
    }

    /// Run every stage in dependency order
    pub fn run_with_locations(&self, locations: &[SeedLocation]) -> GeneratorResult<Dataset> {
        let ctx = self.context();
        let started = Instant::now();
        info!(
            "Generating dataset as of {} (master seed {})",
            self.as_of.to_rfc3339(),
            self.master_seed()
        );

        let infrastructure = infrastructure::generate_infrastructure(&ctx, locations)?;
        let premises = premises::generate_premises(&ctx, &infrastructure)?;
        let customers = customers::generate_customers(&ctx, &premises)?;
        let telemetry = telemetry::generate_telemetry(&ctx, &infrastructure)?;
        let incidents = incidents::generate_incidents(&ctx, &infrastructure)?;
        let usage = usage::generate_usage(&ctx, &customers)?;
        let forecasts = forecasts::generate_forecasts(&ctx, &infrastructure, &telemetry)?;

        let dataset = Dataset {
            infrastructure,
            premises,
            customers,
            telemetry,
            incidents,
            usage,
            forecasts,
        };

        info!(
            "Generated {} rows across {} tables in {:?}",
            dataset.total_rows(),
            dataset.row_counts().len(),
            started.elapsed()
        );

        Ok(dataset)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Small, fixed configuration for stage tests
    pub fn test_config() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.as_of = Some(Utc.with_ymd_and_hms(2026, 3, 18, 12, 0, 0).unwrap());
        config.telemetry_days = 8;
        config.forecast_window_days = 7;
        config.usage_days = 14;
        config
    }

    pub fn test_generator() -> Generator {
        Generator::with_random(test_config(), RandomSource::seeded(42)).unwrap()
    }
}
