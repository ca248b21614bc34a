//! Telcogen: synthetic telecom dataset generator
//!
//! Builds the seven related tables used by the SouthernLink network
//! intelligence demo (dashboards and natural-language query spaces read
//! them by table and column name):
//!
//! 1. `poi_infrastructure` - points of interconnect seeded from a fixed catalog
//! 2. `premises` - synthetic service locations around each POI
//! 3. `customers` - one account per connected premise
//! 4. `network_telemetry` - hourly utilisation samples per POI
//! 5. `incidents` - faults and maintenance events over the last year
//! 6. `customer_usage` - daily consumption for a sample of active customers
//! 7. `capacity_forecasts` - six month utilisation projections per POI
//!
//! # Architecture
//!
//! - `catalog`: static rule tables (seed locations, technologies, plan tiers,
//!   incident types). Every technology- or tier-derived column is a lookup
//!   into these tables, never an independent draw.
//! - `random`: the single seedable randomness source. Stages derive
//!   independent streams keyed by row identity, so rows can be built in
//!   parallel and still reproduce exactly for a fixed seed.
//! - `generator`: one pure function per table, run in dependency order by
//!   [`Generator`].
//! - `persistence`: table stores with truncate-and-reload semantics.
//!
//! ## Example Usage
//!
//! ```rust
//! use telcogen::{Generator, GeneratorConfig, SeedPolicy};
//!
//! let mut config = GeneratorConfig::default();
//! config.seed = SeedPolicy::Fixed(7);
//! config.telemetry_days = 2;
//! config.usage_days = 3;
//! config.forecast_window_days = 2;
//!
//! let generator = Generator::new(config).unwrap();
//! let dataset = generator.run().unwrap();
//!
//! assert_eq!(dataset.infrastructure.len(), 38);
//! assert_eq!(dataset.forecasts.len(), 38 * 6);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod generator;
pub mod persistence;
pub mod random;

// Re-export main types for convenience
pub use catalog::{
    builtin_locations, CatalogError, CatalogResult, IncidentStatus, IncidentType, PlanSpec,
    PlanTier, PremiseType, SeedLocation, Severity, Technology,
};

pub use config::{ConfigError, ConfigResult, GeneratorConfig, OutputConfig, TableFormat};

pub use generator::{
    CapacityForecast, CongestionStatus, Customer, Dataset, Generator, GeneratorError,
    GeneratorResult, Incident, PoiInfrastructure, Premise, RiskTier, TelemetrySample,
    UsageRecord,
};

pub use persistence::{
    FileStore, MemoryStore, PersistenceError, PersistenceManager, PersistenceResult,
    RunManifest, StorageError, StorageResult, TableStore,
};

pub use random::{RandomSource, SeedPolicy};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
