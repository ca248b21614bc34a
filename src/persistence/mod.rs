//! Persistence layer for generated tables
//!
//! - [`TableStore`]: truncate-and-reload writes of whole tables
//! - [`FileStore`]: catalog/schema directories of CSV or JSON Lines files
//! - [`MemoryStore`]: tables kept in process
//! - [`PersistenceManager`]: runs the pipeline, then writes every table

pub mod manifest;
pub mod memory;
pub mod storage;

pub use manifest::{RunManifest, MANIFEST_FILE};
pub use memory::MemoryStore;
pub use storage::{FileStore, StorageError, StorageResult};

use crate::generator::{
    customers, forecasts, incidents, infrastructure, premises, telemetry, usage, Dataset,
    Generator, GeneratorError,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

/// A destination for whole tables.
///
/// `replace_table` discards whatever the store held under that name
/// before; there is no append or upsert. A run goes through
/// `stage_table` for every table and then a single `commit_tables`, which
/// publishes all staged tables and the manifest or none of them.
pub trait TableStore {
    fn replace_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize>;

    /// Hold rows for `table` without replacing what readers see
    fn stage_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize>;

    fn commit_tables(&self, tables: &[&str], manifest: &RunManifest) -> StorageResult<()>;

    /// Drop anything staged for `tables`
    fn discard_staged(&self, tables: &[&str]);

    fn read_table<R: DeserializeOwned>(&self, table: &str) -> StorageResult<Vec<R>>;

    /// Names of stored tables, sorted
    fn table_names(&self) -> StorageResult<Vec<String>>;
}

/// Tables of one run, in pipeline order
pub const TABLES: [&str; 7] = [
    infrastructure::TABLE_NAME,
    premises::TABLE_NAME,
    customers::TABLE_NAME,
    telemetry::TABLE_NAME,
    incidents::TABLE_NAME,
    usage::TABLE_NAME,
    forecasts::TABLE_NAME,
];

/// Writes complete datasets to a store
pub struct PersistenceManager<S: TableStore> {
    store: S,
}

impl<S: TableStore> PersistenceManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run every stage, then write all seven tables and the manifest.
    ///
    /// Nothing is written unless the whole pipeline succeeded.
    pub fn generate_and_persist(&self, generator: &Generator) -> PersistenceResult<RunManifest> {
        let started = Instant::now();
        let dataset = generator.run()?;
        self.write_dataset(generator, &dataset, started.elapsed())
    }

    /// Write an already generated dataset.
    ///
    /// Every table is staged first; if any write fails the store keeps the
    /// previous run's tables and manifest untouched.
    pub fn write_dataset(
        &self,
        generator: &Generator,
        dataset: &Dataset,
        elapsed: Duration,
    ) -> PersistenceResult<RunManifest> {
        let output = &generator.config().output;
        let manifest = RunManifest {
            generator_version: crate::VERSION.to_string(),
            master_seed: generator.master_seed(),
            as_of: generator.as_of(),
            generated_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
            catalog: output.catalog.clone(),
            schema: output.schema.clone(),
            tables: dataset
                .row_counts()
                .into_iter()
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
        };
        let published = self
            .stage_dataset(dataset)
            .and_then(|_| self.store.commit_tables(&TABLES, &manifest));
        if let Err(e) = published {
            self.store.discard_staged(&TABLES);
            return Err(e.into());
        }

        info!(
            "Persisted {} rows across {} tables to {}.{}",
            manifest.total_rows(),
            manifest.tables.len(),
            manifest.catalog,
            manifest.schema
        );
        Ok(manifest)
    }

    fn stage_dataset(&self, dataset: &Dataset) -> StorageResult<()> {
        self.store
            .stage_table(infrastructure::TABLE_NAME, &dataset.infrastructure)?;
        self.store.stage_table(premises::TABLE_NAME, &dataset.premises)?;
        self.store.stage_table(customers::TABLE_NAME, &dataset.customers)?;
        self.store.stage_table(telemetry::TABLE_NAME, &dataset.telemetry)?;
        self.store.stage_table(incidents::TABLE_NAME, &dataset.incidents)?;
        self.store.stage_table(usage::TABLE_NAME, &dataset.usage)?;
        self.store.stage_table(forecasts::TABLE_NAME, &dataset.forecasts)?;
        Ok(())
    }
}

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation failed: {0}")]
    Generator(#[from] GeneratorError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
