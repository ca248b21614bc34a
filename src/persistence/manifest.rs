//! Run manifest written beside the tables

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "_manifest.json";

/// What a completed run produced, and how to reproduce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub generator_version: String,
    /// Master seed actually used, also for entropy-seeded runs
    pub master_seed: u64,
    pub as_of: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub catalog: String,
    pub schema: String,
    /// Row counts in pipeline order
    pub tables: IndexMap<String, usize>,
}

impl RunManifest {
    pub fn total_rows(&self) -> usize {
        self.tables.values().sum()
    }
}
