//! In-process table store

use super::manifest::RunManifest;
use super::storage::{check_name, StorageError, StorageResult};
use super::TableStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Tables held as JSON values, keyed by table name
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    staged: RwLock<HashMap<String, Vec<Value>>>,
    manifest: RwLock<Option<RunManifest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: &str) -> Option<usize> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(table).map(Vec::len)
    }

    pub fn manifest(&self) -> Option<RunManifest> {
        self.manifest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn to_values<R: Serialize>(rows: &[R]) -> StorageResult<Vec<Value>> {
    Ok(rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?)
}

impl TableStore for MemoryStore {
    fn replace_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize> {
        check_name(table)?;
        let values = to_values(rows)?;
        let count = values.len();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string(), values);
        Ok(count)
    }

    fn stage_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize> {
        check_name(table)?;
        let values = to_values(rows)?;
        let count = values.len();
        self.staged
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string(), values);
        Ok(count)
    }

    fn commit_tables(&self, tables: &[&str], manifest: &RunManifest) -> StorageResult<()> {
        let mut staged = self.staged.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(missing) = tables.iter().find(|table| !staged.contains_key(**table)) {
            return Err(StorageError::NotFound(missing.to_string()));
        }

        let mut stored = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        for table in tables {
            if let Some(values) = staged.remove(*table) {
                stored.insert(table.to_string(), values);
            }
        }
        *self.manifest.write().unwrap_or_else(PoisonError::into_inner) = Some(manifest.clone());
        Ok(())
    }

    fn discard_staged(&self, tables: &[&str]) {
        let mut staged = self.staged.write().unwrap_or_else(PoisonError::into_inner);
        for table in tables {
            staged.remove(*table);
        }
    }

    fn read_table<R: DeserializeOwned>(&self, table: &str) -> StorageResult<Vec<R>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let values = tables
            .get(table)
            .ok_or_else(|| StorageError::NotFound(table.to_string()))?;
        let rows = values
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<R>, _>>()?;
        Ok(rows)
    }

    fn table_names(&self) -> StorageResult<Vec<String>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_truncate_and_reload() {
        let store = MemoryStore::new();
        store.replace_table("numbers", &[1, 2, 3]).unwrap();
        store.replace_table("numbers", &[4]).unwrap();

        let back: Vec<i32> = store.read_table("numbers").unwrap();
        assert_eq!(back, vec![4]);
        assert_eq!(store.row_count("numbers"), Some(1));
        assert_eq!(store.table_names().unwrap(), vec!["numbers"]);
    }

    #[test]
    fn test_missing_table() {
        let store = MemoryStore::new();
        let result: StorageResult<Vec<i32>> = store.read_table("absent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(store.row_count("absent"), None);
    }

    #[test]
    fn test_commit_requires_every_staged_table() {
        let store = MemoryStore::new();
        store.replace_table("numbers", &[1]).unwrap();
        store.stage_table("numbers", &[2, 3]).unwrap();
        assert_eq!(store.row_count("numbers"), Some(1));

        let manifest = RunManifest {
            generator_version: "test".into(),
            master_seed: 9,
            as_of: chrono::Utc::now(),
            generated_at: chrono::Utc::now(),
            elapsed_ms: 0,
            catalog: "zivile".into(),
            schema: "telco".into(),
            tables: Default::default(),
        };
        let err = store.commit_tables(&["numbers", "letters"], &manifest).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(name) if name == "letters"));
        assert_eq!(store.row_count("numbers"), Some(1));
        assert!(store.manifest().is_none());

        store.commit_tables(&["numbers"], &manifest).unwrap();
        assert_eq!(store.row_count("numbers"), Some(2));
        assert_eq!(store.manifest().map(|m| m.master_seed), Some(9));

        store.stage_table("numbers", &[4]).unwrap();
        store.discard_staged(&["numbers"]);
        assert!(matches!(
            store.commit_tables(&["numbers"], &manifest),
            Err(StorageError::NotFound(_))
        ));
    }
}
