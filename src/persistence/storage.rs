//! Filesystem table store
//!
//! Tables live at `<root>/<catalog>/<schema>/<table>.<ext>`. Tables are
//! written to `.tmp` siblings first. A commit moves the previous files
//! aside as `.bak`, renames every staged file into place and puts the
//! backups back if any rename fails, so the directory holds either the
//! whole previous run or the whole new one.

use super::manifest::{RunManifest, MANIFEST_FILE};
use super::TableStore;
use crate::config::{OutputConfig, TableFormat};
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog, schema and table names must be plain identifiers
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Table not found: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0:?}")]
    NotAFile(PathBuf),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Accept `[A-Za-z0-9_]+`, the identifiers downstream SQL can address unquoted
pub(crate) fn check_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write through `write` into `path`, removing the file again on failure
fn write_file<F>(path: &Path, write: F) -> StorageResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> StorageResult<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    if let Err(e) = write(&mut writer).and_then(|_| Ok(writer.flush()?)) {
        drop(writer);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Rename every `(staged, target)` pair into place, or none of them.
///
/// Targets that are not regular files are refused before anything moves.
fn swap_into_place(pairs: &[(PathBuf, PathBuf)]) -> StorageResult<()> {
    for (staged, target) in pairs {
        if !staged.is_file() {
            return Err(StorageError::NotFound(staged.display().to_string()));
        }
        if target.exists() && !target.is_file() {
            return Err(StorageError::NotAFile(target.clone()));
        }
    }

    let mut backups = Vec::new();
    let mut placed = Vec::new();
    match move_all(pairs, &mut backups, &mut placed) {
        Ok(()) => {
            for (backup, _) in &backups {
                let _ = fs::remove_file(backup);
            }
            Ok(())
        }
        Err(e) => {
            warn!("Rolling back {} renamed table file(s): {}", placed.len(), e);
            for target in placed {
                let _ = fs::remove_file(target);
            }
            for (backup, target) in backups {
                let _ = fs::rename(backup, target);
            }
            Err(e)
        }
    }
}

fn move_all<'a>(
    pairs: &'a [(PathBuf, PathBuf)],
    backups: &mut Vec<(PathBuf, &'a Path)>,
    placed: &mut Vec<&'a Path>,
) -> StorageResult<()> {
    for (_, target) in pairs {
        if target.exists() {
            let backup = with_suffix(target, ".bak");
            fs::rename(target, &backup)?;
            backups.push((backup, target.as_path()));
        }
    }
    for (staged, target) in pairs {
        fs::rename(staged, target)?;
        placed.push(target.as_path());
    }
    Ok(())
}

/// Catalog/schema-qualified directory of table files
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    format: TableFormat,
}

impl FileStore {
    /// Open (creating if needed) `<root>/<catalog>/<schema>`
    pub fn open(
        root: impl AsRef<Path>,
        catalog: &str,
        schema: &str,
        format: TableFormat,
    ) -> StorageResult<Self> {
        check_name(catalog)?;
        check_name(schema)?;
        let dir = root.as_ref().join(catalog).join(schema);
        fs::create_dir_all(&dir)?;
        info!("Opened table store at {:?} ({:?})", dir, format);
        Ok(Self { dir, format })
    }

    pub fn from_config(output: &OutputConfig) -> StorageResult<Self> {
        Self::open(&output.root, &output.catalog, &output.schema, output.format)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", table, self.format.extension()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Load the manifest of the last completed run
    pub fn read_manifest(&self) -> StorageResult<RunManifest> {
        let path = self.manifest_path();
        if !path.exists() {
            return Err(StorageError::NotFound(MANIFEST_FILE.to_string()));
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn staged_path(&self, target: &Path) -> PathBuf {
        with_suffix(target, ".tmp")
    }

    fn write_rows<R: Serialize>(&self, path: &Path, rows: &[R]) -> StorageResult<()> {
        match self.format {
            TableFormat::Csv => write_file(path, |out| Self::write_csv(out, rows)),
            TableFormat::JsonLines => write_file(path, |out| Self::write_json_lines(out, rows)),
        }
    }

    fn write_csv<R: Serialize>(out: &mut BufWriter<File>, rows: &[R]) -> StorageResult<()> {
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json_lines<R: Serialize>(out: &mut BufWriter<File>, rows: &[R]) -> StorageResult<()> {
        for row in rows {
            serde_json::to_writer(&mut *out, row)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl TableStore for FileStore {
    fn replace_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize> {
        let count = self.stage_table(table, rows)?;
        let path = self.table_path(table);
        let staged = self.staged_path(&path);
        if let Err(e) = swap_into_place(&[(staged.clone(), path)]) {
            let _ = fs::remove_file(staged);
            return Err(e);
        }
        Ok(count)
    }

    fn stage_table<R: Serialize>(&self, table: &str, rows: &[R]) -> StorageResult<usize> {
        check_name(table)?;
        let path = self.staged_path(&self.table_path(table));
        self.write_rows(&path, rows)?;
        debug!("Staged {} rows at {:?}", rows.len(), path);
        Ok(rows.len())
    }

    fn commit_tables(&self, tables: &[&str], manifest: &RunManifest) -> StorageResult<()> {
        let mut pairs = Vec::with_capacity(tables.len() + 1);
        for table in tables {
            check_name(table)?;
            let path = self.table_path(table);
            pairs.push((self.staged_path(&path), path));
        }

        let manifest_path = self.manifest_path();
        let staged_manifest = self.staged_path(&manifest_path);
        write_file(&staged_manifest, |out| {
            Ok(serde_json::to_writer_pretty(out, manifest)?)
        })?;
        pairs.push((staged_manifest.clone(), manifest_path));

        if let Err(e) = swap_into_place(&pairs) {
            let _ = fs::remove_file(staged_manifest);
            return Err(e);
        }
        info!("Committed {} tables to {:?}", tables.len(), self.dir);
        Ok(())
    }

    fn discard_staged(&self, tables: &[&str]) {
        let targets = tables
            .iter()
            .filter(|table| check_name(table).is_ok())
            .map(|table| self.table_path(table))
            .chain(std::iter::once(self.manifest_path()));
        for target in targets {
            let staged = self.staged_path(&target);
            if staged.exists() {
                let _ = fs::remove_file(staged);
            }
        }
    }

    fn read_table<R: DeserializeOwned>(&self, table: &str) -> StorageResult<Vec<R>> {
        check_name(table)?;
        let path = self.table_path(table);
        if !path.exists() {
            return Err(StorageError::NotFound(table.to_string()));
        }

        match self.format {
            TableFormat::Csv => {
                let mut reader = ReaderBuilder::new().has_headers(true).from_path(&path)?;
                let rows = reader.deserialize().collect::<Result<Vec<R>, _>>()?;
                Ok(rows)
            }
            TableFormat::JsonLines => {
                let reader = BufReader::new(File::open(&path)?);
                let mut rows = Vec::new();
                for line in reader.lines() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    rows.push(serde_json::from_str(&line)?);
                }
                Ok(rows)
            }
        }
    }

    fn table_names(&self) -> StorageResult<Vec<String>> {
        let extension = self.format.extension();
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('_') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        value: f64,
        note: Option<String>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: "a".into(), value: 1.5, note: None },
            Row { id: "b".into(), value: 2.25, note: Some("x, y".into()) },
        ]
    }

    #[test]
    fn test_csv_replace_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();

        assert_eq!(store.replace_table("things", &rows()).unwrap(), 2);
        assert!(store.table_path("things").ends_with("zivile/telco/things.csv"));
        let back: Vec<Row> = store.read_table("things").unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn test_json_lines_replace_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::JsonLines).unwrap();

        store.replace_table("things", &rows()).unwrap();
        let back: Vec<Row> = store.read_table("things").unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn test_replace_overwrites_previous_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();

        store.replace_table("things", &rows()).unwrap();
        store.replace_table("things", &rows()[..1]).unwrap();
        let back: Vec<Row> = store.read_table("things").unwrap();
        assert_eq!(back.len(), 1);

        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_table_names_skip_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();
        store.replace_table("b_table", &rows()).unwrap();
        store.replace_table("a_table", &rows()).unwrap();

        assert_eq!(store.table_names().unwrap(), vec!["a_table", "b_table"]);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            FileStore::open(temp_dir.path(), "../escape", "telco", TableFormat::Csv),
            Err(StorageError::InvalidName(_))
        ));
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();
        assert!(matches!(
            store.replace_table("bad name", &rows()),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_missing_table() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();
        let result: StorageResult<Vec<Row>> = store.read_table("absent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    fn manifest(seed: u64) -> RunManifest {
        RunManifest {
            generator_version: "test".into(),
            master_seed: seed,
            as_of: chrono::Utc::now(),
            generated_at: chrono::Utc::now(),
            elapsed_ms: 0,
            catalog: "zivile".into(),
            schema: "telco".into(),
            tables: Default::default(),
        }
    }

    fn leftover_files(store: &FileStore) -> Vec<PathBuf> {
        fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                let name = p.to_string_lossy();
                name.ends_with(".tmp") || name.ends_with(".bak")
            })
            .collect()
    }

    #[test]
    fn test_staged_tables_invisible_until_commit() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();

        store.stage_table("a_table", &rows()).unwrap();
        store.stage_table("b_table", &rows()[..1]).unwrap();
        assert!(store.table_names().unwrap().is_empty());
        assert!(store.read_manifest().is_err());

        store.commit_tables(&["a_table", "b_table"], &manifest(3)).unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["a_table", "b_table"]);
        let back: Vec<Row> = store.read_table("b_table").unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(store.read_manifest().unwrap().master_seed, 3);
        assert!(leftover_files(&store).is_empty());
    }

    #[test]
    fn test_commit_refuses_blocked_target_and_keeps_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), "zivile", "telco", TableFormat::Csv).unwrap();
        store.stage_table("a_table", &rows()).unwrap();
        store.stage_table("b_table", &rows()).unwrap();
        store.commit_tables(&["a_table", "b_table"], &manifest(1)).unwrap();

        let blocked = store.table_path("b_table");
        fs::remove_file(&blocked).unwrap();
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), b"x").unwrap();

        store.stage_table("a_table", &rows()[..1]).unwrap();
        store.stage_table("b_table", &rows()[..1]).unwrap();
        let err = store
            .commit_tables(&["a_table", "b_table"], &manifest(2))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotAFile(_)));
        store.discard_staged(&["a_table", "b_table"]);

        let a: Vec<Row> = store.read_table("a_table").unwrap();
        assert_eq!(a, rows());
        assert_eq!(store.read_manifest().unwrap().master_seed, 1);
        assert!(leftover_files(&store).is_empty());
    }
}
