use std::path::{Path, PathBuf};

use crate::storage::csv::CsvReader;
use crate::storage::table::{SourceKind, Table};

use super::context::{Store, StoreBacking};
use super::error::{QueryError, Result};
use super::materialize::LoadReport;

/// Where the tables of one run come from.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub csv_files: Vec<PathBuf>,
    /// An existing SQLite file. When set, `csv_files` and `backing` are ignored.
    pub database: Option<PathBuf>,
    pub backing: StoreBacking,
}

/// Stages sources into one store, one table per CSV file.
pub struct FileLoader {
    store: Store,
    reader: CsvReader,
    source_kind: SourceKind,
    table_names: Vec<String>,
}

impl FileLoader {
    pub fn new(backing: StoreBacking) -> Result<Self> {
        let store = Store::open(backing)?;
        Ok(Self {
            store,
            reader: CsvReader::new(),
            source_kind: SourceKind::CsvFile,
            table_names: Vec::new(),
        })
    }

    /// Uses an existing database file directly as the store.
    pub fn open_database(path: &Path) -> Result<Self> {
        let store = Store::open_existing(path)?;
        let table_names = store.tables()?;
        Ok(Self {
            store,
            reader: CsvReader::new(),
            source_kind: SourceKind::ExistingDatabase,
            table_names,
        })
    }

    pub fn with_reader(mut self, reader: CsvReader) -> Self {
        self.reader = reader;
        self
    }

    /// Loads a CSV file as a table named after the file stem, replacing any
    /// table already staged under that name.
    pub fn load_file(&mut self, path: &Path) -> Result<LoadReport> {
        if !path.is_file() {
            return Err(QueryError::InputNotFound(path.to_path_buf()));
        }

        let table_name = table_name_for(path)?;
        let report = self
            .store
            .import_csv(path, &table_name, true, &self.reader)?
            .unwrap_or_default();

        self.table_names.retain(|t| !t.eq_ignore_ascii_case(&table_name));
        self.table_names.push(table_name);
        Ok(report)
    }

    /// Loads every file in order. All paths are checked before any is read;
    /// colliding stems resolve to the last file.
    pub fn load_files(&mut self, paths: &[PathBuf]) -> Result<Vec<LoadReport>> {
        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(QueryError::InputNotFound(missing.clone()));
        }

        paths.iter().map(|path| self.load_file(path)).collect()
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.table_names.clone()
    }

    /// Schema-only descriptions of the staged tables, in load order.
    pub fn tables(&self) -> Result<Vec<Table>> {
        let mut tables = Vec::with_capacity(self.table_names.len());
        for name in &self.table_names {
            if let Some(schema) = self.store.table_schema(name)? {
                tables.push(Table::new(name.as_str(), schema, self.source_kind));
            }
        }
        Ok(tables)
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Opens the store for `sources`: the existing database when one is given,
/// otherwise a fresh store with every CSV file loaded.
pub fn load_sources(sources: &Sources, reader: CsvReader) -> Result<FileLoader> {
    if let Some(database) = &sources.database {
        if !sources.csv_files.is_empty() {
            tracing::debug!("database input given, ignoring CSV inputs");
        }
        return FileLoader::open_database(database);
    }

    let mut loader = FileLoader::new(sources.backing.clone())?.with_reader(reader);
    loader.load_files(&sources.csv_files)?;
    Ok(loader)
}

/// The file name without directory or extension.
pub fn table_name_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| QueryError::InvalidTableName(path.display().to_string()))
}
