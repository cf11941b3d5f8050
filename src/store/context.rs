use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::storage::table::{Column, DataType, ResultSet, Schema};

use super::conversion::quote_identifier;
use super::error::{QueryError, Result};
use super::script::{self, Script};

/// Where staged tables live for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreBacking {
    #[default]
    Memory,
    /// A SQLite file; removed when the store is dropped unless `keep` is set.
    File { path: PathBuf, keep: bool },
}

/// Removes a scratch database file when dropped.
#[derive(Debug)]
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch database"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::debug!(path = %self.path.display(), error = %e, "could not remove scratch database"),
        }
    }
}

/// The relational namespace shared by every table of one invocation.
pub struct Store {
    conn: Connection,
    backing: StoreBacking,
    // Declared after `conn` so the connection closes before the file goes.
    scratch: Option<ScratchFile>,
}

impl Store {
    pub fn open(backing: StoreBacking) -> Result<Self> {
        let (conn, scratch) = match &backing {
            StoreBacking::Memory => (Connection::open_in_memory()?, None),
            StoreBacking::File { path, keep } => {
                // Staging always starts from an empty file.
                match fs::remove_file(path) {
                    Ok(()) => tracing::debug!(path = %path.display(), "replaced existing database file"),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(QueryError::Io(e)),
                }
                let scratch = (!*keep).then(|| ScratchFile { path: path.clone() });
                (Connection::open(path)?, scratch)
            }
        };

        Ok(Self {
            conn,
            backing,
            scratch,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(StoreBacking::Memory)
    }

    /// Opens an existing SQLite file as the store. Nothing is staged or removed.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(QueryError::InputNotFound(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            backing: StoreBacking::File {
                path: path.to_path_buf(),
                keep: true,
            },
            scratch: None,
        };

        // Fails early on files that are not SQLite databases.
        let tables = store.tables()?;
        tracing::debug!(path = %path.display(), tables = tables.len(), "opened existing database");
        Ok(store)
    }

    pub fn backing(&self) -> &StoreBacking {
        &self.backing
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;

        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(tables)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(table_exists(&self.conn, name)?)
    }

    /// Column layout of `name` as declared in the store, or `None` if absent.
    pub fn table_schema(&self, name: &str) -> Result<Option<Schema>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(name)))?;

        let columns: Vec<Column> = stmt
            .query_map([], |row| {
                let ordinal: i64 = row.get(0)?;
                let name: String = row.get(1)?;
                let declared: String = row.get(2)?;
                Ok(Column::new(
                    name,
                    DataType::from_declared(&declared),
                    ordinal as usize,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Ok(None);
        }
        Ok(Some(Schema::new(columns)))
    }

    /// Runs `sql` (one or more `;`-separated statements) and returns the
    /// result of the last statement that produced rows.
    pub fn query(&self, sql: &str) -> Result<Option<ResultSet>> {
        self.execute_script(&Script::parse(sql))
    }

    pub fn execute_script(&self, script: &Script) -> Result<Option<ResultSet>> {
        script::execute(&self.conn, script)
    }

    /// Closes the connection, reporting errors that a plain drop would hide.
    pub fn close(self) -> Result<()> {
        let Store { conn, scratch, .. } = self;
        conn.close().map_err(|(_, e)| QueryError::Sqlite(e))?;
        drop(scratch);
        Ok(())
    }
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?1 COLLATE NOCASE",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
