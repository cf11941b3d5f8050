use std::path::PathBuf;

use thiserror::Error;

use crate::storage::csv::CsvError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to load {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: CsvError,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("SQL error in statement {index}: {message}")]
    SqlExecution { index: usize, message: String },

    #[error("Failed to write output to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("No SQL statements to execute")]
    EmptyScript,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
