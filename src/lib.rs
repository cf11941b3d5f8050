pub mod cli;
pub mod output;
pub mod storage;
pub mod store;

use std::path::PathBuf;

pub use output::{format_csv, format_table, write_csv, CsvFormat, QuoteStyle};
pub use storage::table::{Column, DataType, ResultSet, Row, Schema, SourceKind, Table, Value};
pub use storage::CsvReader;
pub use store::{
    load_sources, FileLoader, QueryError, Result as QueryResult, Script, Sources, Store, StoreBacking,
};

/// Loads `paths` into an in-memory store and runs `sql` against it.
pub fn query_csv(sql: &str, paths: &[PathBuf]) -> QueryResult<Option<ResultSet>> {
    let mut loader = FileLoader::new(StoreBacking::Memory)?;
    loader.load_files(paths)?;
    loader.store().query(sql)
}
