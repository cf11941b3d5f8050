use std::path::Path;

use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;

use crate::storage::csv::CsvReader;
use crate::storage::table::Table;

use super::context::{table_exists, Store};
use super::conversion::{coerce, quote_identifier};
use super::error::{QueryError, Result};

/// Outcome of staging one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub table: String,
    pub rows: usize,
    /// Rows padded or truncated to the header width.
    pub adjusted_rows: usize,
    /// Cells stored as raw text because they did not parse as the column type.
    pub coercion_fallbacks: usize,
}

impl Store {
    /// Creates `table` in the store and inserts all of its rows in a single
    /// transaction. A prior table of the same name is replaced when
    /// `overwrite` is set; otherwise it is kept and `None` is returned.
    pub fn materialize(&mut self, table: &Table, overwrite: bool) -> Result<Option<LoadReport>> {
        if table.name.is_empty() {
            return Err(QueryError::InvalidTableName(table.name.clone()));
        }

        let quoted_table = quote_identifier(&table.name);
        let tx = self.connection_mut().transaction()?;

        if table_exists(&tx, &table.name)? {
            if !overwrite {
                tracing::debug!(table = table.name.as_str(), "table exists, skipping load");
                return Ok(None);
            }
            tx.execute(&format!("DROP TABLE {}", quoted_table), [])?;
        }

        let column_defs: Vec<String> = table
            .schema
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.data_type.sql_type()))
            .collect();
        tx.execute(
            &format!("CREATE TABLE {} ({})", quoted_table, column_defs.join(", ")),
            [],
        )?;

        let placeholders = vec!["?"; table.column_count()].join(", ");
        let insert_sql = format!("INSERT INTO {} VALUES ({})", quoted_table, placeholders);
        let mut fallbacks = 0;

        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in &table.rows {
                if row.values.len() != table.column_count() {
                    tracing::debug!(
                        table = table.name.as_str(),
                        line = row.line,
                        fields = row.values.len(),
                        "binding row of wrong width"
                    );
                }
                // Missing trailing cells bind as blanks; extra cells are ignored.
                let values: Vec<SqlValue> = table
                    .schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let raw = row.get(i).unwrap_or("");
                        let coerced = coerce(raw, column.data_type);
                        if coerced.is_fallback() {
                            fallbacks += 1;
                            tracing::debug!(
                                table = table.name.as_str(),
                                column = column.name.as_str(),
                                line = row.line,
                                "stored unparseable cell as text"
                            );
                        }
                        coerced.into_value()
                    })
                    .collect();
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }

        tx.commit()?;

        let report = LoadReport {
            table: table.name.clone(),
            rows: table.row_count(),
            adjusted_rows: table.adjusted_rows,
            coercion_fallbacks: fallbacks,
        };
        tracing::debug!(
            table = report.table.as_str(),
            rows = report.rows,
            columns = table.column_count(),
            "materialized table"
        );
        Ok(Some(report))
    }

    /// Loads one CSV file under an explicit table name.
    pub fn import_csv(
        &mut self,
        path: &Path,
        table_name: &str,
        overwrite: bool,
        reader: &CsvReader,
    ) -> Result<Option<LoadReport>> {
        if !path.is_file() {
            return Err(QueryError::InputNotFound(path.to_path_buf()));
        }

        let mut table = reader.read_file(path).map_err(|source| QueryError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        table.name = table_name.to_string();

        self.materialize(&table, overwrite)
    }

    /// Stages an in-memory array (header row first) as a table.
    pub fn import_records(
        &mut self,
        table_name: &str,
        records: Vec<Vec<String>>,
        overwrite: bool,
    ) -> Result<Option<LoadReport>> {
        let table = CsvReader::new()
            .read_records(table_name, records)
            .map_err(|source| QueryError::Csv {
                path: table_name.into(),
                source,
            })?;

        self.materialize(&table, overwrite)
    }
}
