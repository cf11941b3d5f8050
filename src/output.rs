//! Rendering result sets for the console and for CSV files.

use std::fs;
use std::path::Path;

use crate::storage::csv::SNIFF_CANDIDATES;
use crate::storage::table::{ResultSet, Value};
use crate::store::{QueryError, Result};

/// Rendering of NULL cells on the console.
pub const NULL_PLACEHOLDER: &str = "NULL";

const COLUMN_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum QuoteStyle {
    /// Quote only fields containing a delimiter candidate, a quote or a line break.
    #[default]
    Necessary,
    /// Quote every non-null, non-numeric field.
    NonNumeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: char,
    pub quote_style: QuoteStyle,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_style: QuoteStyle::Necessary,
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => NULL_PLACEHOLDER.to_string(),
        v => v.to_string(),
    }
}

/// Column widths in characters: the longest of the header and every value.
pub fn column_widths(result: &ResultSet) -> Vec<usize> {
    result
        .column_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            result
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|v| display_value(v).chars().count())
                .fold(name.chars().count(), usize::max)
        })
        .collect()
}

/// Renders an aligned text table:
///
/// ```text
///  a | b | c
/// ===========
///  1 | 2 | 3
/// ```
pub fn format_table(result: &ResultSet) -> String {
    let widths = column_widths(result);

    let render_line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!(" {}\n", padded.join(COLUMN_SEPARATOR))
    };

    let mut out = render_line(result.column_names.clone());

    let rule_width =
        widths.iter().sum::<usize>() + (COLUMN_SEPARATOR.len() * widths.len()).saturating_sub(1);
    out.push_str(&"=".repeat(rule_width));
    out.push('\n');

    for row in &result.rows {
        out.push_str(&render_line(row.iter().map(display_value).collect()));
    }

    if result.rows.is_empty() {
        out.push_str(" no row selected\n");
    }

    out
}

// Any sniffable delimiter is quoted so a reload without `-d` picks the
// same delimiter back.
fn needs_quotes(field: &str, delimiter: char) -> bool {
    field
        .chars()
        .any(|c| c == delimiter || SNIFF_CANDIDATES.contains(&c) || matches!(c, '"' | '\n' | '\r'))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn csv_field(value: &Value, format: &CsvFormat) -> String {
    if value.is_null() {
        return String::new();
    }

    let text = value.to_string();
    let force = format.quote_style == QuoteStyle::NonNumeric && !value.is_numeric();
    if force || needs_quotes(&text, format.delimiter) {
        quote(&text)
    } else {
        text
    }
}

/// Renders the header and every row as CSV, one record per line.
pub fn format_csv(result: &ResultSet, format: &CsvFormat) -> String {
    let separator = format.delimiter.to_string();
    let mut out = String::new();

    let header: Vec<String> = result
        .column_names
        .iter()
        .map(|name| {
            let force = format.quote_style == QuoteStyle::NonNumeric;
            if force || needs_quotes(name, format.delimiter) {
                quote(name)
            } else {
                name.clone()
            }
        })
        .collect();
    out.push_str(&header.join(&separator));
    out.push('\n');

    for row in &result.rows {
        let fields: Vec<String> = row.iter().map(|v| csv_field(v, format)).collect();
        out.push_str(&fields.join(&separator));
        out.push('\n');
    }

    out
}

/// Writes `result` to `path` as CSV. The whole file is rendered before
/// anything is written.
pub fn write_csv(result: &ResultSet, path: &Path, format: &CsvFormat) -> Result<()> {
    let content = format_csv(result, format);
    fs::write(path, content).map_err(|source| QueryError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), rows = result.row_count(), "wrote csv output");
    Ok(())
}
