use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::infer::TypeInferencer;
use super::table::{Column, DataType, Row, Schema, Table};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Empty CSV file")]
    EmptyFile,
}

/// Delimiters tried when none is configured.
pub const SNIFF_CANDIDATES: [char; 4] = [',', '\t', ';', '|'];

pub struct CsvReader {
    delimiter: Option<char>,
    sample_limit: Option<usize>,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self {
            delimiter: None,
            sample_limit: None,
        }
    }

    /// Fixes the delimiter instead of sniffing it from the header line.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_optional_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Infers column types from the first `limit` data rows only.
    pub fn with_sample_limit(mut self, limit: Option<usize>) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<Table, CsvError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let table_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string();

        self.read_from_reader(reader, &table_name)
    }

    pub fn read_from_reader<R: Read>(&self, mut reader: R, table_name: &str) -> Result<Table, CsvError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let delimiter = self
            .delimiter
            .unwrap_or_else(|| sniff_delimiter(content));
        let mut records = parse_records(content, delimiter)?.into_iter();

        let (_, headers) = records.next().ok_or(CsvError::EmptyFile)?;
        let data: Vec<(usize, Vec<String>)> = records.collect();

        Ok(self.build_table(table_name, headers, data))
    }

    /// Stages an in-memory header row plus data rows as a table.
    pub fn read_records(&self, table_name: &str, records: Vec<Vec<String>>) -> Result<Table, CsvError> {
        let mut records = records.into_iter().enumerate().map(|(i, r)| (i + 1, r));
        let (_, headers) = records.next().ok_or(CsvError::EmptyFile)?;
        Ok(self.build_table(table_name, headers, records.collect()))
    }

    fn build_table(&self, table_name: &str, headers: Vec<String>, data: Vec<(usize, Vec<String>)>) -> Table {
        let width = headers.len();
        let mut adjusted = 0;

        // Short rows are padded with blanks, long rows truncated to the header.
        let rows: Vec<Row> = data
            .into_iter()
            .map(|(line, mut values)| {
                if values.len() != width {
                    adjusted += 1;
                    tracing::debug!(
                        table = table_name,
                        line,
                        fields = values.len(),
                        expected = width,
                        "adjusting row to header width"
                    );
                    values.resize(width, String::new());
                }
                Row::new(values, line)
            })
            .collect();

        let types = self.infer_types(&rows, width);

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(types)
            .enumerate()
            .map(|(ordinal, (name, dtype))| Column::new(name, dtype, ordinal))
            .collect();

        let mut table = Table::with_rows(table_name, Schema::new(columns), rows);
        table.adjusted_rows = adjusted;
        table
    }

    fn infer_types(&self, rows: &[Row], num_columns: usize) -> Vec<DataType> {
        let mut inferencers = vec![TypeInferencer::new(); num_columns];
        let sample = self.sample_limit.unwrap_or(rows.len());

        for row in rows.iter().take(sample) {
            for (inferencer, value) in inferencers.iter_mut().zip(&row.values) {
                inferencer.observe(value);
            }
        }

        inferencers.iter().map(TypeInferencer::finish).collect()
    }
}

/// Picks the candidate that occurs most often outside quotes on the first line.
pub fn sniff_delimiter(content: &str) -> char {
    let mut counts = [0usize; SNIFF_CANDIDATES.len()];
    let mut in_quotes = false;

    for c in content.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes && (c == '\n' || c == '\r') {
            break;
        } else if !in_quotes {
            if let Some(i) = SNIFF_CANDIDATES.iter().position(|&d| d == c) {
                counts[i] += 1;
            }
        }
    }

    // Ties go to the earlier candidate.
    let mut best: Option<(usize, usize)> = None;
    for (i, &n) in counts.iter().enumerate() {
        if n > 0 && best.map_or(true, |(count, _)| n > count) {
            best = Some((n, i));
        }
    }

    best.map(|(_, i)| SNIFF_CANDIDATES[i]).unwrap_or(',')
}

/// Splits `content` into records, returning each with the line it starts on.
///
/// Quoted fields may span lines and contain doubled quotes. A quote that does
/// not open a field is literal text. Empty lines between records are skipped.
fn parse_records(content: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>, CsvError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut field_quoted = false;
    let mut has_content = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                if c == '\n' {
                    line += 1;
                }
                current_field.push(c);
            }
            continue;
        }

        match c {
            '"' if current_field.is_empty() && !field_quoted => {
                in_quotes = true;
                field_quoted = true;
                has_content = true;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if has_content {
                    fields.push(std::mem::take(&mut current_field));
                    records.push((record_line, std::mem::take(&mut fields)));
                }
                has_content = false;
                field_quoted = false;
                line += 1;
                record_line = line;
            }
            c if c == delimiter => {
                fields.push(std::mem::take(&mut current_field));
                field_quoted = false;
                has_content = true;
            }
            c => {
                current_field.push(c);
                has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::Parse {
            line: record_line,
            message: "Unclosed quote".to_string(),
        });
    }

    if has_content {
        fields.push(current_field);
        records.push((record_line, fields));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(csv_data: &str) -> Table {
        CsvReader::new()
            .read_from_reader(Cursor::new(csv_data), "test")
            .unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let table = read("id,name,age\n1,Alice,30\n2,Bob,25");

        assert_eq!(table.name, "test");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows[1].values, vec!["2", "Bob", "25"]);
    }

    #[test]
    fn test_quoted_fields() {
        let table = read("name,description\n\"John Doe\",\"A \"\"quoted\"\" value\"");

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0].values[0], "John Doe");
        assert_eq!(table.rows[0].values[1], "A \"quoted\" value");
    }

    #[test]
    fn test_quote_inside_unquoted_field_is_literal() {
        let table = read("size,name\n12\" pizza,a\n14\" pizza,b\n");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].values, vec!["12\" pizza", "a"]);
        assert_eq!(table.rows[1].values, vec!["14\" pizza", "b"]);
        assert_eq!(table.adjusted_rows, 0);
    }

    #[test]
    fn test_text_after_closing_quote_is_kept() {
        let table = read("a,b\n\"x\"y\"z,1\n");
        assert_eq!(table.rows[0].values, vec!["xy\"z", "1"]);
    }

    #[test]
    fn test_quoted_newline_and_delimiter() {
        let table = read("a,b\n\"line one\nline two\",\"x,y\"\n3,4\n");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].values[0], "line one\nline two");
        assert_eq!(table.rows[0].values[1], "x,y");
        assert_eq!(table.rows[1].line, 4);
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let table = read("a,b\n  padded ,x\n");
        assert_eq!(table.rows[0].values[0], "  padded ");
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let table = read("a,b\r\n1,2\r\n\r\n3,4\r\n");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].values, vec!["3", "4"]);
        assert_eq!(table.rows[1].line, 4);
    }

    #[test]
    fn test_type_inference() {
        let table = read("i,r,d,t\n1,1.5,2024-01-01,hello\n2,2,2024-02-29,3");

        let types: Vec<DataType> = table.schema.columns.iter().map(|c| c.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Integer, DataType::Real, DataType::Date, DataType::Text]
        );
        assert_eq!(table.schema.columns[3].ordinal, 3);
    }

    #[test]
    fn test_short_rows_padded_long_rows_truncated() {
        let table = read("a,b,c\n1\n1,2,3,4\n");

        assert_eq!(table.rows[0].values, vec!["1", "", ""]);
        assert_eq!(table.rows[1].values, vec!["1", "2", "3"]);
        assert_eq!(table.adjusted_rows, 2);
        assert_eq!(table.schema.columns[2].data_type, DataType::Integer);
    }

    #[test]
    fn test_header_only() {
        let table = read("a,b\n");
        assert_eq!(table.row_count(), 0);
        assert!(table
            .schema
            .columns
            .iter()
            .all(|c| c.data_type == DataType::Text));
    }

    #[test]
    fn test_empty_file() {
        let result = CsvReader::new().read_from_reader(Cursor::new(""), "test");
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_unclosed_quote_reports_line() {
        let result = CsvReader::new().read_from_reader(Cursor::new("a,b\n1,2\n3,\"open\n"), "test");
        match result {
            Err(CsvError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other.map(|t| t.name)),
        }
    }

    #[test]
    fn test_custom_delimiter() {
        let table = CsvReader::new()
            .with_delimiter(';')
            .read_from_reader(Cursor::new("a;b;c\n1;2;3"), "test")
            .unwrap();

        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(sniff_delimiter("a;b;c\n"), ';');
        assert_eq!(sniff_delimiter("\"x,y\"|b\n"), '|');
        assert_eq!(sniff_delimiter("single\n"), ',');

        let table = read("a|b\n1|2\n");
        assert_eq!(table.schema.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_sample_limit() {
        let table = CsvReader::new()
            .with_sample_limit(Some(2))
            .read_from_reader(Cursor::new("n\n1\n2\nthree\n"), "test")
            .unwrap();

        assert_eq!(table.schema.columns[0].data_type, DataType::Integer);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_read_records() {
        let records = vec![
            vec!["name".to_string(), "number".to_string()],
            vec!["cat".to_string(), "1".to_string()],
            vec!["dog".to_string(), "2".to_string()],
        ];
        let table = CsvReader::new().read_records("result", records).unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.schema.columns[1].data_type, DataType::Integer);
    }
}
