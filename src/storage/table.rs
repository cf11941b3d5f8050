use std::collections::HashMap;
use std::fmt;

/// Storage type of a column, ordered from most to least specific.
///
/// Inference only ever walks down this lattice: `Integer > Real > Date > Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    Integer,
    Real,
    Date,
    Text,
}

impl DataType {
    /// Next less specific type, or `None` once `Text` is reached.
    pub fn widen(self) -> Option<DataType> {
        match self {
            DataType::Integer => Some(DataType::Real),
            DataType::Real => Some(DataType::Date),
            DataType::Date => Some(DataType::Text),
            DataType::Text => None,
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Date => "DATE",
            DataType::Text => "TEXT",
        }
    }

    /// Maps a declared SQLite column type back onto the lattice.
    pub fn from_declared(declared: &str) -> DataType {
        match declared.to_uppercase().as_str() {
            t if t.contains("INT") => DataType::Integer,
            t if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") => DataType::Real,
            t if t.contains("DATE") => DataType::Date,
            _ => DataType::Text,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// A cell read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Real(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            // Whole reals keep a fractional digit so they reload as REAL.
            Value::Real(r) if r.is_finite() && r.fract() == 0.0 => {
                write!(f, "{:.1}", r)
            }
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(bytes) => {
                write!(f, "X'")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, "'")
            }
            Value::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub ordinal: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            ordinal,
        }
    }
}

/// Ordered column list. Order is header order and never changes.
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<Column>,
    column_index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        // Duplicate header names are kept; lookups resolve to the last one.
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), i))
            .collect();
        Self {
            columns,
            column_index,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(&name.to_lowercase()).copied()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// One data record as raw text, aligned with the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<String>,
    /// Physical line the record started on, for error reporting.
    pub line: usize,
}

impl Row {
    pub fn new(values: Vec<String>, line: usize) -> Self {
        Self { values, line }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    CsvFile,
    ExistingDatabase,
}

/// A staged table: inferred schema plus the raw rows it was inferred from.
///
/// Tables opened from an existing database carry their schema only.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub schema: Schema,
    pub source_kind: SourceKind,
    pub rows: Vec<Row>,
    /// Rows padded or truncated to the header width while reading.
    pub adjusted_rows: usize,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema, source_kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            schema,
            source_kind,
            rows: Vec::new(),
            adjusted_rows: 0,
        }
    }

    pub fn with_rows(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            schema,
            source_kind: SourceKind::CsvFile,
            rows,
            adjusted_rows: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

/// Column names and rows returned by a row-producing statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { column_names, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}
