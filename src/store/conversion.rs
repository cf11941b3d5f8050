use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::storage::infer::{is_blank, parse_date, parse_real, DATE_FORMAT};
use crate::storage::table::{DataType, Value};

/// Result of coercing one raw cell to its column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Typed(SqlValue),
    /// The cell did not parse; the raw text is stored as-is.
    Fallback(SqlValue),
}

impl Coerced {
    pub fn into_value(self) -> SqlValue {
        match self {
            Coerced::Typed(v) | Coerced::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Coerced::Fallback(_))
    }
}

/// Converts raw CSV text into the value bound for `data_type`.
///
/// Blank cells become NULL. Dates are stored as canonical `YYYY-MM-DD` text.
pub fn coerce(raw: &str, data_type: DataType) -> Coerced {
    if is_blank(raw) {
        return Coerced::Typed(SqlValue::Null);
    }

    let typed = match data_type {
        DataType::Integer => raw.trim().parse::<i64>().ok().map(SqlValue::Integer),
        DataType::Real => parse_real(raw).map(SqlValue::Real),
        DataType::Date => parse_date(raw).map(|d| SqlValue::Text(d.format(DATE_FORMAT).to_string())),
        DataType::Text => Some(SqlValue::Text(raw.to_string())),
    };

    match typed {
        Some(v) => Coerced::Typed(v),
        None => Coerced::Fallback(SqlValue::Text(raw.to_string())),
    }
}

pub fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Wraps an identifier in double quotes, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
