//! Column type inference over raw CSV text.
//!
//! Every column starts as `Integer` and is widened one lattice step at a time
//! until the current value parses. Widening is monotonic: once a column is
//! `Text` no later value can narrow it again. Dates do not contain numbers, so
//! a column that has accepted a number and fails `Real` goes straight to `Text`.

use chrono::NaiveDate;

use super::table::DataType;

/// The one calendar pattern recognised as a date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Blank values are absent and never influence inference.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Whether `value` parses cleanly under `data_type`.
pub fn parses_as(value: &str, data_type: DataType) -> bool {
    let value = value.trim();
    match data_type {
        DataType::Integer => value.parse::<i64>().is_ok(),
        DataType::Real => parse_real(value).is_some(),
        DataType::Date => parse_date(value).is_some(),
        DataType::Text => true,
    }
}

/// Finite floats only; `inf`/`NaN` spellings stay text.
pub fn parse_real(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Running state of the lattice walk for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInferencer {
    current: DataType,
    seen_value: bool,
    seen_numeric: bool,
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInferencer {
    pub fn new() -> Self {
        Self {
            current: DataType::Integer,
            seen_value: false,
            seen_numeric: false,
        }
    }

    pub fn observe(&mut self, value: &str) {
        if is_blank(value) {
            return;
        }
        self.seen_value = true;
        while !parses_as(value, self.current) {
            match self.current.widen() {
                Some(DataType::Date) if self.seen_numeric => self.current = DataType::Text,
                Some(next) => self.current = next,
                None => break,
            }
        }
        if matches!(self.current, DataType::Integer | DataType::Real) {
            self.seen_numeric = true;
        }
    }

    /// The inferred type; a column with no non-blank values is `Text`.
    pub fn finish(&self) -> DataType {
        if self.seen_value {
            self.current
        } else {
            DataType::Text
        }
    }
}

/// Infers the storage type of one column from its values (header excluded).
pub fn infer<'a, I>(values: I) -> DataType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut inferencer = TypeInferencer::new();
    for value in values {
        inferencer.observe(value);
        if inferencer.current == DataType::Text {
            break;
        }
    }
    inferencer.finish()
}
