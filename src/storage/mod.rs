pub mod csv;
pub mod infer;
pub mod table;

pub use csv::CsvReader;
pub use infer::{infer, TypeInferencer};
pub use table::{Column, DataType, ResultSet, Row, Schema, SourceKind, Table, Value};
