mod context;
mod conversion;
mod error;
mod loader;
mod materialize;
pub mod script;

pub use context::{Store, StoreBacking};
pub use conversion::{coerce, quote_identifier, Coerced};
pub use error::{QueryError, Result};
pub use loader::{load_sources, table_name_for, FileLoader, Sources};
pub use materialize::LoadReport;
pub use script::Script;
