// Lead export

pub mod csv;
pub mod json;

pub use crate::csv::{export, to_csv, ExportError, CSV_FILE_NAME, HEADERS};
