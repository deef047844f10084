// Device table input and execution log output

pub mod csv;
pub mod error;
pub mod rows;
pub mod sheet;
pub mod xlsx;

use std::path::Path;

pub use error::InputError;
pub use rows::{InputBatch, RawTable, RejectedRow, REQUIRED_COLUMNS};

/// Load a device table, picking the reader from the file extension.
pub fn load_input(path: &Path) -> Result<InputBatch, InputError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => csv::load(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => xlsx::load(path),
        _ => Err(InputError::UnsupportedFormat(path.display().to_string())),
    }
}
