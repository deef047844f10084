// Workbook import (xlsx, xls, xlsb, ods): first sheet only

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::InputError;
use crate::rows::{hash_bytes, records_from_table, InputBatch, RawTable};

/// Load the first worksheet of a workbook as a device table.
pub fn load(path: &Path) -> Result<InputBatch, InputError> {
    let bytes = std::fs::read(path).map_err(|e| InputError::Io(format!("{}: {}", path.display(), e)))?;

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| InputError::Workbook(format!("Failed to open workbook: {}", e)))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| InputError::Workbook("workbook contains no sheets".into()))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| InputError::Workbook(format!("Failed to read sheet '{}': {}", first, e)))?;
    debug!(sheet = %first, rows = range.height(), cols = range.width(), "reading worksheet");

    let grid: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let table = RawTable::from_grid(grid).ok_or(InputError::Empty)?;
    records_from_table(&table, hash_bytes(&bytes))
}

/// Render a cell as text. Integral floats drop the decimal part so long
/// numeric IDs (IMEI, ICC-ID) keep their digits.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn format_number(n: f64) -> String {
    // Above 2^53 integers are no longer exact
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
