//! Header mapping and row validation shared by every input format.

use fleetload_recon::DeviceRecord;
use tracing::debug;

use crate::error::InputError;

/// Column names expected in the header row (case-insensitive).
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "id",
    "imei",
    "cobli_id",
    "type",
    "icc_id",
    "chip_number",
    "chip_operator",
    "fleet_id",
];

/// Cells as text, header row separated out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// First row becomes the header. Returns `None` for an empty grid.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Option<Self> {
        if grid.is_empty() {
            return None;
        }
        let headers = grid.remove(0);
        Some(Self { headers, rows: grid })
    }
}

/// A row left out of the queue, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

/// Validated device queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBatch {
    pub records: Vec<DeviceRecord>,
    pub rejected: Vec<RejectedRow>,
    /// `blake3:<hex>` of the source bytes.
    pub fingerprint: String,
}

/// `blake3:<hex>` digest.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data).to_hex())
}

/// Map the header row onto the expected columns and turn each data row
/// into a [`DeviceRecord`].
///
/// Row indices are 0-based over data rows (header excluded). Fully blank
/// rows are skipped; rows without an IMEI or fleet ID are rejected.
pub fn records_from_table(table: &RawTable, fingerprint: String) -> Result<InputBatch, InputError> {
    let normalized: Vec<String> = table
        .headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
        .collect();

    let mut columns = [0usize; 8];
    let mut missing = Vec::new();
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        match normalized.iter().position(|h| h == name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(InputError::MissingColumns(missing));
    }

    let [id, imei, cobli_id, device_type, icc_id, chip_number, chip_operator, fleet_id] = columns;
    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for (row, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let cell = |idx: usize| cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();

        let record = DeviceRecord {
            row,
            external_id: cell(id),
            imei: cell(imei),
            cobli_id: cell(cobli_id),
            device_type: cell(device_type),
            icc_id: cell(icc_id),
            chip_number: cell(chip_number),
            chip_operator: cell(chip_operator),
            requested_fleet_id: cell(fleet_id),
        };

        let reason = match (record.imei.is_empty(), record.requested_fleet_id.is_empty()) {
            (true, true) => Some("missing imei and fleet_id"),
            (true, false) => Some("missing imei"),
            (false, true) => Some("missing fleet_id"),
            (false, false) => None,
        };
        match reason {
            Some(reason) => {
                debug!(row, reason, "row rejected");
                rejected.push(RejectedRow { row, reason: reason.to_string() });
            }
            None => records.push(record),
        }
    }

    Ok(InputBatch { records, rejected, fingerprint })
}
