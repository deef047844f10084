// CSV device tables and the execution log file

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fleetload_recon::{LogEntry, LogSink, SinkError};

use crate::error::InputError;
use crate::rows::{hash_bytes, records_from_table, InputBatch, RawTable};

/// Column order of the execution log CSV.
pub const LOG_COLUMNS: [&str; 7] = ["timestamp", "row", "imei", "result", "status", "message", "note"];

/// Load a CSV device table from disk.
pub fn load(path: &Path) -> Result<InputBatch, InputError> {
    let bytes = std::fs::read(path).map_err(|e| InputError::Io(format!("{}: {}", path.display(), e)))?;
    load_bytes(&bytes)
}

/// Parse CSV bytes (any common delimiter, UTF-8 or Windows-1252).
pub fn load_bytes(bytes: &[u8]) -> Result<InputBatch, InputError> {
    let content = decode_utf8(bytes);
    let table = parse_table(&content, sniff_delimiter(&content))?;
    records_from_table(&table, hash_bytes(bytes))
}

/// Guess the delimiter of a device sheet from its first lines.
///
/// Sheets exported from pt-BR spreadsheets use `;`, pasted tables use tabs.
/// Each candidate is scored by how many lines split into the same number of
/// fields as the header line, times that field count. Comma is the fallback.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let Some(&target) = counts.first() else {
            return b',';
        };
        if target <= 1 {
            continue;
        }

        // More consistent lines wins; more columns breaks ties
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// UTF-8 if valid, otherwise Windows-1252 (Excel-exported CSVs).
pub fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn parse_table(content: &str, delimiter: u8) -> Result<RawTable, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| InputError::Csv(e.to_string()))?;
        grid.push(record.iter().map(str::to_string).collect());
    }

    RawTable::from_grid(grid).ok_or(InputError::Empty)
}

/// Write the execution log as a fresh CSV file.
pub fn write_log(path: &Path, entries: &[LogEntry]) -> Result<(), InputError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| InputError::Io(e.to_string()))?;
    writer.write_record(LOG_COLUMNS).map_err(|e| InputError::Io(e.to_string()))?;
    for entry in entries {
        writer.write_record(log_record(entry)).map_err(|e| InputError::Io(e.to_string()))?;
    }
    writer.flush().map_err(|e| InputError::Io(e.to_string()))?;
    Ok(())
}

fn log_record(entry: &LogEntry) -> [String; 7] {
    [
        entry.timestamp.clone(),
        entry.row.to_string(),
        entry.imei.clone(),
        entry.result.clone(),
        entry.status.map(|s| s.to_string()).unwrap_or_default(),
        entry.message.clone(),
        entry.note.clone(),
    ]
}

/// Appends log entries to a local CSV file, writing the header only when
/// the file is new or empty.
pub struct CsvLogSink {
    path: PathBuf,
}

impl CsvLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSink for CsvLogSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn append(&self, entries: &[LogEntry]) -> Result<(), SinkError> {
        let needs_header = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SinkError::Io(format!("{}: {}", self.path.display(), e)))?;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(LOG_COLUMNS).map_err(|e| SinkError::Io(e.to_string()))?;
        }
        for entry in entries {
            writer.write_record(log_record(entry)).map_err(|e| SinkError::Io(e.to_string()))?;
        }
        writer.flush().map_err(|e| SinkError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "id,imei,cobli_id,type,icc_id,chip_number,chip_operator,fleet_id";

    fn entry(row: usize, status: Option<u16>) -> LogEntry {
        LogEntry {
            timestamp: "2026-10-18T12:00:00+00:00".into(),
            row,
            imei: format!("35693803564380{row}"),
            result: if status.is_some() { "failure".into() } else { "success".into() },
            status,
            message: "associated successfully".into(),
            note: "fleetload - operator: ana@example.com".into(),
        }
    }

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "imei;fleet_id;type\n1;F1;t\n2;F2;t\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        assert_eq!(sniff_delimiter("imei,fleet_id\n1,F1\n"), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        assert_eq!(sniff_delimiter("imei\tfleet_id\n1\tF1\n"), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "imei;note;fleet_id\n1;\"a, b\";F1\n2;\"c\";F2\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_empty_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_load_semicolon_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("devices.csv");
        let content = format!(
            "{}\nD-1;356938035643809;CB1;tracker;8955;11999;vivo;F1\n",
            HEADER.replace(',', ";")
        );
        fs::write(&path, &content).unwrap();

        let batch = load(&path).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].imei, "356938035643809");
        assert_eq!(batch.fingerprint, hash_bytes(content.as_bytes()));
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Operação" in Windows-1252
        let mut bytes = format!("{HEADER}\n1,123,c,t,i,n,").into_bytes();
        bytes.extend_from_slice(&[b'O', b'p', b'e', b'r', b'a', 0xE7, 0xE3, b'o']);
        bytes.extend_from_slice(b",F1\n");

        let batch = load_bytes(&bytes).unwrap();
        assert_eq!(batch.records[0].chip_operator, "Operação");
    }

    #[test]
    fn test_header_only_gives_empty_queue() {
        let batch = load_bytes(format!("{HEADER}\n").as_bytes()).unwrap();
        assert!(batch.records.is_empty());
        assert!(batch.rejected.is_empty());
    }

    #[test]
    fn test_empty_file_is_error() {
        assert_eq!(load_bytes(b"").unwrap_err(), InputError::Empty);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, InputError::Io(_)));
    }

    #[test]
    fn test_write_log_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        write_log(&path, &[entry(0, None), entry(1, Some(400))]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,row,imei,result,status,message,note");
        assert_eq!(
            lines[1],
            "2026-10-18T12:00:00+00:00,0,356938035643800,success,,associated successfully,fleetload - operator: ana@example.com"
        );
        assert!(lines[2].contains(",failure,400,"));
    }

    #[test]
    fn test_csv_sink_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let sink = CsvLogSink::new(&path);

        sink.append(&[entry(0, None)]).unwrap();
        sink.append(&[entry(1, None), entry(2, Some(500))]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("timestamp,row,imei").count(), 1);
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_csv_sink_unwritable_path() {
        let dir = tempdir().unwrap();
        let sink = CsvLogSink::new(dir.path().join("missing-dir/history.csv"));
        assert!(matches!(sink.append(&[entry(0, None)]), Err(SinkError::Io(_))));
    }
}
