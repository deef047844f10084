use std::fmt;

/// Failure loading the device table or writing the execution log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// File could not be read or written.
    Io(String),
    /// Malformed CSV.
    Csv(String),
    /// Workbook could not be opened or has no sheets.
    Workbook(String),
    /// Published sheet could not be downloaded.
    Fetch(String),
    /// File extension is not a known table format.
    UnsupportedFormat(String),
    /// Header row lacks these columns.
    MissingColumns(Vec<String>),
    /// Table has no header row.
    Empty,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Workbook(msg) => write!(f, "workbook error: {msg}"),
            Self::Fetch(msg) => write!(f, "cannot fetch sheet: {msg}"),
            Self::UnsupportedFormat(path) => write!(f, "unsupported input format: {path}"),
            Self::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            Self::Empty => write!(f, "input has no header row"),
        }
    }
}

impl std::error::Error for InputError {}
