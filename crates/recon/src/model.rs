use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single device row from the input sheet. Fields are trimmed by the
/// input layer; `row` is the 0-based position among data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub row: usize,
    pub external_id: String,
    pub imei: String,
    pub cobli_id: String,
    pub device_type: String,
    pub icc_id: String,
    pub chip_number: String,
    pub chip_operator: String,
    pub requested_fleet_id: String,
}

/// Vendor-side state of a device, as returned by a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDeviceState {
    pub current_fleet_id: String,
}

/// Body element of a device import call. The API takes a batch, we always
/// send a single-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPayload {
    pub id: String,
    pub imei: String,
    pub cobli_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub icc_id: String,
    pub chip_number: String,
    pub chip_operator: String,
    pub fleet_id: String,
    pub note: String,
}

impl ImportPayload {
    pub fn from_record(record: &DeviceRecord, note: String) -> Self {
        Self {
            id: record.external_id.trim().to_string(),
            imei: record.imei.trim().to_string(),
            cobli_id: record.cobli_id.trim().to_string(),
            device_type: record.device_type.trim().to_string(),
            icc_id: record.icc_id.trim().to_string(),
            chip_number: record.chip_number.trim().to_string(),
            chip_operator: record.chip_operator.trim().to_string(),
            fleet_id: record.requested_fleet_id.trim().to_string(),
            note,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Warning,
    Blocked,
    Failure { status: u16 },
    Error,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Blocked => "blocked",
            Self::Failure { .. } => "failure",
            Self::Error => "error",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Failure { status } => Some(*status),
            _ => None,
        }
    }

    /// Success and Warning leave the device in the requested fleet.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Success | Self::Warning)
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failure { status } => write!(f, "failure ({status})"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Terminal result for one input row. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub row: usize,
    pub imei: String,
    pub kind: OutcomeKind,
    pub message: String,
    pub note: String,
    pub completed_at: DateTime<Utc>,
}

impl Outcome {
    pub fn new(record: &DeviceRecord, kind: OutcomeKind, message: impl Into<String>, note: &str) -> Self {
        Self {
            row: record.row,
            imei: record.imei.trim().to_string(),
            kind,
            message: message.into(),
            note: note.to_string(),
            completed_at: Utc::now(),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Outcome", 7)?;
        s.serialize_field("row", &self.row)?;
        s.serialize_field("imei", &self.imei)?;
        s.serialize_field("result", self.kind.label())?;
        s.serialize_field("status", &self.kind.status())?;
        s.serialize_field("message", &self.message)?;
        s.serialize_field("note", &self.note)?;
        s.serialize_field("completed_at", &self.completed_at.to_rfc3339())?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// One row of the execution log, shaped for external persistence.
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub row: usize,
    pub imei: String,
    pub result: String,
    pub status: Option<u16>,
    pub message: String,
    pub note: String,
}

impl From<&Outcome> for LogEntry {
    fn from(outcome: &Outcome) -> Self {
        Self {
            timestamp: outcome.completed_at.to_rfc3339(),
            row: outcome.row,
            imei: outcome.imei.clone(),
            result: outcome.kind.label().to_string(),
            status: outcome.kind.status(),
            message: outcome.message.clone(),
            note: outcome.note.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub warning: usize,
    pub blocked: usize,
    pub failure: usize,
    pub error: usize,
}

impl BatchSummary {
    /// True when no record ended blocked, failed, or errored.
    pub fn is_clean(&self) -> bool {
        self.blocked == 0 && self.failure == 0 && self.error == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub operator: String,
    pub workers: usize,
    pub engine_version: String,
    pub started_at: String,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_fingerprint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub meta: ReportMeta,
    pub summary: BatchSummary,
    /// Completion order.
    pub outcomes: Vec<Outcome>,
    pub log: Vec<LogEntry>,
}

impl SessionReport {
    /// Outcomes re-sorted by input row, for display and export.
    pub fn in_input_order(&self) -> Vec<&Outcome> {
        let mut sorted: Vec<&Outcome> = self.outcomes.iter().collect();
        sorted.sort_by_key(|o| o.row);
        sorted
    }

    /// Log entries re-sorted by input row.
    pub fn log_in_input_order(&self) -> Vec<LogEntry> {
        let mut sorted = self.log.clone();
        sorted.sort_by_key(|e| e.row);
        sorted
    }
}
