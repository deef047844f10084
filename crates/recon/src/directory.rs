//! Seams between the engine and the outside world.

use crate::error::{DirectoryError, SinkError};
use crate::model::{ImportPayload, LogEntry, RemoteDeviceState};

/// Vendor device directory + import API.
///
/// Implementations own their timeouts: every call must return within a
/// bounded time, and is attempted once.
pub trait DeviceDirectory: Send + Sync {
    /// Current fleet of the device with this IMEI. `Ok(None)` when the
    /// vendor does not know the device or returned no usable fleet.
    fn lookup(&self, imei: &str, token: &str) -> Result<Option<RemoteDeviceState>, DirectoryError>;

    /// Send one import/association call. Returns the HTTP status code for
    /// any response that arrived; `Err` only when none did.
    fn import_device(&self, payload: &ImportPayload, token: &str) -> Result<u16, DirectoryError>;
}

/// Destination for execution log entries. Best-effort: callers report a
/// failure and move on.
pub trait LogSink {
    fn name(&self) -> &str;
    fn append(&self, entries: &[LogEntry]) -> Result<(), SinkError>;
}
