//! `fleetload-recon`: fleet-assignment reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded device records and a
//! [`DeviceDirectory`] implementation, returns classified outcomes.
//! No HTTP, CLI, or file IO dependencies.

pub mod batch;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod normalize;
pub mod policy;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{run_batch, run_batch_with_progress};
pub use config::{LookupFailurePolicy, PolicyConfig};
pub use directory::{DeviceDirectory, LogSink};
pub use engine::reconcile;
pub use error::{BatchError, ConfigError, DirectoryError, SinkError};
pub use model::{
    BatchSummary, DeviceRecord, ImportPayload, LogEntry, Outcome, OutcomeKind,
    RemoteDeviceState, ReportMeta, SessionReport,
};
pub use session::{Credentials, Session};
