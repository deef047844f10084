//! Cobli fleet API client, shared by the CLI and anything else that runs
//! provisioning batches.
//!
//! This crate owns the vendor wire contract: authenticate, look up a
//! device's current fleet, import a device, and post execution logs.
//!
//! Blocking calls only. No retries. Every call has its own timeout.

mod auth;
mod client;
mod log_sink;

pub use auth::{
    delete_login, delete_login_at, load_login, load_login_from, login_file_path, save_login,
    save_login_to, SavedLogin,
};
pub use client::{extract_fleet_id, Timeouts, VendorClient, VendorError, DEFAULT_API_BASE};
pub use log_sink::HttpLogSink;
