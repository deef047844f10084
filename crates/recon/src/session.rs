//! Operator session and the credentials snapshot handed to workers.

use chrono::{DateTime, Duration, Utc};

use crate::error::BatchError;
use crate::model::DeviceRecord;

/// Immutable snapshot of what workers need from the session. Captured once
/// before dispatch; later session changes do not reach in-flight work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub operator: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            operator: operator.into(),
        }
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.token.trim().is_empty() {
            return Err(BatchError::MissingCredentials("authentication token".into()));
        }
        if self.operator.trim().is_empty() {
            return Err(BatchError::MissingCredentials("operator identity".into()));
        }
        Ok(())
    }
}

/// A signed-in operator and the device queue loaded for the current run.
///
/// Expiry is checked by the caller with [`Session::is_expired`] before
/// invoking the engine; the engine itself only sees [`Credentials`].
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    operator: String,
    signed_in_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    records: Vec<DeviceRecord>,
}

impl Session {
    pub fn sign_in(token: impl Into<String>, operator: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::resume(token, operator, now, now)
    }

    /// Rebuild a session from a saved login.
    pub fn resume(
        token: impl Into<String>,
        operator: impl Into<String>,
        signed_in_at: DateTime<Utc>,
        last_activity: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            operator: operator.into(),
            signed_in_at,
            last_activity,
            records: Vec::new(),
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Replace the queued device table (a new sheet sync or upload).
    pub fn load_records(&mut self, records: Vec<DeviceRecord>, now: DateTime<Utc>) {
        self.records = records;
        self.touch(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// True once `inactivity` has passed since the last activity.
    pub fn is_expired(&self, now: DateTime<Utc>, inactivity: Duration) -> bool {
        now - self.last_activity >= inactivity
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.operator.clone())
    }

    /// End the session, dropping the token and queued records.
    pub fn sign_out(self) {}
}
