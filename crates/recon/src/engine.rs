use tracing::{debug, warn};

use crate::config::{LookupFailurePolicy, PolicyConfig};
use crate::directory::DeviceDirectory;
use crate::error::DirectoryError;
use crate::model::{DeviceRecord, ImportPayload, Outcome, OutcomeKind};
use crate::policy::{decide, Decision};
use crate::session::Credentials;

pub const MSG_IMPORTED: &str = "associated successfully";
pub const MSG_ALREADY_IN_FLEET: &str = "already associated with requested fleet";
pub const MSG_CONFLICT: &str = "device already associated";
pub const MSG_INVALID_DATA: &str = "invalid data (check fleet ID or IMEI)";
pub const MSG_NO_RESPONSE: &str = "no response from server";

/// Reconcile one device: look up its current fleet, apply the assignment
/// policy, and import it when the policy allows.
///
/// Never fails: every path ends in an [`Outcome`].
pub fn reconcile<D>(
    record: &DeviceRecord,
    credentials: &Credentials,
    directory: &D,
    policy: &PolicyConfig,
) -> Outcome
where
    D: DeviceDirectory + ?Sized,
{
    let imei = record.imei.trim();
    let requested = record.requested_fleet_id.trim();
    let note = policy.audit_note(&credentials.operator);

    let current = match directory.lookup(imei, &credentials.token) {
        Ok(state) => state.map(|s| s.current_fleet_id),
        Err(err) => {
            warn!(imei, error = %err, policy = %policy.on_lookup_failure, "device lookup failed");
            match policy.on_lookup_failure {
                LookupFailurePolicy::Proceed => None,
                LookupFailurePolicy::Block => {
                    return Outcome::new(
                        record,
                        OutcomeKind::Blocked,
                        format!("could not verify current fleet: {err}"),
                        &note,
                    );
                }
            }
        }
    };

    match decide(current.as_deref(), requested, policy.unassigned_fleet_id.as_deref()) {
        Decision::AlreadyAssigned => {
            debug!(imei, fleet = requested, "already in requested fleet");
            return Outcome::new(record, OutcomeKind::Warning, MSG_ALREADY_IN_FLEET, &note);
        }
        Decision::Blocked { current_fleet_id } => {
            debug!(imei, current = %current_fleet_id, requested, "blocked by fleet policy");
            return Outcome::new(
                record,
                OutcomeKind::Blocked,
                format!("already associated with fleet {current_fleet_id}"),
                &note,
            );
        }
        Decision::Import => {}
    }

    let payload = ImportPayload::from_record(record, note.clone());
    let (kind, message) = match directory.import_device(&payload, &credentials.token) {
        Ok(status) | Err(DirectoryError::Status(status)) => classify_status(status),
        Err(err) => {
            warn!(imei, error = %err, "device import got no response");
            (OutcomeKind::Error, MSG_NO_RESPONSE.to_string())
        }
    };
    debug!(imei, result = %kind, "import finished");

    Outcome::new(record, kind, message, &note)
}

/// Map an import response status to an outcome.
pub fn classify_status(status: u16) -> (OutcomeKind, String) {
    match status {
        200..=299 => (OutcomeKind::Success, MSG_IMPORTED.to_string()),
        409 => (OutcomeKind::Warning, MSG_CONFLICT.to_string()),
        400 => (OutcomeKind::Failure { status }, MSG_INVALID_DATA.to_string()),
        _ => (
            OutcomeKind::Failure { status },
            format!("unexpected response ({status})"),
        ),
    }
}
