//! Batch coordinator: runs [`reconcile`] over every record with a bounded
//! pool of worker threads.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use chrono::Utc;
use tracing::{error, info};

use crate::config::PolicyConfig;
use crate::directory::DeviceDirectory;
use crate::engine::reconcile;
use crate::error::BatchError;
use crate::evidence::{compute_summary, log_entries};
use crate::model::{DeviceRecord, Outcome, OutcomeKind, ReportMeta, SessionReport};
use crate::session::Credentials;

/// Reconcile every record and aggregate the results.
///
/// Returns exactly one outcome per record, in completion order. Only the
/// preconditions (non-empty input, credentials present) can fail.
pub fn run_batch<D>(
    records: &[DeviceRecord],
    credentials: &Credentials,
    directory: &D,
    policy: &PolicyConfig,
) -> Result<SessionReport, BatchError>
where
    D: DeviceDirectory + ?Sized,
{
    run_batch_with_progress(records, credentials, directory, policy, |_, _, _| {})
}

/// Like [`run_batch`], calling `progress(outcome, done, total)` on the
/// calling thread as each record completes.
pub fn run_batch_with_progress<D, P>(
    records: &[DeviceRecord],
    credentials: &Credentials,
    directory: &D,
    policy: &PolicyConfig,
    mut progress: P,
) -> Result<SessionReport, BatchError>
where
    D: DeviceDirectory + ?Sized,
    P: FnMut(&Outcome, usize, usize),
{
    if records.is_empty() {
        return Err(BatchError::EmptyInput);
    }
    credentials.validate()?;

    let snapshot = credentials.clone();
    let total = records.len();
    let workers = policy.workers.clamp(1, total);
    let started_at = Utc::now();
    info!(records = total, workers, operator = %snapshot.operator, "batch started");

    let queue: Mutex<VecDeque<(usize, &DeviceRecord)>> =
        Mutex::new(records.iter().enumerate().collect());
    let mut seen = vec![false; total];
    let mut outcomes: Vec<Outcome> = Vec::with_capacity(total);

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, Outcome)>();

        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let creds = snapshot.clone();
            scope.spawn(move || loop {
                let next = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some((idx, record)) = next else {
                    break;
                };
                let outcome = reconcile_isolated(record, &creds, directory, policy);
                if tx.send((idx, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (idx, outcome) in rx {
            seen[idx] = true;
            progress(&outcome, outcomes.len() + 1, total);
            outcomes.push(outcome);
        }
    });

    // Every record ends with an outcome, even if its worker vanished.
    for (idx, record) in records.iter().enumerate() {
        if !seen[idx] {
            error!(imei = record.imei.trim(), "no outcome recorded for device");
            outcomes.push(Outcome::new(
                record,
                OutcomeKind::Error,
                "no outcome recorded",
                &policy.audit_note(&snapshot.operator),
            ));
        }
    }

    let summary = compute_summary(&outcomes);
    let log = log_entries(&outcomes);
    info!(
        total = summary.total,
        success = summary.success,
        warning = summary.warning,
        blocked = summary.blocked,
        failure = summary.failure,
        error = summary.error,
        "batch finished"
    );

    Ok(SessionReport {
        meta: ReportMeta {
            operator: snapshot.operator,
            workers,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            input_fingerprint: None,
        },
        summary,
        outcomes,
        log,
    })
}

/// Run one reconciliation, turning a panic in the directory into an
/// `Error` outcome for that record alone.
fn reconcile_isolated<D>(
    record: &DeviceRecord,
    credentials: &Credentials,
    directory: &D,
    policy: &PolicyConfig,
) -> Outcome
where
    D: DeviceDirectory + ?Sized,
{
    panic::catch_unwind(AssertUnwindSafe(|| reconcile(record, credentials, directory, policy)))
        .unwrap_or_else(|_| {
            error!(imei = record.imei.trim(), "reconciliation panicked");
            Outcome::new(
                record,
                OutcomeKind::Error,
                "internal error while processing device",
                &policy.audit_note(&credentials.operator),
            )
        })
}
