use tracing::{info, warn};

use crate::directory::LogSink;
use crate::error::SinkError;
use crate::model::{BatchSummary, LogEntry, Outcome, OutcomeKind};

/// Count outcomes per kind.
pub fn compute_summary(outcomes: &[Outcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: outcomes.len(),
        ..BatchSummary::default()
    };

    for o in outcomes {
        match o.kind {
            OutcomeKind::Success => summary.success += 1,
            OutcomeKind::Warning => summary.warning += 1,
            OutcomeKind::Blocked => summary.blocked += 1,
            OutcomeKind::Failure { .. } => summary.failure += 1,
            OutcomeKind::Error => summary.error += 1,
        }
    }

    summary
}

/// One log entry per outcome, same order.
pub fn log_entries(outcomes: &[Outcome]) -> Vec<LogEntry> {
    outcomes.iter().map(LogEntry::from).collect()
}

/// A sink that could not persist the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub sink: String,
    pub error: SinkError,
}

/// Append entries to every sink. Failures are collected and returned,
/// never propagated: the session report stays valid either way.
pub fn deliver_logs(entries: &[LogEntry], sinks: &[&dyn LogSink]) -> Vec<SinkFailure> {
    let mut failures = Vec::new();
    if entries.is_empty() {
        return failures;
    }

    for sink in sinks {
        match sink.append(entries) {
            Ok(()) => info!(sink = sink.name(), entries = entries.len(), "log entries persisted"),
            Err(error) => {
                warn!(sink = sink.name(), %error, "log sink failed");
                failures.push(SinkFailure {
                    sink: sink.name().to_string(),
                    error,
                });
            }
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use std::cell::RefCell;

    fn outcome(row: usize, kind: OutcomeKind) -> Outcome {
        Outcome::new(&record(row, &format!("imei{row}"), "F1"), kind, "m", "n")
    }

    #[test]
    fn summary_counts() {
        let outcomes = vec![
            outcome(0, OutcomeKind::Success),
            outcome(1, OutcomeKind::Success),
            outcome(2, OutcomeKind::Warning),
            outcome(3, OutcomeKind::Blocked),
            outcome(4, OutcomeKind::Failure { status: 400 }),
            outcome(5, OutcomeKind::Failure { status: 500 }),
            outcome(6, OutcomeKind::Error),
        ];
        let summary = compute_summary(&outcomes);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.failure, 2);
        assert_eq!(summary.error, 1);
        assert!(!summary.is_clean());
    }

    struct RecordingSink {
        received: RefCell<usize>,
        fail: bool,
    }

    impl LogSink for RecordingSink {
        fn name(&self) -> &str {
            if self.fail { "broken" } else { "memory" }
        }

        fn append(&self, entries: &[LogEntry]) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Rejected(500));
            }
            *self.received.borrow_mut() += entries.len();
            Ok(())
        }
    }

    #[test]
    fn failing_sink_does_not_stop_others() {
        let broken = RecordingSink { received: RefCell::new(0), fail: true };
        let memory = RecordingSink { received: RefCell::new(0), fail: false };
        let entries = log_entries(&[outcome(0, OutcomeKind::Success), outcome(1, OutcomeKind::Error)]);

        let failures = deliver_logs(&entries, &[&broken, &memory]);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].sink, "broken");
        assert_eq!(failures[0].error, SinkError::Rejected(500));
        assert_eq!(*memory.received.borrow(), 2);
    }

    #[test]
    fn nothing_delivered_for_empty_log() {
        let broken = RecordingSink { received: RefCell::new(0), fail: true };
        assert!(deliver_logs(&[], &[&broken]).is_empty());
    }
}
