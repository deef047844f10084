//! `fleetload check` and `fleetload run`.

use std::path::PathBuf;

use fleetload_config::Settings;
use fleetload_io::csv::CsvLogSink;
use fleetload_io::{InputBatch, RejectedRow};
use fleetload_recon::evidence::deliver_logs;
use fleetload_recon::{
    run_batch_with_progress, BatchError, LogSink, OutcomeKind, SessionReport,
};
use fleetload_vendor_client::HttpLogSink;
use serde::Serialize;
use tracing::info;

use crate::exit_codes::*;
use crate::login::{resolve_run_login, touch_saved_login, vendor_client};
use crate::util::{pad_right, plural};
use crate::CliError;

pub struct RunArgs {
    pub input: Option<PathBuf>,
    pub sheet: bool,
    pub email: Option<String>,
    pub password: Option<String>,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub log_csv: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Serialize)]
struct RejectedJson<'a> {
    row: usize,
    reason: &'a str,
}

fn rejected_json(rows: &[RejectedRow]) -> Vec<RejectedJson<'_>> {
    rows.iter().map(|r| RejectedJson { row: r.row, reason: &r.reason }).collect()
}

// ── Check ───────────────────────────────────────────────────────────

pub fn cmd_check(settings: &Settings, input: Option<PathBuf>, sheet: bool, json: bool) -> Result<(), CliError> {
    let batch = load_source(settings, input, sheet)?;

    if json {
        let value = serde_json::json!({
            "fingerprint": batch.fingerprint,
            "queued": batch.records.len(),
            "rejected": rejected_json(&batch.rejected),
            "records": batch.records,
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        print_queue(&batch);
        eprintln!();
        eprintln!("{}  {}  {}", pad_right("row", 5), pad_right("imei", 17), "fleet_id");
        for r in &batch.records {
            eprintln!(
                "{}  {}  {}",
                pad_right(&r.row.to_string(), 5),
                pad_right(&r.imei, 17),
                r.requested_fleet_id
            );
        }
        eprintln!();
        eprintln!("fingerprint: {}", batch.fingerprint);
    }

    if batch.records.is_empty() {
        return Err(CliError::new(EXIT_INPUT, "No processable rows"));
    }
    if !batch.rejected.is_empty() {
        return Err(CliError::new(
            EXIT_INPUT,
            format!("{} rejected", plural(batch.rejected.len(), "row")),
        )
        .with_hint("every row needs an imei and a fleet_id"));
    }
    Ok(())
}

// ── Run ─────────────────────────────────────────────────────────────

pub fn cmd_run(settings: &Settings, args: RunArgs) -> Result<(), CliError> {
    let batch = load_source(settings, args.input, args.sheet)?;
    if !args.quiet || !batch.rejected.is_empty() {
        print_queue(&batch);
    }
    if batch.records.is_empty() {
        return Err(CliError::new(EXIT_INPUT, BatchError::EmptyInput.to_string()));
    }

    let client = vendor_client(settings)?;
    let mut login = resolve_run_login(settings, &client, args.email, args.password)?;
    login.session.load_records(batch.records, chrono::Utc::now());
    let credentials = login.session.credentials();

    let show_progress = !args.quiet && !args.json;
    let mut report = run_batch_with_progress(
        login.session.records(),
        &credentials,
        &client,
        &settings.policy,
        |outcome, done, total| {
            if show_progress {
                eprintln!("[{done}/{total}] {} {}", outcome.imei, outcome.kind);
            }
        },
    )
    .map_err(batch_error)?;
    report.meta.input_fingerprint = Some(batch.fingerprint);

    if let Some(saved) = login.saved.as_mut() {
        touch_saved_login(saved);
    }

    let log = report.log_in_input_order();
    let sinks = configured_sinks(settings);
    let sink_refs: Vec<&dyn LogSink> = sinks.iter().map(|s| s.as_ref()).collect();
    for failure in deliver_logs(&log, &sink_refs) {
        eprintln!("warning: log sink '{}' failed: {}", failure.sink, failure.error);
    }

    // Exports come after the vendor calls; a failed write must not hide the results
    let report_json = report_value(&report, &batch.rejected);
    let mut export_errors = Vec::new();
    if let Some(path) = &args.log_csv {
        if let Err(e) = fleetload_io::csv::write_log(path, &log) {
            export_errors.push(format!("cannot write {}: {}", path.display(), e));
        }
    }
    if let Some(path) = &args.output {
        let written = serde_json::to_string_pretty(&report_json)
            .map_err(|e| e.to_string())
            .and_then(|text| std::fs::write(path, text).map_err(|e| e.to_string()));
        if let Err(e) = written {
            export_errors.push(format!("cannot write {}: {}", path.display(), e));
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json).unwrap_or_default());
    } else {
        if !args.quiet {
            print_outcomes(&report);
        }
        print_summary(&report);
    }

    info!(operator = %report.meta.operator, total = report.summary.total, "run finished");

    if !export_errors.is_empty() {
        return Err(CliError::io(export_errors.join("; "))
            .with_hint("devices were already provisioned; the report was printed above"));
    }

    let s = &report.summary;
    if s.is_clean() {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_BATCH_INCOMPLETE,
            format!(
                "{} not provisioned ({} blocked, {} failed, {} errored)",
                plural(s.blocked + s.failure + s.error, "device"),
                s.blocked,
                s.failure,
                s.error
            ),
        ))
    }
}

// ── Internal helpers ────────────────────────────────────────────────

fn load_source(settings: &Settings, input: Option<PathBuf>, sheet: bool) -> Result<InputBatch, CliError> {
    match (input, sheet) {
        (Some(path), false) => fleetload_io::load_input(&path).map_err(CliError::input),
        (None, true) => {
            let url = settings.input.sheet_url.as_deref().ok_or_else(|| {
                CliError::usage("--sheet needs a published sheet URL")
                    .with_hint("set sheet_url under [input] in the config file")
            })?;
            fleetload_io::sheet::fetch(url, settings.input.timeout()).map_err(CliError::input)
        }
        _ => Err(CliError::usage("pass either an input file or --sheet")),
    }
}

fn configured_sinks(settings: &Settings) -> Vec<Box<dyn LogSink>> {
    let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
    if let Some(url) = &settings.log_sink.url {
        match HttpLogSink::new(url, settings.log_sink.timeout()) {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => eprintln!("warning: log webhook disabled: {}", e),
        }
    }
    if let Some(path) = &settings.log_sink.csv_path {
        sinks.push(Box::new(CsvLogSink::new(path)));
    }
    sinks
}

fn batch_error(err: BatchError) -> CliError {
    match err {
        BatchError::EmptyInput => CliError::new(EXIT_INPUT, err.to_string()),
        BatchError::MissingCredentials(_) => CliError::new(EXIT_NOT_AUTHENTICATED, err.to_string())
            .with_hint("run `fleetload login` again"),
    }
}

fn report_value(report: &SessionReport, rejected: &[RejectedRow]) -> serde_json::Value {
    let mut value = serde_json::to_value(report).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.insert("rejected".into(), serde_json::json!(rejected_json(rejected)));
    }
    value
}

fn print_queue(batch: &InputBatch) {
    eprintln!("Queue: {}", plural(batch.records.len(), "device"));
    if !batch.rejected.is_empty() {
        eprintln!("Rejected: {}", plural(batch.rejected.len(), "row"));
        for r in &batch.rejected {
            eprintln!("  row {}: {}", r.row, r.reason);
        }
    }
}

fn print_outcomes(report: &SessionReport) {
    eprintln!();
    eprintln!(
        "{}  {}  {}  {}",
        pad_right("row", 5),
        pad_right("imei", 17),
        pad_right("result", 14),
        "message"
    );
    for o in report.in_input_order() {
        eprintln!(
            "{}  {}  {}  {}",
            pad_right(&o.row.to_string(), 5),
            pad_right(&o.imei, 17),
            pad_right(&o.kind.to_string(), 14),
            pad_right(&o.message, 60).trim_end()
        );
    }
}

fn print_summary(report: &SessionReport) {
    let s = &report.summary;
    eprintln!();
    eprintln!(
        "Processed {}: {} success, {} warning, {} blocked, {} failure, {} error",
        plural(s.total, "device"),
        s.success,
        s.warning,
        s.blocked,
        s.failure,
        s.error
    );
    let first_blocked = report.in_input_order().into_iter().find(|o| o.kind == OutcomeKind::Blocked);
    if let Some(o) = first_blocked {
        eprintln!("note: blocked devices stay in their current fleet (e.g. row {}: {})", o.row, o.message);
    }
}
