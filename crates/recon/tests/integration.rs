use std::collections::HashMap;
use std::sync::Mutex;

use fleetload_recon::{
    reconcile, run_batch, Credentials, DeviceDirectory, DeviceRecord, DirectoryError,
    ImportPayload, LookupFailurePolicy, OutcomeKind, PolicyConfig, RemoteDeviceState, Session,
};

const POOL: &str = "00000000-0000-0000-0000-000000000000";

/// Vendor stand-in: lookups read the fleet map, 2xx imports write it.
struct Vendor {
    fleets: Mutex<HashMap<String, String>>,
    import_status: u16,
    imports: Mutex<Vec<ImportPayload>>,
    lookups_fail: bool,
}

impl Vendor {
    fn new() -> Self {
        Self {
            fleets: Mutex::new(HashMap::new()),
            import_status: 201,
            imports: Mutex::new(Vec::new()),
            lookups_fail: false,
        }
    }

    fn assign(self, imei: &str, fleet: &str) -> Self {
        self.fleets.lock().unwrap().insert(imei.into(), fleet.into());
        self
    }

    fn import_count(&self) -> usize {
        self.imports.lock().unwrap().len()
    }
}

impl DeviceDirectory for Vendor {
    fn lookup(&self, imei: &str, _token: &str) -> Result<Option<RemoteDeviceState>, DirectoryError> {
        if self.lookups_fail {
            return Err(DirectoryError::Timeout("lookup after 10s".into()));
        }
        Ok(self.fleets.lock().unwrap().get(imei).map(|f| RemoteDeviceState {
            current_fleet_id: f.clone(),
        }))
    }

    fn import_device(&self, payload: &ImportPayload, _token: &str) -> Result<u16, DirectoryError> {
        self.imports.lock().unwrap().push(payload.clone());
        if (200..300).contains(&self.import_status) {
            self.fleets
                .lock()
                .unwrap()
                .insert(payload.imei.clone(), payload.fleet_id.clone());
        }
        Ok(self.import_status)
    }
}

fn device(row: usize, imei: &str, fleet: &str) -> DeviceRecord {
    DeviceRecord {
        row,
        external_id: format!("D-{row}"),
        imei: imei.into(),
        cobli_id: format!("CB-{row}"),
        device_type: "tracker".into(),
        icc_id: "8955".into(),
        chip_number: "11999990000".into(),
        chip_operator: "claro".into(),
        requested_fleet_id: fleet.into(),
    }
}

fn policy() -> PolicyConfig {
    PolicyConfig {
        unassigned_fleet_id: Some(POOL.into()),
        ..PolicyConfig::default()
    }
}

fn creds() -> Credentials {
    Credentials::new("token-abc", "ana@example.com")
}

#[test]
fn provisioning_scenario() {
    let vendor = Vendor::new().assign("456", "F9").assign("789", POOL);

    let first = device(0, "123", "F1");
    let outcome = reconcile(&first, &creds(), &vendor, &policy());
    assert_eq!(outcome.kind, OutcomeKind::Success);

    let outcome = reconcile(&first, &creds(), &vendor, &policy());
    assert_eq!(outcome.kind, OutcomeKind::Warning);

    let outcome = reconcile(&device(1, "456", "F2"), &creds(), &vendor, &policy());
    assert_eq!(outcome.kind, OutcomeKind::Blocked);

    let outcome = reconcile(&device(2, "789", "F3"), &creds(), &vendor, &policy());
    assert_eq!(outcome.kind, OutcomeKind::Success);

    assert_eq!(vendor.import_count(), 2);
    let imports = vendor.imports.lock().unwrap();
    assert!(imports
        .iter()
        .all(|p| p.note == "fleetload - operator: ana@example.com"));
}

#[test]
fn batch_over_mixed_devices() {
    let vendor = Vendor::new()
        .assign("100", "acme-01")
        .assign("200", "F9")
        .assign("300", POOL);
    let records = vec![
        device(0, "100", "ACME 01"),
        device(1, "200", "F1"),
        device(2, "300", "F1"),
        device(3, "400", "F1"),
    ];

    let report = run_batch(&records, &creds(), &vendor, &policy()).unwrap();
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.warning, 1);
    assert_eq!(report.summary.blocked, 1);
    assert_eq!(report.summary.success, 2);
    assert!(!report.summary.is_clean());
    assert_eq!(report.meta.operator, "ana@example.com");

    let kinds: Vec<OutcomeKind> = report.in_input_order().iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            OutcomeKind::Warning,
            OutcomeKind::Blocked,
            OutcomeKind::Success,
            OutcomeKind::Success
        ]
    );

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["total"], 4);
    assert_eq!(json["outcomes"].as_array().unwrap().len(), 4);
}

#[test]
fn fail_closed_policy_blocks_unverifiable_devices() {
    let mut vendor = Vendor::new();
    vendor.lookups_fail = true;
    let policy = PolicyConfig {
        on_lookup_failure: LookupFailurePolicy::Block,
        ..policy()
    };
    let records: Vec<_> = (0..8).map(|i| device(i, &format!("9{i}"), "F1")).collect();

    let report = run_batch(&records, &creds(), &vendor, &policy).unwrap();
    assert_eq!(report.summary.blocked, 8);
    assert_eq!(vendor.import_count(), 0);
}

#[test]
fn rejected_import_carries_status() {
    let mut vendor = Vendor::new();
    vendor.import_status = 400;
    let report = run_batch(&[device(0, "123", "bad")], &creds(), &vendor, &policy()).unwrap();
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.kind, OutcomeKind::Failure { status: 400 });
    assert_eq!(report.log[0].status, Some(400));
    assert_eq!(report.log[0].result, "failure");
}

#[test]
fn session_feeds_batch() {
    let now = chrono::Utc::now();
    let mut session = Session::sign_in("token-abc", "ana@example.com", now);
    session.load_records(vec![device(0, "123", "F1")], now);
    assert!(!session.is_expired(now, chrono::Duration::minutes(30)));

    let vendor = Vendor::new();
    let report = run_batch(session.records(), &session.credentials(), &vendor, &policy()).unwrap();
    assert_eq!(report.summary.success, 1);
}
