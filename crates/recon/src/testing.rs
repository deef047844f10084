//! In-memory directory used by the engine and batch unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::directory::DeviceDirectory;
use crate::error::DirectoryError;
use crate::model::{DeviceRecord, ImportPayload, RemoteDeviceState};

pub const POOL: &str = "00000000-0000-0000-0000-000000000000";

pub fn record(row: usize, imei: &str, fleet: &str) -> DeviceRecord {
    DeviceRecord {
        row,
        external_id: format!("ext-{row}"),
        imei: imei.into(),
        cobli_id: format!("CB{row}"),
        device_type: "tracker".into(),
        icc_id: "89550000000000000000".into(),
        chip_number: "11999990000".into(),
        chip_operator: "vivo".into(),
        requested_fleet_id: fleet.into(),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LookupReply {
    Timeout,
    Status(u16),
    Panic,
}

#[derive(Debug, Clone, Copy)]
enum ImportMode {
    Status(u16),
    Unreachable,
    Panic,
}

#[derive(Default)]
struct State {
    fleets: HashMap<String, String>,
    imported: Vec<ImportPayload>,
    tokens: Vec<String>,
}

pub struct FakeDirectory {
    lookups: HashMap<String, LookupReply>,
    fail_all_lookups: bool,
    import_mode: ImportMode,
    state: Mutex<State>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            lookups: HashMap::new(),
            fail_all_lookups: false,
            import_mode: ImportMode::Status(201),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_fleet(self, imei: &str, fleet: &str) -> Self {
        self.state.lock().unwrap().fleets.insert(imei.into(), fleet.into());
        self
    }

    pub fn with_lookup(mut self, imei: &str, reply: LookupReply) -> Self {
        self.lookups.insert(imei.into(), reply);
        self
    }

    pub fn with_all_lookups_failing(mut self) -> Self {
        self.fail_all_lookups = true;
        self
    }

    pub fn with_import_status(mut self, status: u16) -> Self {
        self.import_mode = ImportMode::Status(status);
        self
    }

    pub fn with_import_unreachable(mut self) -> Self {
        self.import_mode = ImportMode::Unreachable;
        self
    }

    pub fn with_import_panic(mut self) -> Self {
        self.import_mode = ImportMode::Panic;
        self
    }

    pub fn import_calls(&self) -> usize {
        self.state.lock().unwrap().imported.len()
    }

    pub fn imported(&self) -> Vec<ImportPayload> {
        self.state.lock().unwrap().imported.clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }
}

impl DeviceDirectory for FakeDirectory {
    fn lookup(&self, imei: &str, token: &str) -> Result<Option<RemoteDeviceState>, DirectoryError> {
        self.state.lock().unwrap().tokens.push(token.to_string());
        if self.fail_all_lookups {
            return Err(DirectoryError::Timeout("lookup".into()));
        }
        match self.lookups.get(imei) {
            Some(LookupReply::Timeout) => return Err(DirectoryError::Timeout("lookup".into())),
            Some(LookupReply::Status(code)) => return Err(DirectoryError::Status(*code)),
            Some(LookupReply::Panic) => panic!("lookup exploded for {imei}"),
            None => {}
        }
        let state = self.state.lock().unwrap();
        Ok(state.fleets.get(imei).map(|fleet| RemoteDeviceState {
            current_fleet_id: fleet.clone(),
        }))
    }

    fn import_device(&self, payload: &ImportPayload, token: &str) -> Result<u16, DirectoryError> {
        let mut state = self.state.lock().unwrap();
        state.tokens.push(token.to_string());
        match self.import_mode {
            ImportMode::Unreachable => Err(DirectoryError::Transport("connection refused".into())),
            ImportMode::Panic => {
                drop(state);
                panic!("import exploded for {}", payload.imei)
            }
            ImportMode::Status(status) => {
                state.imported.push(payload.clone());
                if (200..300).contains(&status) {
                    state.fleets.insert(payload.imei.clone(), payload.fleet_id.clone());
                }
                Ok(status)
            }
        }
    }
}
