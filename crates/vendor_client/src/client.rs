//! Cobli HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Shared across the
//! batch worker threads; each request carries its own timeout.

use std::time::Duration;

use fleetload_recon::{DeviceDirectory, DirectoryError, ImportPayload, RemoteDeviceState};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.cobli.co";

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub auth: Duration,
    pub lookup: Duration,
    pub import: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            auth: Duration::from_secs(10),
            lookup: Duration::from_secs(10),
            import: Duration::from_secs(15),
        }
    }
}

/// Error type for vendor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorError {
    /// Authentication service answered with something other than 200
    AuthRejected(u16),
    /// Connection, DNS or TLS failure
    Network(String),
    /// Call exceeded its timeout
    Timeout(String),
    /// Response body was not what we expected
    Parse(String),
    /// Unexpected HTTP status
    Http(u16, String),
    /// Local file I/O (saved login)
    Io(String),
}

impl std::fmt::Display for VendorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VendorError::AuthRejected(code) => write!(f, "Authentication failed (HTTP {})", code),
            VendorError::Network(msg) => write!(f, "Network error: {}", msg),
            VendorError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            VendorError::Parse(msg) => write!(f, "Parse error: {}", msg),
            VendorError::Http(code, msg) if msg.is_empty() => write!(f, "HTTP {}", code),
            VendorError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            VendorError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for VendorError {}

impl From<VendorError> for DirectoryError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::Timeout(msg) => DirectoryError::Timeout(msg),
            VendorError::Network(msg) | VendorError::Io(msg) => DirectoryError::Transport(msg),
            VendorError::Http(code, _) | VendorError::AuthRejected(code) => DirectoryError::Status(code),
            VendorError::Parse(msg) => DirectoryError::Decode(msg),
        }
    }
}

/// Cobli API client (blocking).
#[derive(Clone)]
pub struct VendorClient {
    http: reqwest::blocking::Client,
    api_base: String,
    timeouts: Timeouts,
}

impl VendorClient {
    pub fn new(api_base: &str, timeouts: Timeouts) -> Result<Self, VendorError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("fleetload/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VendorError::Network(format!("cannot create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Exchange email and password for a bearer token.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<String, VendorError> {
        let url = format!("{}/herbie-1.1/account/authenticate", self.api_base);
        let response = self.http.post(&url)
            .timeout(self.timeouts.auth)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(|e| transport_error(&e, "authentication", self.timeouts.auth))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "authentication rejected");
            return Err(VendorError::AuthRejected(status));
        }

        let json: Value = response.json().map_err(|e| VendorError::Parse(e.to_string()))?;
        match json.get("authentication_token").and_then(Value::as_str) {
            Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
            _ => Err(VendorError::Parse("Missing authentication_token in response".into())),
        }
    }

    /// Current fleet of a device. `None` when the device is unknown or has
    /// no readable fleet.
    pub fn lookup_device(&self, imei: &str, token: &str) -> Result<Option<RemoteDeviceState>, VendorError> {
        let url = format!("{}/v1/devices", self.api_base);
        let response = self.http.get(&url)
            .query(&[("imei", imei)])
            .bearer_auth(token)
            .timeout(self.timeouts.lookup)
            .send()
            .map_err(|e| transport_error(&e, "device lookup", self.timeouts.lookup))?;

        let status = response.status().as_u16();
        if status == 404 {
            debug!(imei, "device not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VendorError::Http(status, body));
        }

        let body = response.text()
            .map_err(|e| transport_error(&e, "device lookup", self.timeouts.lookup))?;
        let json: Value = match serde_json::from_str(&body) {
            Ok(json) => json,
            Err(e) => {
                debug!(imei, error = %e, "unreadable lookup body, treating as unassigned");
                return Ok(None);
            }
        };

        let state = extract_fleet_id(&json, imei).map(|current_fleet_id| RemoteDeviceState { current_fleet_id });
        debug!(imei, fleet = ?state.as_ref().map(|s| &s.current_fleet_id), "device lookup");
        Ok(state)
    }

    /// Submit one device to the import endpoint. Any HTTP response is
    /// returned as its status code; only transport failures are errors.
    pub fn post_import(&self, payload: &ImportPayload, token: &str) -> Result<u16, VendorError> {
        let url = format!("{}/v1/devices-import", self.api_base);
        let response = self.http.post(&url)
            .bearer_auth(token)
            .timeout(self.timeouts.import)
            .json(std::slice::from_ref(payload))
            .send()
            .map_err(|e| transport_error(&e, "device import", self.timeouts.import))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            debug!(imei = %payload.imei, status, body = %body, "import rejected");
        }
        Ok(status)
    }
}

impl DeviceDirectory for VendorClient {
    fn lookup(&self, imei: &str, token: &str) -> Result<Option<RemoteDeviceState>, DirectoryError> {
        Ok(self.lookup_device(imei, token)?)
    }

    fn import_device(&self, payload: &ImportPayload, token: &str) -> Result<u16, DirectoryError> {
        Ok(self.post_import(payload, token)?)
    }
}

/// Pull the fleet ID for `imei` out of a lookup body.
///
/// Accepts a device object, an array of devices, or either wrapped in
/// `data`. Only a device whose `imei` equals the one asked for counts; a
/// device without an `imei` field is taken as the filtered answer. The ID
/// is read from `fleet_id`, then `fleet.id`, skipping null or blank values.
pub fn extract_fleet_id(body: &Value, imei: &str) -> Option<String> {
    let device = match body {
        Value::Array(items) => find_device(items, imei)?,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => find_device(items, imei)?,
            Some(inner @ Value::Object(_)) => inner,
            _ => body,
        },
        _ => return None,
    };
    if !is_device(device, imei) {
        return None;
    }

    fleet_text(device.get("fleet_id"))
        .or_else(|| fleet_text(device.get("fleet").and_then(|f| f.get("id"))))
}

fn find_device<'a>(items: &'a [Value], imei: &str) -> Option<&'a Value> {
    items.iter().find(|item| is_device(item, imei))
}

fn is_device(device: &Value, imei: &str) -> bool {
    match device.get("imei") {
        None | Some(Value::Null) => true,
        Some(other) => value_text(other).is_some_and(|found| found == imei.trim()),
    }
}

fn fleet_text(value: Option<&Value>) -> Option<String> {
    value.and_then(value_text).filter(|id| !id.is_empty())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn transport_error(err: &reqwest::Error, what: &str, limit: Duration) -> VendorError {
    if err.is_timeout() {
        VendorError::Timeout(format!("{} did not answer within {}s", what, limit.as_secs_f32()))
    } else {
        VendorError::Network(err.to_string())
    }
}
