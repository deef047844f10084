//! Saved login.
//!
//! Reads/writes ~/.config/fleetload/login.json (0600 on Unix) so that
//! `fleetload run` can reuse the token from `fleetload login` until the
//! inactivity window lapses.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fleetload_recon::Session;
use serde::{Deserialize, Serialize};

use crate::client::VendorError;

/// Token and identity persisted between CLI invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLogin {
    /// Bearer token from the authentication service
    pub token: String,
    /// API base the token was issued by
    pub api_base: String,
    /// Operator email, used in audit notes
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl SavedLogin {
    pub fn new(token: String, api_base: String, email: String, now: DateTime<Utc>) -> Self {
        Self { token, api_base, email, signed_in_at: now, last_used_at: now }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, inactivity: Duration) -> bool {
        self.to_session().is_expired(now, inactivity)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_used_at {
            self.last_used_at = now;
        }
    }

    pub fn to_session(&self) -> Session {
        Session::resume(self.token.clone(), self.email.clone(), self.signed_in_at, self.last_used_at)
    }
}

/// Returns the path to the saved login file.
pub fn login_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("fleetload/login.json"))
}

/// Load the saved login. Returns None if there is none or it is unreadable.
pub fn load_login() -> Option<SavedLogin> {
    load_login_from(&login_file_path()?)
}

pub fn load_login_from(path: &Path) -> Option<SavedLogin> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save the login, creating the config directory if needed.
pub fn save_login(login: &SavedLogin) -> Result<(), VendorError> {
    let path = login_file_path()
        .ok_or_else(|| VendorError::Io("Could not determine config directory".into()))?;
    save_login_to(&path, login)
}

pub fn save_login_to(path: &Path, login: &SavedLogin) -> Result<(), VendorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| VendorError::Io(format!("Failed to create config directory: {}", e)))?;
    }

    let contents = serde_json::to_string_pretty(login)
        .map_err(|e| VendorError::Io(format!("Failed to serialize login: {}", e)))?;

    std::fs::write(path, contents)
        .map_err(|e| VendorError::Io(format!("Failed to write login file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| VendorError::Io(format!("Failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

/// Delete the saved login. Returns whether a file was removed.
pub fn delete_login() -> Result<bool, VendorError> {
    match login_file_path() {
        Some(path) => delete_login_at(&path),
        None => Ok(false),
    }
}

pub fn delete_login_at(path: &Path) -> Result<bool, VendorError> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .map_err(|e| VendorError::Io(format!("Failed to delete login file: {}", e)))?;
    Ok(true)
}
