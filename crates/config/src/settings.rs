// Tool settings
// Loaded from --config, else ~/.config/fleetload/config.toml, else defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fleetload_recon::{ConfigError, PolicyConfig};
use serde::Deserialize;
use tracing::debug;

/// Longest allowed inactivity window (one week).
pub const MAX_INACTIVITY_MINS: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSettings {
    pub base_url: String,
    pub auth_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    pub import_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.cobli.co".to_string(),
            auth_timeout_secs: 10,
            lookup_timeout_secs: 10,
            import_timeout_secs: 15,
        }
    }
}

impl ApiSettings {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// A saved login unused for this long must sign in again.
    pub inactivity_timeout_mins: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { inactivity_timeout_mins: 30 }
    }
}

impl SessionSettings {
    pub fn inactivity(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.inactivity_timeout_mins.min(MAX_INACTIVITY_MINS) as i64)
    }
}

/// Where execution logs go besides the on-screen table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSinkSettings {
    /// Webhook receiving each batch's entries as a JSON array.
    pub url: Option<String>,
    /// Local CSV file appended after each batch.
    pub csv_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for LogSinkSettings {
    fn default() -> Self {
        Self { url: None, csv_path: None, timeout_secs: 10 }
    }
}

impl LogSinkSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSettings {
    /// Published spreadsheet CSV used by `--sheet`.
    pub sheet_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self { sheet_url: None, timeout_secs: 30 }
    }
}

impl InputSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub api: ApiSettings,
    pub policy: PolicyConfig,
    pub session: SessionSettings,
    pub log_sink: LogSinkSettings,
    pub input: InputSettings,
}

impl Settings {
    /// Default settings file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("fleetload").join("config.toml"))
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings. An explicit path must exist; the default path is
    /// optional and falls back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;

        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api.base_url must not be empty".into()));
        }

        for (name, secs) in [
            ("api.auth_timeout_secs", self.api.auth_timeout_secs),
            ("api.lookup_timeout_secs", self.api.lookup_timeout_secs),
            ("api.import_timeout_secs", self.api.import_timeout_secs),
            ("log_sink.timeout_secs", self.log_sink.timeout_secs),
            ("input.timeout_secs", self.input.timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Validation(format!("{name} must be greater than 0")));
            }
        }

        let mins = self.session.inactivity_timeout_mins;
        if mins == 0 || mins > MAX_INACTIVITY_MINS {
            return Err(ConfigError::Validation(format!(
                "session.inactivity_timeout_mins must be between 1 and {MAX_INACTIVITY_MINS}, got {mins}"
            )));
        }

        if matches!(self.log_sink.url.as_deref(), Some(u) if u.trim().is_empty()) {
            return Err(ConfigError::Validation("log_sink.url must not be empty when set".into()));
        }
        if matches!(&self.log_sink.csv_path, Some(p) if p.as_os_str().is_empty()) {
            return Err(ConfigError::Validation("log_sink.csv_path must not be empty when set".into()));
        }
        if matches!(self.input.sheet_url.as_deref(), Some(u) if u.trim().is_empty()) {
            return Err(ConfigError::Validation("input.sheet_url must not be empty when set".into()));
        }

        Ok(())
    }
}
