use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_WORKERS: usize = 5;
pub const MAX_WORKERS: usize = 32;
pub const DEFAULT_TOOL_NAME: &str = "fleetload";

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Reconciliation policy: how devices are judged and how many are
/// processed at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Fleet that holds devices not yet assigned to a real customer fleet.
    /// Devices found here may be imported into any fleet.
    pub unassigned_fleet_id: Option<String>,
    /// What to do when the current-fleet lookup fails.
    pub on_lookup_failure: LookupFailurePolicy,
    /// Concurrent in-flight reconciliations.
    pub workers: usize,
    /// Tool name written into every audit note.
    pub tool_name: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            unassigned_fleet_id: None,
            on_lookup_failure: LookupFailurePolicy::default(),
            workers: DEFAULT_WORKERS,
            tool_name: DEFAULT_TOOL_NAME.to_string(),
        }
    }
}

/// Lookup failure handling.
///
/// `Proceed` treats the device as unknown and imports it; the import is
/// idempotent at the vendor, a conflict comes back as 409.
/// `Block` refuses to touch a device whose current fleet cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    #[default]
    Proceed,
    Block,
}

impl std::fmt::Display for LookupFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Block => write!(f, "block"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PolicyConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: PolicyConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::Validation(format!(
                "workers must be between 1 and {MAX_WORKERS}, got {}",
                self.workers
            )));
        }

        if self.tool_name.trim().is_empty() {
            return Err(ConfigError::Validation("tool_name must not be empty".into()));
        }

        if let Some(ref pool) = self.unassigned_fleet_id {
            if crate::normalize::canonical_fleet_id(pool).is_empty() {
                return Err(ConfigError::Validation(format!(
                    "unassigned_fleet_id '{pool}' has no alphanumeric characters"
                )));
            }
        }

        Ok(())
    }

    /// Audit note attached to every import call.
    pub fn audit_note(&self, operator: &str) -> String {
        format!("{} - operator: {}", self.tool_name.trim(), operator.trim())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
