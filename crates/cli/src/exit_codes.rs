//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts match on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 60-69   | provisioning     | Auth, input, batch, config, output       |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success. For `run`: every device ended in success or warning.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Provisioning (60-69)
// =============================================================================

/// No saved login, or it expired from inactivity.
pub const EXIT_NOT_AUTHENTICATED: u8 = 60;

/// The authentication service refused the credentials or could not be reached.
pub const EXIT_AUTH_REJECTED: u8 = 61;

/// Input table missing, unreadable, malformed, or without processable rows.
/// For `check`: at least one row was rejected.
pub const EXIT_INPUT: u8 = 62;

/// Batch finished but some devices were blocked, failed, or errored.
pub const EXIT_BATCH_INCOMPLETE: u8 = 63;

/// Settings file unreadable or invalid.
pub const EXIT_CONFIG: u8 = 64;

/// Could not write the report, log CSV, or saved login.
pub const EXIT_IO: u8 = 65;
