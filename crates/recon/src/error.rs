use std::fmt;

/// Failure talking to the vendor's device directory or import API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The call did not complete within its timeout.
    Timeout(String),
    /// Connection refused, DNS failure, TLS error, etc.
    Transport(String),
    /// Unexpected HTTP status (lookup only; import returns status codes).
    Status(u16),
    /// Response body could not be read.
    Decode(String),
}

impl DirectoryError {
    /// True when no HTTP response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(msg) => write!(f, "timed out: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Status(code) => write!(f, "unexpected HTTP status {code}"),
            Self::Decode(msg) => write!(f, "cannot decode response: {msg}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Batch-level precondition failures. Nothing is dispatched when these occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// No records to process.
    EmptyInput,
    /// Token or operator identity missing from the credentials snapshot.
    MissingCredentials(String),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input contains no processable records"),
            Self::MissingCredentials(what) => write!(f, "missing credentials: {what}"),
        }
    }
}

impl std::error::Error for BatchError {}

/// Failure persisting log entries to an external sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    Io(String),
    Network(String),
    Rejected(u16),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Rejected(code) => write!(f, "sink rejected entries (HTTP {code})"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Configuration could not be read, parsed, or failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "cannot read config: {msg}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
