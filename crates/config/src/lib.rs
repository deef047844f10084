// Configuration loading

pub mod settings;

pub use fleetload_recon::ConfigError;
pub use settings::{ApiSettings, InputSettings, LogSinkSettings, SessionSettings, Settings};
