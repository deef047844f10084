// fleetload CLI - bulk device provisioning against the Cobli fleet API

mod exit_codes;
mod login;
mod provision;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use fleetload_config::{ConfigError, Settings};
use fleetload_io::InputError;

use exit_codes::{EXIT_CONFIG, EXIT_INPUT, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FLEETLOAD_COMMIT"),
    " ",
    env!("FLEETLOAD_TARGET"),
    ")"
);

#[derive(Parser)]
#[command(name = "fleetload")]
#[command(about = "Bulk device provisioning for Cobli fleets")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Settings file (default: ~/.config/fleetload/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the token for later runs
    #[command(after_help = "\
Examples:
  fleetload login --email ana@example.com
  FLEETLOAD_PASSWORD=... fleetload login --email ana@example.com")]
    Login {
        /// Operator email (also written into every audit note)
        #[arg(long)]
        email: String,

        /// Password (prompted when omitted and stdin is a terminal)
        #[arg(long, env = "FLEETLOAD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Delete the saved login
    Logout,

    /// Show the saved login and whether it is still active
    Whoami {
        /// Machine-readable output on stdout
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a device table without calling the vendor
    #[command(after_help = "\
Examples:
  fleetload check devices.csv
  fleetload check --sheet --json")]
    Check {
        /// CSV or workbook (xlsx, xls, xlsb, ods)
        #[arg(required_unless_present = "sheet", conflicts_with = "sheet")]
        input: Option<PathBuf>,

        /// Use the published sheet from [input] sheet_url
        #[arg(long)]
        sheet: bool,

        /// Machine-readable output on stdout
        #[arg(long)]
        json: bool,
    },

    /// Provision every device in the table
    #[command(after_help = "\
Examples:
  fleetload run devices.xlsx
  fleetload run --sheet --log-csv log_cobli.csv
  fleetload run devices.csv --email ana@example.com --json > report.json

Exit codes:
  0   every device associated (or already in its fleet)
  63  some devices were blocked, failed, or errored")]
    Run {
        /// CSV or workbook (xlsx, xls, xlsb, ods)
        #[arg(required_unless_present = "sheet", conflicts_with = "sheet")]
        input: Option<PathBuf>,

        /// Use the published sheet from [input] sheet_url
        #[arg(long)]
        sheet: bool,

        /// Sign in for this run only instead of using the saved login
        #[arg(long)]
        email: Option<String>,

        /// Password for --email
        #[arg(long, env = "FLEETLOAD_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Print the session report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the session report as JSON to this file
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Write the execution log CSV to this file
        #[arg(long, value_name = "PATH")]
        log_csv: Option<PathBuf>,

        /// No progress lines or per-device table
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_settings(cli.config.as_deref()).and_then(|settings| match cli.command {
        Commands::Login { email, password } => login::cmd_login(&settings, email, password),
        Commands::Logout => login::cmd_logout(),
        Commands::Whoami { json } => login::cmd_whoami(&settings, json),
        Commands::Check { input, sheet, json } => provision::cmd_check(&settings, input, sheet, json),
        Commands::Run { input, sheet, email, password, json, output, log_csv, quiet } => {
            provision::cmd_run(
                &settings,
                provision::RunArgs { input, sheet, email, password, json, output, log_csv, quiet },
            )
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, CliError> {
    Settings::load(path).map_err(|e| {
        let err = CliError::new(EXIT_CONFIG, e.to_string());
        match e {
            ConfigError::Io(_) => err.with_hint("check the --config path"),
            _ => err.with_hint("see the [api], [policy], [session], [log_sink], [input] sections"),
        }
    })
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn input(err: InputError) -> Self {
        let hint = match &err {
            InputError::MissingColumns(_) => Some(format!(
                "the header row needs: {}",
                fleetload_io::REQUIRED_COLUMNS.join(", ")
            )),
            InputError::UnsupportedFormat(_) => Some("use .csv, .xlsx, .xls, .xlsb or .ods".to_string()),
            InputError::Fetch(_) => Some("is the sheet still published as CSV?".to_string()),
            _ => None,
        };
        Self { code: EXIT_INPUT, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
