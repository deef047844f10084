//! Sign-in commands and credential resolution for `run`.
//!
//! `fleetload login`   authenticate, save the token
//! `fleetload logout`  delete the saved login
//! `fleetload whoami`  show the saved login

use std::io::{self, Write};

use chrono::Utc;
use fleetload_config::Settings;
use fleetload_recon::Session;
use fleetload_vendor_client::{
    delete_login, load_login, save_login, SavedLogin, Timeouts, VendorClient, VendorError,
};

use crate::exit_codes::*;
use crate::CliError;

/// Build the vendor client from the `[api]` settings.
pub fn vendor_client(settings: &Settings) -> Result<VendorClient, CliError> {
    let timeouts = Timeouts {
        auth: settings.api.auth_timeout(),
        lookup: settings.api.lookup_timeout(),
        import: settings.api.import_timeout(),
    };
    VendorClient::new(&settings.api.base_url, timeouts)
        .map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))
}

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(settings: &Settings, email: String, password: Option<String>) -> Result<(), CliError> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(CliError::usage("--email must not be empty"));
    }
    let password = resolve_password(password)?;

    let client = vendor_client(settings)?;
    let token = authenticate(&client, &email, &password)?;

    let login = SavedLogin::new(token, client.api_base().to_string(), email, Utc::now());
    save_login(&login).map_err(|e| CliError::io(e.to_string()))?;

    eprintln!("Signed in as {} ({})", login.email, login.api_base);
    eprintln!(
        "Session ends after {} minutes without a run",
        settings.session.inactivity_timeout_mins
    );
    Ok(())
}

// ── Logout ──────────────────────────────────────────────────────────

pub fn cmd_logout() -> Result<(), CliError> {
    let removed = delete_login().map_err(|e| CliError::io(e.to_string()))?;
    if removed {
        eprintln!("Signed out");
    } else {
        eprintln!("Not signed in");
    }
    Ok(())
}

// ── Whoami ──────────────────────────────────────────────────────────

pub fn cmd_whoami(settings: &Settings, json: bool) -> Result<(), CliError> {
    let login = load_login().ok_or_else(not_signed_in)?;
    let expired = login.is_expired(Utc::now(), settings.session.inactivity());

    if json {
        let value = serde_json::json!({
            "email": login.email,
            "api_base": login.api_base,
            "signed_in_at": login.signed_in_at.to_rfc3339(),
            "last_used_at": login.last_used_at.to_rfc3339(),
            "expired": expired,
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        eprintln!("email:      {}", login.email);
        eprintln!("api:        {}", login.api_base);
        eprintln!("signed in:  {}", login.signed_in_at.to_rfc3339());
        eprintln!("last used:  {}", login.last_used_at.to_rfc3339());
        eprintln!("status:     {}", if expired { "expired" } else { "active" });
    }

    if expired {
        return Err(session_expired(settings));
    }
    Ok(())
}

// ── Run credentials ─────────────────────────────────────────────────

/// Signed-in session for a batch, plus the saved login to refresh after
/// the run (None for one-off `--email` sign-ins).
pub struct RunLogin {
    pub session: Session,
    pub saved: Option<SavedLogin>,
}

/// `--email` signs in for this run only; otherwise the saved login is used
/// if it is still active and was issued by the configured API.
pub fn resolve_run_login(
    settings: &Settings,
    client: &VendorClient,
    email: Option<String>,
    password: Option<String>,
) -> Result<RunLogin, CliError> {
    let now = Utc::now();

    if let Some(email) = email {
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(CliError::usage("--email must not be empty"));
        }
        let password = resolve_password(password)?;
        let token = authenticate(client, &email, &password)?;
        return Ok(RunLogin { session: Session::sign_in(token, email, now), saved: None });
    }

    let saved = load_login().ok_or_else(not_signed_in)?;
    if saved.api_base != client.api_base() {
        return Err(CliError::new(
            EXIT_NOT_AUTHENTICATED,
            format!("Saved login is for {}, not {}", saved.api_base, client.api_base()),
        )
        .with_hint("run `fleetload login` again"));
    }

    let session = saved.to_session();
    if session.is_expired(now, settings.session.inactivity()) {
        // An expired session is cleared, like an explicit sign-out
        let _ = delete_login();
        return Err(session_expired(settings));
    }

    Ok(RunLogin { session, saved: Some(saved) })
}

/// Record activity on the saved login after a run.
pub fn touch_saved_login(saved: &mut SavedLogin) {
    saved.touch(Utc::now());
    if let Err(e) = save_login(saved) {
        eprintln!("warning: could not refresh saved login: {}", e);
    }
}

// ── Internal helpers ────────────────────────────────────────────────

fn authenticate(client: &VendorClient, email: &str, password: &str) -> Result<String, CliError> {
    client.authenticate(email, password).map_err(|e| match e {
        VendorError::AuthRejected(_) => CliError::new(EXIT_AUTH_REJECTED, "Authentication failed")
            .with_hint("check the email and password"),
        VendorError::Network(msg) | VendorError::Timeout(msg) => CliError::new(
            EXIT_AUTH_REJECTED,
            format!("Cannot reach {}: {}", client.api_base(), msg),
        ),
        other => CliError::new(EXIT_AUTH_REJECTED, other.to_string()),
    })
}

fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    // --password / FLEETLOAD_PASSWORD > interactive prompt
    if let Some(p) = password.filter(|p| !p.is_empty()) {
        return Ok(p);
    }

    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::usage("No password provided and stdin is not a TTY")
            .with_hint("pass --password or set FLEETLOAD_PASSWORD"));
    }

    eprint!("Password: ");
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError::usage(e.to_string()))?;
    let trimmed = buf.trim().to_string();
    if trimmed.is_empty() {
        return Err(CliError::usage("No password provided")
            .with_hint("pass --password or set FLEETLOAD_PASSWORD"));
    }
    Ok(trimmed)
}

fn not_signed_in() -> CliError {
    CliError::new(EXIT_NOT_AUTHENTICATED, "Not signed in")
        .with_hint("run `fleetload login --email <email>` or pass --email to `run`")
}

fn session_expired(settings: &Settings) -> CliError {
    CliError::new(
        EXIT_NOT_AUTHENTICATED,
        format!(
            "Session expired after {} minutes of inactivity",
            settings.session.inactivity_timeout_mins
        ),
    )
    .with_hint("run `fleetload login` again")
}
