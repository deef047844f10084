// Published spreadsheet sync: a sheet exported as CSV at a public URL

use std::time::Duration;

use tracing::info;

use crate::error::InputError;
use crate::rows::InputBatch;

/// Download a published sheet and load it as a CSV device table.
pub fn fetch(url: &str, timeout: Duration) -> Result<InputBatch, InputError> {
    let http = reqwest::blocking::Client::builder()
        .user_agent(format!("fleetload/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| InputError::Fetch(e.to_string()))?;

    let response = http.get(url).send().map_err(|e| InputError::Fetch(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(InputError::Fetch(format!("HTTP {}", status.as_u16())));
    }

    let bytes = response.bytes().map_err(|e| InputError::Fetch(e.to_string()))?;
    let batch = crate::csv::load_bytes(&bytes)?;
    info!(url, records = batch.records.len(), rejected = batch.rejected.len(), "sheet synchronized");
    Ok(batch)
}
