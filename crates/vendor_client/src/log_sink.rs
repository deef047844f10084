use std::time::Duration;

use fleetload_recon::{LogEntry, LogSink, SinkError};
use tracing::debug;

use crate::client::VendorError;

/// Posts execution log entries to a webhook as one JSON array.
pub struct HttpLogSink {
    http: reqwest::blocking::Client,
    url: String,
    timeout: Duration,
}

impl HttpLogSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, VendorError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("fleetload/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VendorError::Network(format!("cannot create HTTP client: {}", e)))?;
        Ok(Self { http, url: url.to_string(), timeout })
    }
}

impl LogSink for HttpLogSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn append(&self, entries: &[LogEntry]) -> Result<(), SinkError> {
        let response = self.http.post(&self.url)
            .timeout(self.timeout)
            .json(entries)
            .send()
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(url = %self.url, status, entries = entries.len(), "log webhook");
        if !response.status().is_success() {
            return Err(SinkError::Rejected(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn entry() -> LogEntry {
        LogEntry {
            timestamp: "2026-10-18T12:00:00+00:00".into(),
            row: 3,
            imei: "123".into(),
            result: "failure".into(),
            status: Some(400),
            message: "invalid data (check fleet ID or IMEI)".into(),
            note: "fleetload - operator: ana@example.com".into(),
        }
    }

    #[test]
    fn test_posts_entries_as_array() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/logs").json_body(json!([{
                "timestamp": "2026-10-18T12:00:00+00:00",
                "row": 3,
                "imei": "123",
                "result": "failure",
                "status": 400,
                "message": "invalid data (check fleet ID or IMEI)",
                "note": "fleetload - operator: ana@example.com"
            }]));
            then.status(204);
        });

        let sink = HttpLogSink::new(&server.url("/logs"), Duration::from_secs(5)).unwrap();
        sink.append(&[entry()]).unwrap();
        mock.assert();
    }

    #[test]
    fn test_rejection_reports_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/logs");
            then.status(500);
        });

        let sink = HttpLogSink::new(&server.url("/logs"), Duration::from_secs(5)).unwrap();
        assert_eq!(sink.append(&[entry()]), Err(SinkError::Rejected(500)));
    }

    #[test]
    fn test_unreachable_is_network_error() {
        let sink = HttpLogSink::new("http://127.0.0.1:9/logs", Duration::from_secs(2)).unwrap();
        assert!(matches!(sink.append(&[entry()]), Err(SinkError::Network(_))));
    }
}
