use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backend::ScanBackend;
use crate::config::Config;
use crate::error::ScanError;
use crate::types::{ReportKind, ScanReport, ScanRequest};

const USER_AGENT: &str = "sentinel/0.1";
const DOWNLOAD_REPORT_PATH: &str = "api/download-report";
const REPORT_TYPE_FIELD: &str = "report_type";
const REPORT_FILE_PREFIX: &str = "Sentinel_Report_";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Body of a scan request. The mode is carried by the endpoint, not the body.
#[derive(Debug, Serialize)]
struct ScanBody<'a> {
    url: &'a str,
}

/// Error envelope the backend uses for rejected requests.
#[derive(Debug, Deserialize)]
struct BackendError {
    error: String,
}

/// An exported document as received from the backend.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub kind: ReportKind,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ReportDocument {
    pub fn new(kind: ReportKind, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            filename: report_filename(Utc::now()),
            bytes,
        }
    }

    /// Write the document into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ScanError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        log::info!("[client] report_saved: path={} bytes={}", path.display(), self.bytes.len());
        Ok(path)
    }
}

pub fn report_filename(at: DateTime<Utc>) -> String {
    format!("{}{}.pdf", REPORT_FILE_PREFIX, at.timestamp_millis())
}

/// HTTP client for the scan backend.
#[derive(Debug, Clone)]
pub struct ScanClient {
    client: Client,
    config: Config,
}

impl ScanClient {
    pub fn new(config: Config) -> Result<Self, ScanError> {
        log::debug!("[client] new: api_base={} timeout={:?}", config.api_base, config.timeout);

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ScanError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn download_body(report: &ScanReport, kind: ReportKind) -> Result<Value, ScanError> {
        let mut body = serde_json::to_value(report).map_err(|e| ScanError::Download {
            status: None,
            reason: format!("failed to encode report: {}", e),
        })?;

        if let Value::Object(map) = &mut body {
            map.insert(REPORT_TYPE_FIELD.to_string(), Value::String(kind.as_str().to_string()));
        }

        Ok(body)
    }
}

#[async_trait]
impl ScanBackend for ScanClient {
    fn name(&self) -> &str {
        self.config.api_base.as_str()
    }

    async fn submit_scan(&self, request: &ScanRequest) -> Result<ScanReport, ScanError> {
        let endpoint = self.config.endpoint(request.mode().endpoint_path())?;
        log::debug!("[client] submit_scan: endpoint={} url={} mode={}",
            endpoint, request.url(), request.mode());

        let started = Instant::now();
        let connection_error = |status: Option<u16>, reason: String| ScanError::Connection {
            endpoint: endpoint.to_string(),
            status,
            reason,
        };

        let response = self
            .client
            .post(endpoint.clone())
            .json(&ScanBody { url: request.url() })
            .send()
            .await
            .map_err(|e| connection_error(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = backend_error_reason(status, &body);
            log::error!("[client] scan_rejected: endpoint={} status={} reason={} duration={}ms",
                endpoint, status.as_u16(), reason, started.elapsed().as_millis());
            return Err(connection_error(Some(status.as_u16()), reason));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| connection_error(Some(status.as_u16()), e.to_string()))?;

        let report: ScanReport =
            serde_json::from_slice(&body).map_err(|e| ScanError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        if !report.summary_matches() {
            log::warn!("[client] summary_mismatch: target={} summary={:?} counted={:?}",
                report.target, report.summary, report.severity_counts());
        }

        log::info!("[client] scan_completed: endpoint={} target={} vulnerabilities={} duration={}ms",
            endpoint, report.target, report.vulnerabilities.len(), started.elapsed().as_millis());

        Ok(report)
    }

    async fn request_report_download(
        &self,
        report: &ScanReport,
        kind: ReportKind,
    ) -> Result<ReportDocument, ScanError> {
        let endpoint = self.config.endpoint(DOWNLOAD_REPORT_PATH)?;
        log::debug!("[client] request_report_download: endpoint={} target={} kind={}",
            endpoint, report.target, kind);

        let body = Self::download_body(report, kind)?;
        let response = self
            .client
            .post(endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::Download {
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = backend_error_reason(status, &body);
            log::error!("[client] download_rejected: endpoint={} status={} reason={}",
                endpoint, status.as_u16(), reason);
            return Err(ScanError::Download {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let bytes = response.bytes().await.map_err(|e| ScanError::Download {
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;

        log::info!("[client] download_completed: endpoint={} kind={} bytes={}",
            endpoint, kind, bytes.len());

        Ok(ReportDocument::new(kind, bytes.to_vec()))
    }
}

/// Prefer the backend's `{"error": ...}` message, then a trimmed body, then
/// the status reason.
fn backend_error_reason(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<BackendError>(body) {
        return envelope.error;
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_filename() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(report_filename(at), "Sentinel_Report_1700000000123.pdf");
    }

    #[test]
    fn test_backend_error_reason() {
        assert_eq!(
            backend_error_reason(StatusCode::BAD_REQUEST, r#"{"error": "No URL provided"}"#),
            "No URL provided"
        );
        assert_eq!(
            backend_error_reason(StatusCode::BAD_GATEWAY, "  upstream down \n"),
            "upstream down"
        );
        assert_eq!(
            backend_error_reason(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_save_to_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("exec");
        let doc = ReportDocument::new(ReportKind::Executive, b"%PDF-1.4".to_vec());

        let path = doc.save_to(&nested).unwrap();
        assert!(path.starts_with(&nested));
        assert!(doc.filename.starts_with("Sentinel_Report_"));
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4");
    }
}
