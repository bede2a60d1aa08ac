use async_trait::async_trait;

use crate::client::ReportDocument;
use crate::error::ScanError;
use crate::types::{ReportKind, ScanReport, ScanRequest};

/// The external service that performs scans and renders report documents.
#[async_trait]
pub trait ScanBackend {
    /// Backend identifier for logging
    fn name(&self) -> &str;

    /// Run one scan. Single attempt, no retries.
    async fn submit_scan(&self, request: &ScanRequest) -> Result<ScanReport, ScanError>;

    /// Send a report back for export. The returned bytes are never inspected.
    async fn request_report_download(
        &self,
        report: &ScanReport,
        kind: ReportKind,
    ) -> Result<ReportDocument, ScanError>;
}
