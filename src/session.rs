use std::time::Instant;

use crate::backend::ScanBackend;
use crate::error::ScanError;
use crate::types::{ScanReport, ScanRequest};

/// Lifecycle of the current scan. Exactly one state holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStatus {
    Idle,
    Loading,
    Success(ScanReport),
    Error(String),
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "Idle",
            ScanStatus::Loading => "Loading",
            ScanStatus::Success(_) => "Success",
            ScanStatus::Error(_) => "Error",
        }
    }
}

/// Handle for one submission. Only the most recently issued ticket may
/// resolve the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket {
    seq: u64,
}

/// View-model for a page that runs scans: the current status plus the last
/// successful report.
#[derive(Debug)]
pub struct ScanSession {
    status: ScanStatus,
    report: Option<ScanReport>,
    issued: u64,
    started: Option<Instant>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            status: ScanStatus::Idle,
            report: None,
            issued: 0,
            started: None,
        }
    }

    pub fn status(&self) -> &ScanStatus {
        &self.status
    }

    /// Last successful report. Survives later failures and reloads.
    pub fn report(&self) -> Option<&ScanReport> {
        self.report.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ScanStatus::Loading)
    }

    /// Enter `Loading` from any state. Any earlier ticket becomes stale.
    pub fn begin(&mut self, request: &ScanRequest) -> ScanTicket {
        self.issued += 1;
        if self.is_loading() {
            log::warn!("[session] superseded: seq={} url={} - previous submission still in flight",
                self.issued - 1, request.url());
        }

        log::debug!("[session] transition: {} -> Loading seq={} url={} mode={}",
            self.status.as_str(), self.issued, request.url(), request.mode());

        self.status = ScanStatus::Loading;
        self.started = Some(Instant::now());
        ScanTicket { seq: self.issued }
    }

    /// Apply an outcome. Returns false, changing nothing, for a stale ticket.
    pub fn resolve(&mut self, ticket: ScanTicket, result: &Result<ScanReport, ScanError>) -> bool {
        if ticket.seq != self.issued || !self.is_loading() {
            log::warn!("[session] stale_result_dropped: seq={} current={}", ticket.seq, self.issued);
            return false;
        }

        let elapsed = self.started.take().map(|s| s.elapsed().as_millis()).unwrap_or_default();
        match result {
            Ok(report) => {
                log::debug!("[session] transition: Loading -> Success seq={} vulnerabilities={} duration={}ms",
                    ticket.seq, report.vulnerabilities.len(), elapsed);
                self.report = Some(report.clone());
                self.status = ScanStatus::Success(report.clone());
            }
            Err(error) => {
                log::debug!("[session] transition: Loading -> Error seq={} error={} duration={}ms",
                    ticket.seq, error, elapsed);
                self.status = ScanStatus::Error(error.user_message());
            }
        }
        true
    }

    /// Run one scan through `backend` and record the outcome.
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        request: &ScanRequest,
    ) -> Result<ScanReport, ScanError>
    where
        B: ScanBackend + Sync + ?Sized,
    {
        let ticket = self.begin(request);
        log::info!("[session] submit: backend={} url={} mode={}",
            backend.name(), request.url(), request.mode());

        let result = backend.submit_scan(request).await;
        self.resolve(ticket, &result);
        result
    }

    /// Drop the report and return to `Idle`, as when leaving the page.
    pub fn clear(&mut self) {
        log::debug!("[session] cleared: from={}", self.status.as_str());
        self.issued += 1;
        self.status = ScanStatus::Idle;
        self.report = None;
        self.started = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReportDocument;
    use crate::types::{ReportKind, ScanMode, Severity, Summary, Vulnerability};
    use async_trait::async_trait;
    use serde_json::Map;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct FakeBackend {
        responses: Mutex<VecDeque<Result<ScanReport, ScanError>>>,
        calls: Mutex<Vec<ScanRequest>>,
    }

    impl FakeBackend {
        fn new(responses: Vec<Result<ScanReport, ScanError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScanBackend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        async fn submit_scan(&self, request: &ScanRequest) -> Result<ScanReport, ScanError> {
            self.calls.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected scan call")
        }

        async fn request_report_download(
            &self,
            _report: &ScanReport,
            kind: ReportKind,
        ) -> Result<ReportDocument, ScanError> {
            Ok(ReportDocument::new(kind, Vec::new()))
        }
    }

    fn report(target: &str) -> ScanReport {
        ScanReport {
            target: target.to_string(),
            vulnerabilities: vec![Vulnerability {
                kind: "XSS".to_string(),
                details: "...".to_string(),
                severity: Severity::High,
                compliance: None,
                fix: "...".to_string(),
                cvss: None,
                est_cost: None,
                extra: Map::new(),
            }],
            summary: Summary { high: 1, medium: 0, low: 0 },
            financial_risk_total: None,
            extra: Map::new(),
        }
    }

    fn unreachable() -> ScanError {
        ScanError::Connection {
            endpoint: "http://127.0.0.1:5000/api/scan".to_string(),
            status: None,
            reason: "connection refused".to_string(),
        }
    }

    fn request() -> ScanRequest {
        ScanRequest::new("http://example.com", ScanMode::Quick).unwrap()
    }

    #[tokio::test]
    async fn test_submit_success() {
        let backend = FakeBackend::new(vec![Ok(report("http://example.com"))]);
        let mut session = ScanSession::new();
        assert_eq!(session.status(), &ScanStatus::Idle);

        let result = session.submit(&backend, &request()).await;
        assert!(result.is_ok());
        match session.status() {
            ScanStatus::Success(report) => {
                assert_eq!(report.vulnerabilities.len(), 1);
                assert_eq!(report.summary.high, 1);
            }
            other => panic!("expected Success, got {:?}", other),
        }
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_report() {
        let backend = FakeBackend::new(vec![Ok(report("http://first.example")), Err(unreachable())]);
        let mut session = ScanSession::new();

        session.submit(&backend, &request()).await.unwrap();
        let err = session.submit(&backend, &request()).await.unwrap_err();
        assert!(matches!(err, ScanError::Connection { .. }));

        match session.status() {
            ScanStatus::Error(message) => assert!(!message.is_empty()),
            other => panic!("expected Error, got {:?}", other),
        }
        assert_eq!(session.report().map(|r| r.target.as_str()), Some("http://first.example"));
    }

    #[tokio::test]
    async fn test_resubmit_after_error() {
        let backend = FakeBackend::new(vec![Err(unreachable()), Ok(report("http://example.com"))]);
        let mut session = ScanSession::new();

        assert!(session.submit(&backend, &request()).await.is_err());
        assert!(session.report().is_none());
        assert!(session.submit(&backend, &request()).await.is_ok());
        assert!(matches!(session.status(), ScanStatus::Success(_)));
    }

    #[test]
    fn test_latest_submission_wins() {
        let mut session = ScanSession::new();
        let first = session.begin(&request());
        let second = session.begin(&request());
        assert!(session.is_loading());

        // First response arrives late and is dropped
        assert!(!session.resolve(first, &Ok(report("http://first.example"))));
        assert!(session.is_loading());
        assert!(session.report().is_none());

        assert!(session.resolve(second, &Ok(report("http://second.example"))));
        assert_eq!(session.report().map(|r| r.target.as_str()), Some("http://second.example"));

        // A ticket resolves at most once
        assert!(!session.resolve(second, &Err(unreachable())));
        assert!(matches!(session.status(), ScanStatus::Success(_)));
    }

    #[test]
    fn test_clear_discards_report_and_pending() {
        let mut session = ScanSession::new();
        let ticket = session.begin(&request());
        session.clear();
        assert_eq!(session.status(), &ScanStatus::Idle);
        assert!(!session.resolve(ticket, &Ok(report("http://example.com"))));
        assert!(session.report().is_none());
    }
}
