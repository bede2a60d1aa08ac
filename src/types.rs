use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ScanError;

const QUICK_SCAN_PATH: &str = "api/scan";
const DEEP_SCAN_PATH: &str = "api/deep-scan";

/// Scan depth forwarded to the backend. Only selects the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Quick,
    Deep,
}

impl ScanMode {
    /// Endpoint path relative to the API base.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            ScanMode::Quick => QUICK_SCAN_PATH,
            ScanMode::Deep => DEEP_SCAN_PATH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Quick => "quick",
            ScanMode::Deep => "deep",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-submitted scan target. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    url: String,
    mode: ScanMode,
}

impl ScanRequest {
    /// The url is forwarded as given; only emptiness is checked here.
    pub fn new(url: impl Into<String>, mode: ScanMode) -> Result<Self, ScanError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ScanError::InvalidRequest("target url is empty".to_string()));
        }
        Ok(Self { url, mode })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }
}

/// Finding severity. Strings outside the four known levels (ZAP's
/// `Informational`, for one) are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[serde(untagged)]
    Other(String),
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Other(label) => label,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding as produced by the backend.
///
/// Fields this crate doesn't know about are kept in `extra` so the report can
/// be sent back for export unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
    pub severity: Severity,
    /// Standard name (GDPR, OWASP, PCI_DSS, ...) to clause code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<BTreeMap<String, String>>,
    pub fix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss: Option<f64>,
    /// Estimated financial impact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_cost: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// Severity tallies computed locally. Critical rolls into `high`; unknown
/// severities are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl SeverityCounts {
    pub fn from_vulnerabilities(vulnerabilities: &[Vulnerability]) -> Self {
        vulnerabilities
            .iter()
            .fold(Self::default(), |mut counts, vuln| {
                match vuln.severity {
                    Severity::Critical | Severity::High => counts.high += 1,
                    Severity::Medium => counts.medium += 1,
                    Severity::Low => counts.low += 1,
                    Severity::Other(_) => {}
                }
                counts
            })
    }

    pub fn matches(&self, summary: &Summary) -> bool {
        self.high == summary.high && self.medium == summary.medium && self.low == summary.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub vulnerabilities: Vec<Vulnerability>,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_risk_total: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScanReport {
    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_vulnerabilities(&self.vulnerabilities)
    }

    /// Whether the backend's summary agrees with the vulnerability list.
    pub fn summary_matches(&self) -> bool {
        self.severity_counts().matches(&self.summary)
    }

    /// Vulnerabilities grouped by severity, most severe first, then unknown
    /// severities in order of first appearance. Backend order is kept within
    /// each group and empty groups are skipped.
    pub fn grouped_by_severity(&self) -> Vec<(Severity, Vec<&Vulnerability>)> {
        let mut groups: Vec<(Severity, Vec<&Vulnerability>)> = Severity::ALL
            .iter()
            .map(|severity| (severity.clone(), Vec::new()))
            .collect();

        for vuln in &self.vulnerabilities {
            match groups.iter_mut().find(|(severity, _)| *severity == vuln.severity) {
                Some((_, group)) => group.push(vuln),
                None => groups.push((vuln.severity.clone(), vec![vuln])),
            }
        }

        groups.retain(|(_, group)| !group.is_empty());
        groups
    }
}

/// Which document the export endpoint should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Technical,
    Executive,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Technical => "technical",
            ReportKind::Executive => "executive",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
