use crate::session::ScanStatus;
use crate::types::{ScanReport, Severity, Vulnerability};

const SEPARATOR_WIDTH: usize = 80;
const BAR_WIDTH: usize = 40;

pub fn print_status(target: &str, status: &ScanStatus) {
    match status {
        ScanStatus::Idle => println!("⏸  {}: idle", target),
        ScanStatus::Loading => println!("🔄 Scanning: {} ...", target),
        ScanStatus::Success(report) => print_report(report),
        ScanStatus::Error(message) => println!("❌ {}: {}", target, message),
    }
}

pub fn print_report(report: &ScanReport) {
    print!("{}", render_report(report));
}

/// Render a report the way the results page lays it out: header, severity
/// breakdown, then findings grouped most severe first.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();
    let counts = report.severity_counts();
    let separator = "─".repeat(SEPARATOR_WIDTH);

    out.push_str(&format!("✅ Scan complete: {}\n", report.target));
    out.push_str(&separator);
    out.push('\n');

    out.push_str(&format!(
        "Critical/High: {}  Medium: {}  Low: {}  (total {})\n",
        counts.high,
        counts.medium,
        counts.low,
        report.vulnerabilities.len()
    ));
    out.push_str(&severity_bar(counts.high, counts.medium, counts.low));
    out.push('\n');

    let counted = (counts.high + counts.medium + counts.low) as usize;
    let unrated = report.vulnerabilities.len().saturating_sub(counted);
    if unrated > 0 {
        out.push_str(&format!("Unrated: {}\n", unrated));
    }

    if let Some(total) = report.financial_risk_total {
        out.push_str(&format!("Estimated financial exposure: ${:.2}\n", total));
    }

    if !report.summary_matches() {
        out.push_str(&format!(
            "⚠️  Backend summary differs: high={} medium={} low={}\n",
            report.summary.high, report.summary.medium, report.summary.low
        ));
    }

    out.push_str(&separator);
    out.push('\n');

    if report.vulnerabilities.is_empty() {
        out.push_str("No vulnerabilities found\n");
        return out;
    }

    for (severity, group) in report.grouped_by_severity() {
        out.push_str(&format!("{} {} ({})\n", severity_icon(&severity), severity, group.len()));
        for vuln in group {
            out.push_str(&render_vulnerability(vuln));
        }
    }

    out
}

fn render_vulnerability(vuln: &Vulnerability) -> String {
    let mut out = format!("  • {}", vuln.kind);
    if let Some(cvss) = vuln.cvss {
        out.push_str(&format!(" [CVSS {:.1}]", cvss));
    }
    out.push('\n');
    out.push_str(&format!("    ├─ {}\n", vuln.details));

    if let Some(compliance) = vuln.compliance.as_ref().filter(|c| !c.is_empty()) {
        let clauses = compliance
            .iter()
            .map(|(standard, clause)| format!("{} {}", standard, clause))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("    ├─ Compliance: {}\n", clauses));
    }

    if let Some(cost) = vuln.est_cost {
        out.push_str(&format!("    ├─ Est. cost: ${:.2}\n", cost));
    }

    out.push_str(&format!("    └─ Fix: {}\n", vuln.fix));
    out
}

fn severity_icon(severity: &Severity) -> &'static str {
    match severity {
        Severity::Critical => "🟥",
        Severity::High => "🟧",
        Severity::Medium => "🟨",
        Severity::Low => "🟩",
        Severity::Other(_) => "⬜",
    }
}

/// Proportional stacked bar: high `█`, medium `▓`, low `░`.
fn severity_bar(high: u32, medium: u32, low: u32) -> String {
    let total = high + medium + low;
    if total == 0 {
        return "·".repeat(BAR_WIDTH);
    }

    let width = |count: u32| (count as usize * BAR_WIDTH) / total as usize;
    let high_w = width(high);
    let medium_w = width(medium);
    let low_w = BAR_WIDTH - high_w - medium_w;

    format!("{}{}{}", "█".repeat(high_w), "▓".repeat(medium_w), "░".repeat(low_w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Summary;
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn vuln(kind: &str, severity: Severity) -> Vulnerability {
        Vulnerability {
            kind: kind.to_string(),
            details: format!("{} details", kind),
            severity,
            compliance: None,
            fix: format!("fix {}", kind),
            cvss: None,
            est_cost: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_render_groups_and_fields() {
        let mut sqli = vuln("SQL Injection", Severity::Critical);
        sqli.cvss = Some(9.8);
        sqli.compliance = Some(BTreeMap::from([("OWASP".to_string(), "A03:2021".to_string())]));

        let report = ScanReport {
            target: "https://example.com".to_string(),
            vulnerabilities: vec![vuln("Network Exposure", Severity::Low), sqli],
            summary: Summary { high: 1, medium: 0, low: 1 },
            financial_risk_total: Some(1234.5),
            extra: Map::new(),
        };

        let text = render_report(&report);
        assert!(text.contains("https://example.com"));
        assert!(text.contains("Critical/High: 1  Medium: 0  Low: 1"));
        assert!(text.contains("[CVSS 9.8]"));
        assert!(text.contains("OWASP A03:2021"));
        assert!(text.contains("$1234.50"));
        assert!(!text.contains("Backend summary differs"));

        let critical_at = text.find("SQL Injection").unwrap();
        let low_at = text.find("Network Exposure").unwrap();
        assert!(critical_at < low_at);
    }

    #[test]
    fn test_render_unknown_severity_last() {
        let report = ScanReport {
            target: "https://example.com".to_string(),
            vulnerabilities: vec![
                vuln("Server Leaks Version", Severity::Other("Informational".to_string())),
                vuln("XSS", Severity::High),
            ],
            summary: Summary { high: 1, medium: 0, low: 0 },
            financial_risk_total: None,
            extra: Map::new(),
        };

        let text = render_report(&report);
        assert!(text.contains("Critical/High: 1  Medium: 0  Low: 0  (total 2)"));
        assert!(text.contains("Unrated: 1"));
        assert!(text.contains("⬜ Informational (1)"));
        assert!(text.find("XSS").unwrap() < text.find("Server Leaks Version").unwrap());
    }

    #[test]
    fn test_render_flags_summary_mismatch() {
        let report = ScanReport {
            target: "https://example.com".to_string(),
            vulnerabilities: vec![],
            summary: Summary { high: 2, medium: 0, low: 0 },
            financial_risk_total: None,
            extra: Map::new(),
        };

        let text = render_report(&report);
        assert!(text.contains("No vulnerabilities found"));
        assert!(text.contains("Backend summary differs"));
    }

    #[test]
    fn test_severity_bar_width() {
        assert_eq!(severity_bar(1, 1, 2).chars().count(), BAR_WIDTH);
        assert_eq!(severity_bar(0, 0, 0).chars().count(), BAR_WIDTH);
        assert_eq!(severity_bar(3, 0, 0), "█".repeat(BAR_WIDTH));
    }
}
