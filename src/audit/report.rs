use super::scan::ScanOutcome;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Fixed banner at the top of every generated report.
pub const REPORT_HEADER: &str = "audit-ai - Official Compliance Report";

/// Default artifact name for a persisted report. The layout mirrors the PDF
/// the hosted product shipped, rendered as structured plain text.
pub const DEFAULT_REPORT_FILENAME: &str = "Audit_Report_v1.txt";

/// One detected finding plus its analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingSection {
    pub title: String,
    pub analysis: String,
}

/// Document model for the audit report: fixed header, scan date, one section
/// per captured violation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub scan_date: NaiveDate,
    pub compliance_score: usize,
    pub total_events: usize,
    pub total_violations: usize,
    pub sections: Vec<FindingSection>,
}

impl AuditReport {
    /// Pair each violation with its analysis text, in scan order. `analyses`
    /// is parallel to the outcome's violation list.
    pub fn from_scan(outcome: &ScanOutcome, analyses: Vec<String>, scan_date: NaiveDate) -> Self {
        let sections = outcome
            .violations
            .iter()
            .zip(analyses)
            .map(|(violation, analysis)| FindingSection {
                title: violation.message.clone(),
                analysis,
            })
            .collect();

        Self {
            scan_date,
            compliance_score: outcome.compliance_score(),
            total_events: outcome.total_events,
            total_violations: outcome.total_violations(),
            sections,
        }
    }

    /// Render the full report body.
    pub fn render_document(&self) -> String {
        let mut document = String::new();
        document.push_str(REPORT_HEADER);
        document.push_str("\n\n");
        document.push_str(&format!("Scan Date: {}\n", self.scan_date.format("%Y-%m-%d")));
        document.push_str(&format!(
            "Compliance Score: {}% | Events Scanned: {} | Violations: {}\n",
            self.compliance_score, self.total_events, self.total_violations
        ));

        for section in &self.sections {
            document.push('\n');
            document.push_str(&format!("DETECTED: {}\n", section.title));
            document.push_str(&section.analysis);
            document.push('\n');
            document.push_str("----------------------------------------\n");
        }

        if self.sections.is_empty() {
            document.push_str("\nNo violations detected.\n");
        }

        document
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(self.render_document().as_bytes())
    }
}

/// Chart entry for the per-user violation tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserViolationEntry {
    pub user: String,
    pub violations: usize,
}

/// Serializable dashboard view of a scan: the metrics row and the risky-user
/// chart, worst offenders first.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub compliance_score: usize,
    pub total_events: usize,
    pub total_violations: usize,
    pub top_users: Vec<UserViolationEntry>,
}

impl ScanSummary {
    pub fn from_outcome(outcome: &ScanOutcome) -> Self {
        let mut top_users: Vec<UserViolationEntry> = outcome
            .violations_by_user
            .iter()
            .map(|(user, violations)| UserViolationEntry {
                user: user.clone(),
                violations: *violations,
            })
            .collect();
        // BTreeMap iteration already sorts by user; make the count dominant.
        top_users.sort_by(|a, b| b.violations.cmp(&a.violations));

        Self {
            compliance_score: outcome.compliance_score(),
            total_events: outcome.total_events,
            total_violations: outcome.total_violations(),
            top_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::loader::parse_json;
    use crate::audit::scan::scan_records;
    use std::io::Cursor;

    fn scan_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 29).expect("valid scan date")
    }

    fn flagged_outcome() -> ScanOutcome {
        let records = parse_json(Cursor::new(
            br#"[
                {"event_type": "USER_LOGIN", "user_email": "steve@corp.com", "mfa_status": "DISABLED"},
                {"event_type": "SOFTWARE_INSTALL", "user_email": "kim@corp.com", "software_name": "TorrentMax", "approved_list": "False"}
            ]"#
            .to_vec(),
        ))
        .expect("sample parses");
        scan_records(&records)
    }

    #[test]
    fn report_sections_follow_violation_order() {
        let outcome = flagged_outcome();
        let analyses = vec!["Enable MFA.".to_string(), "See full logs.".to_string()];
        let report = AuditReport::from_scan(&outcome, analyses, scan_date());

        assert_eq!(report.sections.len(), 2);
        assert!(report.sections[0].title.starts_with("CRITICAL"));
        assert!(report.sections[1].title.starts_with("SHADOW IT"));
        assert_eq!(report.compliance_score, 80);
    }

    #[test]
    fn rendered_document_carries_header_and_findings() {
        let outcome = flagged_outcome();
        let analyses = vec!["Enable MFA.".to_string(), "See full logs.".to_string()];
        let report = AuditReport::from_scan(&outcome, analyses, scan_date());
        let document = report.render_document();

        assert!(document.starts_with(REPORT_HEADER));
        assert!(document.contains("Scan Date: 2026-08-29"));
        assert!(document.contains("DETECTED: CRITICAL: User steve@corp.com logged in without MFA."));
        assert!(document.contains("Enable MFA."));
    }

    #[test]
    fn clean_scan_renders_all_clear() {
        let report = AuditReport::from_scan(&scan_records(&[]), Vec::new(), scan_date());
        let document = report.render_document();
        assert!(document.contains("No violations detected."));
        assert!(document.contains("Compliance Score: 100%"));
    }

    #[test]
    fn summary_sorts_worst_offenders_first() {
        let records = parse_json(Cursor::new(
            br#"[
                {"event_type": "USER_LOGIN", "user_email": "zoe@corp.com", "mfa_status": "DISABLED"},
                {"event_type": "USER_LOGIN", "user_email": "abe@corp.com", "mfa_status": "DISABLED"},
                {"event_type": "USER_LOGIN", "user_email": "zoe@corp.com", "mfa_status": "DISABLED"}
            ]"#
            .to_vec(),
        ))
        .expect("sample parses");

        let summary = ScanSummary::from_outcome(&scan_records(&records));
        assert_eq!(summary.top_users.len(), 2);
        assert_eq!(summary.top_users[0].user, "zoe@corp.com");
        assert_eq!(summary.top_users[0].violations, 2);
        assert_eq!(summary.total_violations, 3);
    }
}
