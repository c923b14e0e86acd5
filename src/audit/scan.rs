use super::record::LogRecord;
use super::rules::{evaluate, Violation};
use std::collections::BTreeMap;

/// Audit context used when a scan finds nothing.
pub const ALL_CLEAR_CONTEXT: &str = "System is secure. No violations.";

const PENALTY_PER_VIOLATION: usize = 10;

/// Result of one scan pass: violations in record order, per-user tallies, and
/// the derived compliance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub total_events: usize,
    pub violations: Vec<Violation>,
    pub violations_by_user: BTreeMap<String, usize>,
}

impl ScanOutcome {
    pub fn total_violations(&self) -> usize {
        self.violations.len()
    }

    /// Compliance score: each violation costs 10 points off 100, floored at 0.
    pub fn compliance_score(&self) -> usize {
        100usize.saturating_sub(self.total_violations() * PENALTY_PER_VIOLATION)
    }

    /// Concatenated violation text consumed by the follow-up question path.
    pub fn audit_context(&self) -> String {
        if self.violations.is_empty() {
            return ALL_CLEAR_CONTEXT.to_string();
        }

        self.violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Run the rule set over every record, preserving record order.
pub fn scan_records(records: &[LogRecord]) -> ScanOutcome {
    let mut violations = Vec::new();
    let mut violations_by_user = BTreeMap::new();

    for record in records {
        if let Some(violation) = evaluate(record) {
            *violations_by_user
                .entry(violation.user.clone())
                .or_insert(0) += 1;
            violations.push(violation);
        }
    }

    ScanOutcome {
        total_events: records.len(),
        violations,
        violations_by_user,
    }
}
