pub mod loader;
pub mod record;
pub mod report;
pub mod rules;
pub mod scan;

pub use loader::{load_path, load_reader, LoaderError, LogFormat};
pub use record::{LogRecord, ResolvedEvent};
pub use report::{AuditReport, ScanSummary, UserViolationEntry};
pub use rules::{RuleKind, Violation};
pub use scan::{scan_records, ScanOutcome, ALL_CLEAR_CONTEXT};
