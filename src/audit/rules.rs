use super::record::{LogRecord, ResolvedEvent};
use serde::Serialize;

/// The fixed compliance rule set, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    MissingMfa,
    PublicFolderUpload,
    PublicReadGrant,
    UnsanctionedInstall,
}

impl RuleKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingMfa => "Login Without MFA",
            Self::PublicFolderUpload => "Upload to Public Folder",
            Self::PublicReadGrant => "Public Read Permission",
            Self::UnsanctionedInstall => "Unapproved Software Install",
        }
    }
}

/// One rule match. The message is the finding's identity; violations are not
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: RuleKind,
    pub user: String,
    pub message: String,
}

/// Evaluate one record against the rule set. Checks run in fixed order and the
/// first match wins; a record carries a single `event_type`, so at most one
/// rule can fire.
pub fn evaluate(record: &LogRecord) -> Option<Violation> {
    evaluate_resolved(&record.resolve())
}

pub(crate) fn evaluate_resolved(event: &ResolvedEvent) -> Option<Violation> {
    let event_type = event.event_type.as_deref()?;
    let user = event.user_email.clone();

    if event_type == "USER_LOGIN" && event.mfa_status.as_deref() == Some("DISABLED") {
        return Some(Violation {
            rule: RuleKind::MissingMfa,
            message: format!("CRITICAL: User {user} logged in without MFA."),
            user,
        });
    }

    if event_type == "FILE_UPLOAD" {
        if let Some(folder) = event.destination_folder.as_deref() {
            // Case-sensitive substring, matching the upstream detection.
            if folder.contains("Public") {
                return Some(Violation {
                    rule: RuleKind::PublicFolderUpload,
                    message: format!("DATA LEAK: User {user} exposed file to Public Folder."),
                    user,
                });
            }
        }
    }

    if event_type == "PERMISSION_CHANGE"
        && event.new_permission_level.as_deref() == Some("PUBLIC_READ")
    {
        return Some(Violation {
            rule: RuleKind::PublicReadGrant,
            message: format!("HIGH RISK: User {user} set resource to Public Read."),
            user,
        });
    }

    if event_type == "SOFTWARE_INSTALL" {
        let unapproved = event
            .approved_list
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("FALSE"));
        if unapproved {
            let software = event.software_name.as_deref().unwrap_or("Unknown");
            return Some(Violation {
                rule: RuleKind::UnsanctionedInstall,
                message: format!(
                    "SHADOW IT: User {user} installed unapproved software: {software}."
                ),
                user,
            });
        }
    }

    None
}
