pub mod gemini;
pub mod offline;

pub use gemini::GeminiClient;
pub use offline::OfflineAnalyst;

use crate::audit::Violation;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::warn;

/// Substituted whenever the analysis backend errors; failures are never
/// surfaced to the caller as errors.
pub const FALLBACK_ANALYSIS: &str = "AI Analysis Unavailable.";

/// Placeholder for violations past the live-analysis budget.
pub const STATIC_PLACEHOLDER: &str = "See full logs.";

/// Only the first few violations of a scan get a live backend call.
pub const ANALYSIS_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis backend requires an API key")]
    MissingApiKey,
    #[error("analysis request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("analysis backend returned status {status}")]
    Backend { status: u16 },
    #[error("analysis backend returned no text")]
    EmptyResponse,
}

/// Effect boundary over the generative-text service: an opaque
/// prompt-in, text-out call. Swappable for the offline stub in tests.
#[async_trait]
pub trait AnalysisGateway: Send + Sync + Debug {
    async fn generate_text(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// Shared handle used by the service state and CLI.
pub type SharedAnalyst = Arc<dyn AnalysisGateway>;

pub(crate) fn auditor_prompt(violation_text: &str) -> String {
    format!(
        "You are a NIST Compliance Auditor.\n\
         Violation: \"{violation_text}\"\n\
         Output format:\n\
         NIST CONTROL: [Number]\n\
         RISK: [1 sentence]\n\
         REMEDIATION: [1 technical fix]"
    )
}

pub(crate) fn consultant_prompt(audit_context: &str, question: &str) -> String {
    format!(
        "You are a NIST Cybersecurity Expert.\n\
         Context of the current system audit:\n\
         {audit_context}\n\n\
         User Question: {question}\n\n\
         Provide a specific, technical answer."
    )
}

/// Analyze one violation, degrading to the fixed fallback on any backend
/// failure.
pub async fn analyze_violation(gateway: &dyn AnalysisGateway, violation_text: &str) -> String {
    match gateway.generate_text(&auditor_prompt(violation_text)).await {
        Ok(analysis) => analysis,
        Err(error) => {
            warn!(%error, "violation analysis failed, substituting fallback");
            FALLBACK_ANALYSIS.to_string()
        }
    }
}

/// Answer a freeform question against the accumulated audit context.
pub async fn answer_question(
    gateway: &dyn AnalysisGateway,
    audit_context: &str,
    question: &str,
) -> String {
    match gateway
        .generate_text(&consultant_prompt(audit_context, question))
        .await
    {
        Ok(answer) => answer,
        Err(error) => {
            warn!(%error, "consultant answer failed, substituting fallback");
            FALLBACK_ANALYSIS.to_string()
        }
    }
}

/// Produce one analysis string per violation, in scan order: live backend
/// calls for the first [`ANALYSIS_LIMIT`] findings, the static placeholder for
/// the rest.
pub async fn annotate_violations(
    gateway: &dyn AnalysisGateway,
    violations: &[Violation],
) -> Vec<String> {
    let mut analyses = Vec::with_capacity(violations.len());
    for (index, violation) in violations.iter().enumerate() {
        if index < ANALYSIS_LIMIT {
            analyses.push(analyze_violation(gateway, &violation.message).await);
        } else {
            analyses.push(STATIC_PLACEHOLDER.to_string());
        }
    }
    analyses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RuleKind;

    #[derive(Debug)]
    struct FailingGateway;

    #[async_trait]
    impl AnalysisGateway for FailingGateway {
        async fn generate_text(&self, _prompt: &str) -> Result<String, AnalysisError> {
            Err(AnalysisError::EmptyResponse)
        }
    }

    #[derive(Debug)]
    struct EchoGateway;

    #[async_trait]
    impl AnalysisGateway for EchoGateway {
        async fn generate_text(&self, prompt: &str) -> Result<String, AnalysisError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    fn violations(count: usize) -> Vec<Violation> {
        (0..count)
            .map(|i| Violation {
                rule: RuleKind::MissingMfa,
                user: format!("u{i}@corp.com"),
                message: format!("CRITICAL: User u{i}@corp.com logged in without MFA."),
            })
            .collect()
    }

    #[test]
    fn auditor_prompt_embeds_violation_text() {
        let prompt = auditor_prompt("DATA LEAK: User ana exposed file to Public Folder.");
        assert!(prompt.starts_with("You are a NIST Compliance Auditor."));
        assert!(prompt.contains("\"DATA LEAK: User ana exposed file to Public Folder.\""));
        assert!(prompt.contains("REMEDIATION: [1 technical fix]"));
    }

    #[test]
    fn consultant_prompt_embeds_context_and_question() {
        let prompt = consultant_prompt("CRITICAL: ...", "How do I fix the MFA issue?");
        assert!(prompt.contains("Context of the current system audit:\nCRITICAL: ..."));
        assert!(prompt.contains("User Question: How do I fix the MFA issue?"));
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_fallback() {
        let analysis = analyze_violation(&FailingGateway, "CRITICAL: ...").await;
        assert_eq!(analysis, FALLBACK_ANALYSIS);
    }

    #[tokio::test]
    async fn annotation_respects_live_call_budget() {
        let violations = violations(7);
        let analyses = annotate_violations(&EchoGateway, &violations).await;

        assert_eq!(analyses.len(), 7);
        for analysis in analyses.iter().take(ANALYSIS_LIMIT) {
            assert!(analysis.starts_with("echo:"));
        }
        for analysis in analyses.iter().skip(ANALYSIS_LIMIT) {
            assert_eq!(analysis, STATIC_PLACEHOLDER);
        }
    }
}
