use crate::analysis::{answer_question, AnalysisGateway};
use crate::audit::ScanOutcome;
use serde::Serialize;

/// Speaker of one chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Per-session mutable state: the chat transcript plus the audit context the
/// consultant answers against. Exactly one logical actor writes it.
#[derive(Debug)]
pub struct AuditSession {
    messages: Vec<ChatMessage>,
    audit_context: String,
}

impl AuditSession {
    /// A fresh session carries no audit context; the all-clear wording only
    /// appears once a scan has actually come back clean.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            audit_context: String::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn audit_context(&self) -> &str {
        &self.audit_context
    }

    /// Replace the context with the latest scan's violation text.
    pub fn record_scan(&mut self, outcome: &ScanOutcome) {
        self.audit_context = outcome.audit_context();
    }

    /// Answer a freeform question against the current audit context,
    /// appending both turns to the transcript.
    pub async fn ask(&mut self, gateway: &dyn AnalysisGateway, question: &str) -> String {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: question.to_string(),
        });

        let answer = answer_question(gateway, &self.audit_context, question).await;

        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: answer.clone(),
        });

        answer
    }
}

impl Default for AuditSession {
    fn default() -> Self {
        Self::new()
    }
}
