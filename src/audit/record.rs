use serde_json::{Map, Value};

/// One ingested activity log entry, kept as the raw field map so heterogeneous
/// sources (JSON export, CSV row, workbook row) all land in the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Field lookup preferring a value nested under `details`, falling back to
    /// the top level. A falsy nested value (null, blank string, `false`, zero,
    /// empty array or object) does not mask a top-level value; the top-level
    /// value itself is returned as-is.
    pub fn resolve_field(&self, key: &str) -> Option<&Value> {
        let nested = self
            .fields
            .get("details")
            .and_then(Value::as_object)
            .and_then(|details| details.get(key))
            .filter(|value| is_truthy(value));

        nested.or_else(|| self.fields.get(key))
    }

    /// Normalize this record into the explicit optional-field structure the
    /// rule checks read.
    pub fn resolve(&self) -> ResolvedEvent {
        ResolvedEvent {
            event_type: self.fields.get("event_type").and_then(value_text),
            user_email: self
                .fields
                .get("user_email")
                .and_then(value_text)
                .unwrap_or_else(|| "Unknown".to_string()),
            mfa_status: self.resolve_field("mfa_status").and_then(value_text),
            destination_folder: self.resolve_field("destination_folder").and_then(value_text),
            new_permission_level: self
                .resolve_field("new_permission_level")
                .and_then(value_text),
            software_name: self.resolve_field("software_name").and_then(value_text),
            approved_list: self.resolve_field("approved_list").and_then(value_text),
        }
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Normalized view of a record after the `details` merge. Every source field is
/// optional; the rule checks decide what absence means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub event_type: Option<String>,
    pub user_email: String,
    pub mfa_status: Option<String>,
    pub destination_folder: Option<String>,
    pub new_permission_level: Option<String>,
    pub software_name: Option<String>,
    pub approved_list: Option<String>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

/// Stringify scalar cell values the way the source dynamically coerced them:
/// booleans render as `true`/`false`, numbers as their decimal form.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
