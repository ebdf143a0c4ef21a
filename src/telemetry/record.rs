use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ErrorKind;

/// Name recorded as the `Dependency` field.
pub const DEPENDENCY: &str = "Myob";

/// Structured message template; [`CallRecord::message`] renders it.
pub const MESSAGE_TEMPLATE: &str =
    "Dependency {Dependency} HTTP {RequestMethod} {RequestPath} responded {StatusCode} in {Elapsed:0.0000} ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLevel {
    Debug,
    Error,
}

/// How the response body appears in a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    /// The body text itself.
    Inline(String),
    /// Address of a blob holding the body text.
    Blob(String),
}

impl ResponseBody {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(text) | Self::Blob(text) => text,
        }
    }
}

/// Outcome of one call, built once and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub level: RecordLevel,
    pub dependency: String,
    pub request_method: String,
    pub request_path: String,
    /// 0 for failures.
    pub status_code: u16,
    pub elapsed_ms: f64,
    pub request_body: Option<String>,
    pub response_body: Option<ResponseBody>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

impl CallRecord {
    /// Renders [`MESSAGE_TEMPLATE`] with this record's fields.
    pub fn message(&self) -> String {
        format!(
            "Dependency {} HTTP {} {} responded {} in {:.4} ms",
            self.dependency, self.request_method, self.request_path, self.status_code, self.elapsed_ms
        )
    }
}
