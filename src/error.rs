use std::fmt;

use serde::Serialize;
use serde_json::json;

/// Request field referenced by a [`ParseFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ServerName,
    ToolName,
    Arguments,
}

impl Field {
    /// Markup tag name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::ServerName => "server_name",
            Field::ToolName => "tool_name",
            Field::Arguments => "arguments",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn expected_shape(field: &Field) -> &'static str {
    match field {
        Field::Arguments => "a mapping",
        Field::ServerName | Field::ToolName => "a scalar",
    }
}

/// Why a single tool-call block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("missing required field '{0}'")]
    MissingField(Field),
    #[error("'{field}' is not valid JSON: {detail}")]
    MalformedJson { field: Field, detail: String },
    #[error("'{field}' has invalid format: {value:?}")]
    InvalidFormat { field: Field, value: String },
    #[error("'{0}' must be {shape}", shape = expected_shape(.0))]
    InvalidStructure(Field),
}

impl FailureReason {
    /// Stable reason code, e.g. `missing-field`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            FailureReason::MissingField(_) => "missing-field",
            FailureReason::MalformedJson { .. } => "malformed-json",
            FailureReason::InvalidFormat { .. } => "invalid-format",
            FailureReason::InvalidStructure(_) => "invalid-structure",
        }
    }

    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            FailureReason::MissingField(field)
            | FailureReason::InvalidStructure(field)
            | FailureReason::MalformedJson { field, .. }
            | FailureReason::InvalidFormat { field, .. } => *field,
        }
    }
}

/// Recoverable failure scoped to one tool-call block.
///
/// Carries the offending raw block so callers can log or replay it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ParseFailure {
    reason: FailureReason,
    raw_text: String,
}

impl ParseFailure {
    #[must_use]
    pub fn new(reason: FailureReason, raw_text: impl Into<String>) -> Self {
        Self {
            reason,
            raw_text: raw_text.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &FailureReason {
        &self.reason
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.reason.code()
    }

    #[must_use]
    pub fn field(&self) -> Field {
        self.reason.field()
    }

    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

/// Error returned by block building and batch extraction.
///
/// `Parse` is expected on malformed model output and is skipped by the batch
/// extractor. `Internal` signals a broken invariant and aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum ToolCallError {
    #[error("Tool-call parse failure: {0}")]
    Parse(#[from] ParseFailure),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolCallError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolCallError::Parse(_) => ErrorCategory::InvalidRequest,
            ToolCallError::Internal(_) => ErrorCategory::ServerError,
        }
    }
}

/// Broad error category for status code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    ServerError,
}

fn http_status_for_category(cat: ErrorCategory) -> http::StatusCode {
    match cat {
        ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
        ErrorCategory::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Format an error as (`status_code`, JSON body) for the HTTP surface.
#[must_use]
pub fn format_error(err: &ToolCallError) -> (http::StatusCode, serde_json::Value) {
    let status = http_status_for_category(err.category());
    let body = match err {
        ToolCallError::Parse(failure) => json!({
            "error": {
                "code": failure.code(),
                "field": failure.field(),
                "message": failure.to_string(),
            }
        }),
        ToolCallError::Internal(message) => json!({
            "error": {
                "code": "internal",
                "message": message,
            }
        }),
    };
    (status, body)
}

impl axum::response::IntoResponse for ToolCallError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = format_error(&self);
        (status, axum::Json(body)).into_response()
    }
}
