use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message reported when no response was received at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Message reported when a required form field is empty.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields.";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Where a failure came from. Callers mostly only need `message`, but the
/// kind lets them tell a rejected token apart from a dropped connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required field was empty; no request was sent.
    Validation,
    /// The service answered with a non-2xx status.
    Rejected { status: u16 },
    /// The request never produced a response.
    Network,
    /// A 2xx response without the expected payload.
    UnexpectedResponse,
}

/// The single error shape every API operation reports.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    #[serde(skip)]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

/// Structured rejection body sent by the service. Some handlers nest it one
/// level down under `data`. `errors` is usually a field map but validators
/// may send a list, which carries no per-field detail.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<Value>,
    data: Option<Value>,
}

impl ErrorBody {
    /// The server's message (if any) and its field errors. `None` when the
    /// body carries neither at this level or under `data`.
    fn into_parts(self) -> Option<(Option<String>, BTreeMap<String, String>)> {
        let field_errors: BTreeMap<String, String> = match self.errors {
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(field, value)| {
                    let text = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (field, text)
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        if self.message.is_some() || !field_errors.is_empty() {
            return Some((self.message, field_errors));
        }
        self.data
            .and_then(|nested| serde_json::from_value::<ErrorBody>(nested).ok())
            .and_then(ErrorBody::into_parts)
    }
}

impl ApiError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// A missing-field error for each of `fields`, raised before any request.
    pub fn missing_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let field_errors = fields
            .into_iter()
            .map(|field| (field.to_string(), format!("{} is required", field)))
            .collect();
        Self {
            kind: ErrorKind::Validation,
            message: MISSING_FIELDS_MESSAGE.to_string(),
            field_errors,
        }
    }

    pub fn network() -> Self {
        Self::new(ErrorKind::Network, NETWORK_ERROR_MESSAGE)
    }

    pub fn unexpected_response(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorKind::UnexpectedResponse,
            format!("Unexpected response from server: {}", detail),
        )
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Build an error from a non-2xx response. The server's message wins when
    /// the body has one; otherwise the message is derived from the status
    /// code. Field errors are kept either way.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let (server_message, field_errors) = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_parts)
            .unwrap_or_default();

        let message = match server_message {
            Some(message) => message,
            None if !field_errors.is_empty() => Self::status_message(status, ""),
            None => Self::status_message(status, body),
        };

        Self {
            kind: ErrorKind::Rejected {
                status: status.as_u16(),
            },
            message,
            field_errors,
        }
    }

    fn status_message(status: StatusCode, body: &str) -> String {
        let truncated = Self::truncate_body(body.trim());
        let with_body = |prefix: &str| {
            if truncated.is_empty() {
                prefix.to_string()
            } else {
                format!("{}: {}", prefix, truncated)
            }
        };
        match status.as_u16() {
            401 => "Unauthorized - token may be expired".to_string(),
            403 => with_body("Access denied"),
            404 => with_body("Resource not found"),
            429 => "Rate limited - please wait before retrying".to_string(),
            500..=599 => with_body("Server error"),
            _ => with_body(&format!("Request failed with status {}", status.as_u16())),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::Rejected { status } => Some(status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Text for an error dialog: the message, followed by the password or
    /// else the username field error when the service sent one.
    pub fn user_message(&self) -> String {
        match self
            .field_error("password")
            .or_else(|| self.field_error("username"))
        {
            Some(detail) => format!("{}: {}", self.message, detail),
            None => self.message.clone(),
        }
    }
}
