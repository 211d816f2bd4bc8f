//! Agent response validation
//!
//! Agents answer with a single JSON object on stdout:
//!
//! ```json
//! {"status": "success", "data": {"count": 3}}
//! {"status": "error", "error": "symbolId is required"}
//! ```
//!
//! The functions here turn that loosely-typed document into an
//! [`AgentResponse`] or explain why it is not one. They never panic.

use serde_json::Value;

use crate::types::Params;

/// A well-formed agent response
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// `{"status": "success", "data": {...}}`
    Success(Params),
    /// `{"status": "error", "error": "..."}`
    Error(String),
}

/// Why a document is not a well-formed agent response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response has no string 'status' field")]
    MissingStatus,

    #[error("unrecognized status '{0}'")]
    UnknownStatus(String),

    #[error("success response has no 'data' object")]
    MissingData,

    #[error("error response has no non-empty 'error' string")]
    MissingErrorMessage,
}

/// Validate a decoded agent response
///
/// Error responses carry their message in a top-level `error` string. A
/// `data.error` string is accepted as well, since agents built on the
/// shared request handler report unknown actions that way.
pub fn validate_response(value: &Value) -> Result<AgentResponse, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
    let status = object
        .get("status")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingStatus)?;

    match status {
        "success" => object
            .get("data")
            .and_then(Value::as_object)
            .map(|data| AgentResponse::Success(data.clone()))
            .ok_or(ValidationError::MissingData),
        "error" => error_message(object)
            .map(|message| AgentResponse::Error(message.to_string()))
            .ok_or(ValidationError::MissingErrorMessage),
        other => Err(ValidationError::UnknownStatus(other.to_string())),
    }
}

fn error_message(object: &Params) -> Option<&str> {
    object.get("error").and_then(non_empty_str).or_else(|| {
        object
            .get("data")
            .and_then(|data| data.get("error"))
            .and_then(non_empty_str)
    })
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

/// Decode and validate raw agent stdout
///
/// The whole (trimmed) output is tried first. If it is not JSON, the last
/// non-empty line is tried, which covers agents that print log lines
/// before their response.
pub fn parse_response(stdout: &str) -> Result<AgentResponse, ValidationError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidJson("empty output".to_string()));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => validate_response(&value),
        Err(whole_err) => {
            let last_line = trimmed.lines().rev().map(str::trim).find(|l| !l.is_empty());
            match last_line {
                Some(line) if line != trimmed => serde_json::from_str::<Value>(line)
                    .map_err(|e| ValidationError::InvalidJson(e.to_string()))
                    .and_then(|value| validate_response(&value)),
                _ => Err(ValidationError::InvalidJson(whole_err.to_string())),
            }
        }
    }
}
