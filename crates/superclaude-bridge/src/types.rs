//! Shared types for agent invocations

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Parameters passed to an agent action
pub type Params = Map<String, Value>;

/// A single request written to an agent's stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Action the agent should perform (e.g., "track_tasks")
    pub action: String,
    /// Action parameters
    #[serde(default)]
    pub params: Params,
}

impl InvocationRequest {
    /// Create a request for the given action
    pub fn new(action: impl Into<String>, params: Params) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }

    /// Serialize to the single-line JSON document sent on stdin
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The process could not be started
    Spawn,
    /// The process started but the runner failed while driving it
    Runner,
    /// The process exceeded its timeout and was killed
    Timeout,
    /// Non-zero exit without an error-shaped response
    NonZeroExit,
    /// Stdout was not a valid agent response
    MalformedResponse,
    /// The agent answered with a well-formed error
    Application,
    /// The request could not be encoded
    InvalidRequest,
}

impl FailureKind {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Spawn
                | Self::Runner
                | Self::Timeout
                | Self::NonZeroExit
                | Self::MalformedResponse
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn => write!(f, "spawn"),
            Self::Runner => write!(f, "runner"),
            Self::Timeout => write!(f, "timeout"),
            Self::NonZeroExit => write!(f, "non-zero-exit"),
            Self::MalformedResponse => write!(f, "malformed-response"),
            Self::Application => write!(f, "application"),
            Self::InvalidRequest => write!(f, "invalid-request"),
        }
    }
}

/// Caller-facing outcome of an invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The agent completed the action
    Success {
        /// Payload returned by the agent
        data: Params,
    },
    /// The invocation failed
    Error {
        /// Failure reason
        error: String,
    },
    /// The agent is disabled; no process was started
    Skipped,
}

/// Raw process output kept for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDiagnostics {
    /// Exit code (`-1` for timeouts and signals)
    pub returncode: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

/// Result of invoking an agent
///
/// Serializes to the flat mapping callers assert on, e.g.
/// `{"status": "success", "data": {...}, "attempts": 1}`. The failure
/// classification and raw process output are kept out of that mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    /// Status and payload
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Attempts made; absent for skipped invocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Why the last attempt failed, if it did
    #[serde(skip)]
    pub failure: Option<FailureKind>,
    /// Raw output of the last attempt, if a process ran
    #[serde(skip)]
    pub diagnostics: Option<ProcessDiagnostics>,
}

impl InvocationResult {
    /// A successful single attempt
    pub fn success(data: Params) -> Self {
        Self {
            outcome: Outcome::Success { data },
            attempts: Some(1),
            failure: None,
            diagnostics: None,
        }
    }

    /// A failed single attempt
    pub fn error(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error {
                error: message.into(),
            },
            attempts: Some(1),
            failure: Some(kind),
            diagnostics: None,
        }
    }

    /// An invocation that was not run because the agent is disabled
    pub fn skipped() -> Self {
        Self {
            outcome: Outcome::Skipped,
            attempts: None,
            failure: None,
            diagnostics: None,
        }
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: ProcessDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Status string: "success", "error" or "skipped"
    pub fn status(&self) -> &'static str {
        match self.outcome {
            Outcome::Success { .. } => "success",
            Outcome::Error { .. } => "error",
            Outcome::Skipped => "skipped",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped)
    }

    /// Success payload, if any
    pub fn data(&self) -> Option<&Params> {
        match &self.outcome {
            Outcome::Success { data } => Some(data),
            _ => None,
        }
    }

    /// Failure reason, if any
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error { error } => Some(error),
            _ => None,
        }
    }

    /// True when the last attempt failed in a way worth retrying
    pub fn is_transient_failure(&self) -> bool {
        self.failure.is_some_and(FailureKind::is_transient)
    }

    /// The caller-facing mapping as a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "status": "error", "error": "unserializable result" })
        })
    }

    /// Convert into a `Result`, mapping failures onto the error taxonomy
    ///
    /// Exhausted timeouts become [`BridgeError::AgentTimeout`], other
    /// transient failures [`BridgeError::AgentInvocation`], agent-reported
    /// errors [`BridgeError::AgentApplication`] and skipped invocations
    /// [`BridgeError::AgentSkipped`].
    pub fn into_result(self, agent: &str, action: &str) -> Result<Params> {
        let attempts = self.attempts.unwrap_or(0);
        match self.outcome {
            Outcome::Success { data } => Ok(data),
            Outcome::Skipped => Err(BridgeError::AgentSkipped {
                agent: agent.to_string(),
            }),
            Outcome::Error { error } => match self.failure {
                Some(FailureKind::Timeout) => Err(BridgeError::AgentTimeout {
                    agent: agent.to_string(),
                    action: action.to_string(),
                    attempts,
                }),
                Some(FailureKind::Application) => Err(BridgeError::AgentApplication {
                    agent: agent.to_string(),
                    action: action.to_string(),
                    message: error,
                }),
                _ => Err(BridgeError::AgentInvocation {
                    agent: agent.to_string(),
                    action: action.to_string(),
                    attempts,
                    message: error,
                }),
            },
        }
    }
}

/// Health of a single configured agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHealth {
    /// Agent name
    pub name: String,
    /// Whether invocations will run (agent and global switch enabled)
    pub enabled: bool,
    /// Configured entry point
    pub path: String,
    /// Whether the entry point exists on disk
    pub entry_exists: bool,
}

/// Health report for the agent subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// True when the runtime responds and every enabled agent has an entry point
    pub available: bool,
    /// Runtime interpreter program
    pub runtime: String,
    /// Runtime version string, if the probe succeeded
    pub runtime_version: Option<String>,
    /// Per-agent status, ordered by name
    pub agents: Vec<AgentHealth>,
    /// Human-readable status messages
    pub messages: Vec<String>,
}
