//! Error types for agent bridge operations

use std::path::PathBuf;

/// Errors that can occur during agent bridge operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The requested agent name has no configuration entry
    #[error("Unknown agent '{name}'. Configured agents: {}", known.join(", "))]
    UnknownAgent {
        /// The name that was requested
        name: String,
        /// Names that are configured
        known: Vec<String>,
    },

    /// A configuration value could not be accepted
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// Configuration key (environment variable or TOML key)
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// A configuration file could not be parsed
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse {
        /// The file that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The agent process could not be started
    #[error("Failed to spawn '{program}': {source}")]
    ProcessSpawn {
        /// Program that was being launched
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The agent kept timing out until the retry budget was spent
    #[error("Agent '{agent}' timed out on '{action}' after {attempts} attempt(s)")]
    AgentTimeout {
        /// Agent name
        agent: String,
        /// Requested action
        action: String,
        /// Attempts made, including the first
        attempts: u32,
    },

    /// The agent kept failing transiently until the retry budget was spent
    #[error("Agent '{agent}' failed on '{action}' after {attempts} attempt(s): {message}")]
    AgentInvocation {
        /// Agent name
        agent: String,
        /// Requested action
        action: String,
        /// Attempts made, including the first
        attempts: u32,
        /// Last failure reason
        message: String,
    },

    /// The agent itself reported an error
    #[error("Agent '{agent}' reported an error for '{action}': {message}")]
    AgentApplication {
        /// Agent name
        agent: String,
        /// Requested action
        action: String,
        /// Error message from the agent
        message: String,
    },

    /// The agent is disabled and was not run
    #[error("Agent '{agent}' is disabled")]
    AgentSkipped {
        /// Agent name
        agent: String,
    },

    /// I/O error outside of process spawning
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    pub(crate) fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for agent bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
