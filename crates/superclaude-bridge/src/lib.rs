//! Agent invocation bridge for SuperClaude
//!
//! Test code calls named agents (`pm`, `research`, `index`) through an
//! [`AgentBridge`]. Each agent is an external program speaking a one-shot
//! JSON protocol: the bridge writes `{"action", "params"}` to its stdin and
//! reads a `{"status", ...}` response from its stdout.
//!
//! The bridge never lets a broken agent crash the caller. Spawn failures,
//! timeouts, bad exits and malformed output all come back as an `error`
//! [`InvocationResult`], after bounded retries for the transient ones.
//! Disabled agents come back as `skipped`. Only an unknown agent name is a
//! [`BridgeError`].
//!
//! ```no_run
//! use superclaude_bridge::{AgentBridge, Params, SuperClaudeConfig};
//!
//! let config = SuperClaudeConfig::from_env()?;
//! let bridge = AgentBridge::new(config);
//! let result = bridge.invoke_agent("pm", "track_tasks", Params::new())?;
//! println!("{}", result.to_value());
//! # Ok::<(), superclaude_bridge::BridgeError>(())
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod runner;
pub mod types;
pub mod validation;

pub use bridge::{AgentBridge, AgentBridgeBuilder};
pub use client::AgentClient;
pub use config::{AgentConfig, ConfigBuilder, HostOptions, SuperClaudeConfig};
pub use coordinator::{AgentCoordinator, AgentTask};
pub use error::{BridgeError, Result};
pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot, Observation, PrometheusMetrics};
pub use runner::{ProcessOutput, ProcessRunner, SubprocessRunner};
pub use types::{
    AgentHealth, FailureKind, HealthReport, InvocationRequest, InvocationResult, Outcome, Params,
    ProcessDiagnostics,
};
pub use validation::{AgentResponse, ValidationError, parse_response, validate_response};
