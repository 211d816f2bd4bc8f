//! Single-agent client
//!
//! An [`AgentClient`] knows how to start one agent and turn whatever the
//! process did into an [`InvocationResult`]. It makes exactly one attempt;
//! retrying is the bridge's job.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::{AgentConfig, SuperClaudeConfig};
use crate::error::BridgeError;
use crate::runner::{ProcessOutput, ProcessRunner};
use crate::types::{FailureKind, InvocationRequest, InvocationResult, Params};
use crate::validation::{AgentResponse, parse_response};

/// Message used when stdout is not a usable response
pub const INVALID_RESPONSE: &str = "invalid response";

/// Message used for a failed exit with nothing on stderr
pub const NON_ZERO_EXIT: &str = "non-zero exit";

/// Client for one configured agent
#[derive(Clone)]
pub struct AgentClient {
    name: String,
    command: Vec<String>,
    timeout: Duration,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentClient")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AgentClient {
    /// Build a client for `agent` using the runtime and timeout from `config`
    pub fn new(agent: &AgentConfig, config: &SuperClaudeConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let mut command = Vec::with_capacity(2 + config.runtime_args().len());
        command.push(config.runtime().to_string());
        command.push(agent.executable_path.display().to_string());
        command.extend(config.runtime_args().iter().cloned());

        Self {
            name: agent.name.clone(),
            command,
            timeout: config.agent_timeout(),
            runner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command line used for every invocation
    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make one attempt at `action`
    pub fn invoke(&self, action: &str, params: Params) -> InvocationResult {
        let request = InvocationRequest::new(action, params);
        let input = match request.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                return InvocationResult::error(
                    FailureKind::InvalidRequest,
                    format!("invalid request: {}", e),
                );
            }
        };

        debug!(agent = %self.name, action, "Invoking agent");
        match self.runner.run(&self.command, &input, self.timeout) {
            Ok(output) => self.interpret(output),
            Err(BridgeError::ProcessSpawn { program, source }) => InvocationResult::error(
                FailureKind::Spawn,
                format!("failed to spawn '{}': {}", program, source),
            ),
            Err(e) => InvocationResult::error(FailureKind::Runner, format!("runner failed: {}", e)),
        }
    }

    fn interpret(&self, output: ProcessOutput) -> InvocationResult {
        let diagnostics = output.diagnostics();

        if output.timed_out {
            return InvocationResult::error(
                FailureKind::Timeout,
                format!("timed out after {}s", format_secs(self.timeout)),
            )
            .with_diagnostics(diagnostics);
        }

        let parsed = parse_response(&output.stdout);
        if let Err(e) = &parsed {
            debug!(agent = %self.name, returncode = output.returncode, reason = %e, "Agent output is not a valid response");
        }

        let result = match parsed {
            Ok(AgentResponse::Error(message)) => {
                InvocationResult::error(FailureKind::Application, message)
            }
            Ok(AgentResponse::Success(data)) if output.returncode == 0 => {
                InvocationResult::success(data)
            }
            _ if output.returncode != 0 => {
                let stderr = output.stderr.trim();
                let message = if stderr.is_empty() { NON_ZERO_EXIT } else { stderr };
                InvocationResult::error(FailureKind::NonZeroExit, message)
            }
            _ => InvocationResult::error(FailureKind::MalformedResponse, INVALID_RESPONSE),
        };
        result.with_diagnostics(diagnostics)
    }
}

fn format_secs(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.1}", duration.as_secs_f64())
    }
}
