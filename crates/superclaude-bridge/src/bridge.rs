//! The agent bridge
//!
//! [`AgentBridge`] is the single entry point test code uses to talk to
//! agents. Each call walks the same path:
//!
//! 1. **Lookup**: the name must be configured, otherwise
//!    [`BridgeError::UnknownAgent`] is returned and nothing is spawned.
//! 2. **Disabled short-circuit**: a disabled agent (or all agents disabled)
//!    yields a `skipped` result without spawning.
//! 3. **Dispatch**: the agent's [`AgentClient`] makes one attempt.
//! 4. **Retry**: transient failures are retried immediately, at most
//!    `agent_retry_count` times. Agent-reported errors are returned as-is.
//! 5. **Return**: the last result, with the attempt count filled in.
//!
//! One metrics observation is recorded per call that gets past lookup.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::client::AgentClient;
use crate::config::SuperClaudeConfig;
use crate::error::{BridgeError, Result};
use crate::metrics::{InMemoryMetrics, MetricsSink, Observation};
use crate::runner::{ProcessRunner, SubprocessRunner};
use crate::types::{AgentHealth, HealthReport, InvocationResult, Params};

/// Timeout for the runtime version probe in [`AgentBridge::health_check`]
const RUNTIME_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves agent names to clients and applies the invocation policy
#[derive(Clone)]
pub struct AgentBridge {
    config: SuperClaudeConfig,
    clients: BTreeMap<String, AgentClient>,
    runner: Arc<dyn ProcessRunner>,
    metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for AgentBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBridge")
            .field("config", &self.config)
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

impl AgentBridge {
    /// Bridge running real subprocesses and counting into [`InMemoryMetrics`]
    pub fn new(config: SuperClaudeConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a bridge with injected collaborators
    pub fn builder(config: SuperClaudeConfig) -> AgentBridgeBuilder {
        AgentBridgeBuilder {
            config,
            runner: None,
            metrics: None,
        }
    }

    pub fn config(&self) -> &SuperClaudeConfig {
        &self.config
    }

    /// Metrics sink shared with this bridge
    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    /// Configured agent names, ordered
    pub fn agent_names(&self) -> Vec<&str> {
        self.clients.keys().map(String::as_str).collect()
    }

    /// Client for a configured agent
    pub fn client(&self, agent_name: &str) -> Result<&AgentClient> {
        self.clients
            .get(agent_name)
            .ok_or_else(|| BridgeError::UnknownAgent {
                name: agent_name.to_string(),
                known: self.clients.keys().cloned().collect(),
            })
    }

    /// Invoke `action` on `agent_name`
    ///
    /// Only an unknown agent name is an error. Process failures, timeouts
    /// and agent-reported errors all come back as an `error` result;
    /// disabled agents come back as `skipped`.
    pub fn invoke_agent(
        &self,
        agent_name: &str,
        action: &str,
        params: Params,
    ) -> Result<InvocationResult> {
        let client = self.client(agent_name)?;
        let started = Instant::now();

        if !self.config.is_agent_active(agent_name) {
            debug!(agent = agent_name, action, "Agent disabled, skipping");
            let result = InvocationResult::skipped();
            self.observe(agent_name, action, &result, started.elapsed());
            return Ok(result);
        }

        let max_attempts = self.config.agent_retry_count().saturating_add(1);
        let mut attempt = 1;
        let result = loop {
            let result = client.invoke(action, params.clone());
            if !result.is_transient_failure() || attempt >= max_attempts {
                break result.with_attempts(attempt);
            }
            warn!(
                agent = agent_name,
                action,
                attempt,
                max_attempts,
                failure = ?result.failure,
                error = result.error_message().unwrap_or_default(),
                "Transient agent failure, retrying"
            );
            attempt += 1;
        };

        let elapsed = started.elapsed();
        if result.is_transient_failure() {
            warn!(
                agent = agent_name,
                action,
                attempts = attempt,
                error = result.error_message().unwrap_or_default(),
                "Agent invocation failed after exhausting retries"
            );
        } else {
            info!(
                agent = agent_name,
                action,
                status = result.status(),
                attempts = attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "Agent invocation finished"
            );
        }
        self.observe(agent_name, action, &result, elapsed);
        Ok(result)
    }

    fn observe(&self, agent: &str, action: &str, result: &InvocationResult, latency: Duration) {
        self.metrics.record(&Observation {
            agent,
            action,
            status: result.status(),
            attempts: result.attempts.unwrap_or(0),
            latency,
        });
    }

    /// Report on the runtime and every configured agent
    ///
    /// Probes the runtime with `<runtime> --version`. Does not invoke any
    /// agent.
    pub fn health_check(&self) -> HealthReport {
        let mut messages = Vec::new();
        let runtime = self.config.runtime().to_string();

        let probe = vec![runtime.clone(), "--version".to_string()];
        let runtime_version = match self.runner.run(&probe, "", RUNTIME_PROBE_TIMEOUT) {
            Ok(output) if output.returncode == 0 && !output.timed_out => {
                let version = output.stdout.trim().to_string();
                messages.push(format!("Runtime found: {} ({})", runtime, version));
                Some(version)
            }
            Ok(output) => {
                messages.push(format!(
                    "Runtime '{}' did not report a version (exit code {})",
                    runtime, output.returncode
                ));
                None
            }
            Err(e) => {
                messages.push(format!("Runtime '{}' not available: {}", runtime, e));
                None
            }
        };

        if !self.config.agents_enabled() {
            messages.push("All agents are disabled".to_string());
        }

        let agents: Vec<AgentHealth> = self
            .config
            .agents()
            .map(|agent| {
                let entry_exists = agent.executable_path.is_file();
                let enabled = self.config.is_agent_active(&agent.name);
                if enabled && !entry_exists {
                    messages.push(format!(
                        "Agent '{}' entry point not found at {}",
                        agent.name,
                        agent.executable_path.display()
                    ));
                }
                AgentHealth {
                    name: agent.name.clone(),
                    enabled,
                    path: agent.executable_path.display().to_string(),
                    entry_exists,
                }
            })
            .collect();

        let available = runtime_version.is_some()
            && agents.iter().all(|a| !a.enabled || a.entry_exists);

        HealthReport {
            available,
            runtime,
            runtime_version,
            agents,
            messages,
        }
    }
}

/// Builder for [`AgentBridge`]
pub struct AgentBridgeBuilder {
    config: SuperClaudeConfig,
    runner: Option<Arc<dyn ProcessRunner>>,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl AgentBridgeBuilder {
    /// Use `runner` instead of spawning real subprocesses
    pub fn runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Record into `metrics` instead of a private [`InMemoryMetrics`]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> AgentBridge {
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(SubprocessRunner::new().with_working_dir(self.config.project_root())));
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(InMemoryMetrics::new()));

        let clients = self
            .config
            .agents()
            .map(|agent| {
                let client = AgentClient::new(agent, &self.config, Arc::clone(&runner));
                (agent.name.clone(), client)
            })
            .collect();

        AgentBridge {
            config: self.config,
            clients,
            runner,
            metrics,
        }
    }
}
