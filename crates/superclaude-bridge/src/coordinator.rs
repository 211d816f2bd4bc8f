//! Multi-task coordination
//!
//! Runs a list of agent tasks through one [`AgentBridge`] and returns the
//! results in task order.

use serde::Deserialize;
use tracing::debug;

use crate::bridge::AgentBridge;
use crate::error::Result;
use crate::types::{InvocationResult, Params};

/// One `(agent, action, params)` unit of work
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentTask {
    pub agent: String,
    pub action: String,
    #[serde(default)]
    pub params: Params,
}

impl AgentTask {
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Runs batches of tasks against a bridge
#[derive(Debug, Clone, Copy)]
pub struct AgentCoordinator<'a> {
    bridge: &'a AgentBridge,
}

impl<'a> AgentCoordinator<'a> {
    pub fn new(bridge: &'a AgentBridge) -> Self {
        Self { bridge }
    }

    /// Run `tasks` one after another
    ///
    /// Every agent name is checked before anything runs, so an unknown
    /// name fails the batch without spawning a process.
    pub fn run_sequential(&self, tasks: &[AgentTask]) -> Result<Vec<InvocationResult>> {
        for task in tasks {
            self.bridge.client(&task.agent)?;
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            debug!(index, agent = %task.agent, action = %task.action, "Running task");
            results.push(
                self.bridge
                    .invoke_agent(&task.agent, &task.action, task.params.clone())?,
            );
        }
        Ok(results)
    }

    /// Run `tasks` and return results in task order
    ///
    /// Currently executes sequentially; callers must not rely on
    /// concurrency.
    pub fn run_parallel(&self, tasks: &[AgentTask]) -> Result<Vec<InvocationResult>> {
        self.run_sequential(tasks)
    }
}
