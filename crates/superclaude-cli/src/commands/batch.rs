//! Batch command implementation

use std::io::Read;
use std::path::Path;

use superclaude_bridge::{AgentBridge, AgentCoordinator, AgentTask};
use tracing::debug;

use super::print_json;
use crate::error::Result;

/// Read the task array from `file`, or stdin when `file` is `-`.
pub fn read_tasks(file: &Path) -> Result<Vec<AgentTask>> {
    let content = if file == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        content
    } else {
        std::fs::read_to_string(file)?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Run every task in `file` and print the results in order.
pub fn run_batch(bridge: &AgentBridge, file: &Path, parallel: bool) -> Result<bool> {
    let tasks = read_tasks(file)?;
    debug!(tasks = tasks.len(), parallel, "Running batch");

    let coordinator = AgentCoordinator::new(bridge);
    let results = if parallel {
        coordinator.run_parallel(&tasks)?
    } else {
        coordinator.run_sequential(&tasks)?
    };

    print_json(&results)?;
    Ok(results.iter().all(|r| !r.is_error()))
}
