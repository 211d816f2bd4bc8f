//! Check command implementation

use colored::Colorize;
use superclaude_bridge::{AgentBridge, HealthReport};

use super::print_json;
use crate::error::Result;

/// Print the health report; fails when the agent subsystem is unavailable.
pub fn run_check(bridge: &AgentBridge, json: bool) -> Result<bool> {
    let report = bridge.health_check();
    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report.available)
}

fn print_report(report: &HealthReport) {
    println!("{}", "Agent Health".bold());
    println!();

    let version = report
        .runtime_version
        .as_deref()
        .map(|v| v.green().to_string())
        .unwrap_or_else(|| "not found".red().to_string());
    println!("{}:  {} ({})", "Runtime".dimmed(), report.runtime.cyan(), version);
    println!();

    println!("{}:", "Agents".bold());
    for agent in &report.agents {
        let marker = match (agent.enabled, agent.entry_exists) {
            (false, _) => "-".dimmed(),
            (true, true) => "+".green(),
            (true, false) => "x".red(),
        };
        let state = if agent.enabled { "enabled" } else { "disabled" };
        println!("  {} {} ({}) {}", marker, agent.name.cyan(), state, agent.path.dimmed());
    }

    if !report.messages.is_empty() {
        println!();
        for message in &report.messages {
            println!("{} {}", "note:".yellow().bold(), message);
        }
    }

    println!();
    if report.available {
        println!("{} Agents available", "OK".green().bold());
    } else {
        println!("{} Agents unavailable", "FAIL".red().bold());
    }
}
