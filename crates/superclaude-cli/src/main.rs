//! SuperClaude CLI
//!
//! Invokes SuperClaude agents through the agent bridge.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use superclaude_bridge::{AgentBridge, SuperClaudeConfig, logging};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    let Some(command) = cli.command.clone() else {
        // No command provided - show help hint
        println!("{} SuperClaude agent bridge", "superclaude".green().bold());
        println!();
        println!("Run {} for available commands.", "superclaude --help".cyan());
        return Ok(true);
    };

    let config = SuperClaudeConfig::load(cli.config.as_deref(), &cli.host_options())?;

    let level = if cli.verbose { "DEBUG" } else { config.log_level() };
    if let Err(e) = logging::init(level) {
        eprintln!("{}: failed to initialise logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(project_root = %config.project_root().display(), "Configuration loaded");

    execute_command(command, config)
}

fn execute_command(cmd: Commands, config: SuperClaudeConfig) -> Result<bool> {
    match cmd {
        Commands::Config => commands::run_config(&config),
        Commands::Invoke {
            agent,
            action,
            params,
        } => commands::run_invoke(&AgentBridge::new(config), &agent, &action, &params),
        Commands::Batch { file, parallel } => {
            commands::run_batch(&AgentBridge::new(config), &file, parallel)
        }
        Commands::Check { json } => commands::run_check(&AgentBridge::new(config), json),
    }
}
