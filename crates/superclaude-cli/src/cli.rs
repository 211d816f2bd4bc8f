//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use superclaude_bridge::HostOptions;

/// SuperClaude - Invoke SuperClaude agents from the command line
#[derive(Parser, Debug)]
#[command(name = "superclaude")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to superclaude.toml in the project root)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root containing the agent directories
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Disable all agents; invocations are skipped
    #[arg(long, global = true)]
    pub no_agents: bool,

    /// Agent timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub agent_timeout: Option<u64>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Overrides that sit on top of file and environment configuration
    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            no_agents: self.no_agents,
            agent_timeout: self.agent_timeout,
            project_root: self.project_root.clone(),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Invoke one action on an agent and print the result as JSON
    ///
    /// Exits with status 1 when the result is an error.
    ///
    /// Examples:
    ///   superclaude invoke pm track_tasks
    ///   superclaude invoke index search --params '{"query": "main"}'
    Invoke {
        /// Agent name (pm, research, index, ...)
        agent: String,

        /// Action understood by the agent
        action: String,

        /// Action parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// Run a JSON array of {"agent", "action", "params"} tasks
    ///
    /// Prints the results as a JSON array in task order. Exits with status 1
    /// when any result is an error.
    Batch {
        /// File containing the task array, or - for stdin
        file: PathBuf,

        /// Use the parallel runner (currently sequential)
        #[arg(long)]
        parallel: bool,
    },

    /// Check the runtime and agent entry points
    Check {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration as JSON
    Config,
}
