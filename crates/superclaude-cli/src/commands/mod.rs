//! Command implementations for superclaude-cli
//!
//! Each command returns `Ok(true)` when it succeeded and `Ok(false)` when it
//! ran but should exit with a failure status.

pub mod batch;
pub mod check;
pub mod config;
pub mod invoke;

pub use batch::run_batch;
pub use check::run_check;
pub use config::run_config;
pub use invoke::run_invoke;

use crate::error::Result;

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
