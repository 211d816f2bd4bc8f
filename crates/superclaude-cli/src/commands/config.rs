//! Config command implementation

use superclaude_bridge::SuperClaudeConfig;

use super::print_json;
use crate::error::Result;

/// Print the resolved configuration as a flat JSON object.
pub fn run_config(config: &SuperClaudeConfig) -> Result<bool> {
    print_json(&config.to_map())?;
    Ok(true)
}
