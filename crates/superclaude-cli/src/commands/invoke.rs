//! Invoke command implementation

use superclaude_bridge::{AgentBridge, Params};

use super::print_json;
use crate::error::{CliError, Result};

/// Parse `--params` text into a parameter map.
pub fn parse_params(text: &str) -> Result<Params> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(params) => Ok(params),
        other => Err(CliError::user(format!(
            "--params must be a JSON object, got: {}",
            other
        ))),
    }
}

/// Invoke `action` on `agent` and print the result.
pub fn run_invoke(bridge: &AgentBridge, agent: &str, action: &str, params: &str) -> Result<bool> {
    let params = parse_params(params)?;
    let result = bridge.invoke_agent(agent, action, params)?;
    print_json(&result)?;
    Ok(!result.is_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_object() {
        let params = parse_params(r#"{"path": "src", "depth": 2}"#).unwrap();
        assert_eq!(params["path"], "src");
        assert_eq!(params["depth"], 2);
    }

    #[test]
    fn test_parse_params_rejects_array() {
        let err = parse_params("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_parse_params_rejects_garbage() {
        assert!(matches!(parse_params("{oops"), Err(CliError::Json(_))));
    }
}
