//! [`TestProject`] builder for bridge test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use superclaude_bridge::{AgentBridge, ConfigBuilder, SuperClaudeConfig};
use tempfile::TempDir;

/// A temporary project directory with shell-script agents.
///
/// Agents live at `<root>/<name>/dist/index.js`, the same layout the real
/// agents use, but contain `sh` scripts. [`TestProject::config_builder`]
/// selects `sh` as the runtime.
///
/// # Example
///
/// ```rust,no_run
/// use superclaude_test_utils::{TestProject, scripts};
///
/// let project = TestProject::new();
/// project.write_agent("pm", &scripts::respond(r#"{"status":"success","data":{}}"#));
/// let bridge = project.bridge();
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary project.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of `relative` inside the project.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Install `script` as the entry point of agent `name`.
    pub fn write_agent(&self, name: &str, script: &str) -> PathBuf {
        let dist = self.root().join(name).join("dist");
        fs::create_dir_all(&dist).unwrap();
        let entry = dist.join("index.js");
        fs::write(&entry, script).unwrap();
        entry
    }

    /// Install `script` for every default agent.
    pub fn write_default_agents(&self, script: &str) {
        for name in superclaude_bridge::config::DEFAULT_AGENTS {
            self.write_agent(name, script);
        }
    }

    /// Write `superclaude.toml` in the project root.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.root().join(superclaude_bridge::config::CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    /// Config builder rooted here, running agents with `sh`.
    ///
    /// Retries are off and the timeout is 5 seconds; tests opt back in.
    pub fn config_builder(&self) -> ConfigBuilder {
        SuperClaudeConfig::builder(self.root())
            .runtime("sh")
            .agent_timeout_secs(5)
            .agent_retry_count(0)
    }

    /// Built configuration from [`Self::config_builder`].
    pub fn config(&self) -> SuperClaudeConfig {
        self.config_builder().build().unwrap()
    }

    /// Bridge over real subprocesses with [`Self::config`].
    pub fn bridge(&self) -> AgentBridge {
        AgentBridge::new(self.config())
    }

    /// Read a small counter file written by [`crate::scripts::flaky`].
    ///
    /// Returns 0 when the file does not exist.
    pub fn read_counter(&self, path: &Path) -> u32 {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }
}
