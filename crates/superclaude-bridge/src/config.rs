//! Bridge configuration
//!
//! [`SuperClaudeConfig`] is built once per process and then shared
//! read-only. Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a `superclaude.toml` file
//! 3. `SUPERCLAUDE_*` environment variables
//! 4. host options (command-line flags)
//!
//! Agent entry points default to `<project_root>/<name>/dist/<entry_file>`.
//!
//! # Example
//!
//! ```toml
//! agent_timeout = 60
//! runtime = "node"
//!
//! [agents.research]
//! enabled = false
//!
//! [agents.docs]
//! path = "tools/docs-agent/dist/index.js"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, Result};

/// Agents configured when nothing else is declared
pub const DEFAULT_AGENTS: [&str; 3] = ["pm", "research", "index"];

/// Prefix for environment variables
pub const ENV_PREFIX: &str = "SUPERCLAUDE_";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "superclaude.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_RUNTIME: &str = "node";
const DEFAULT_ENTRY_FILE: &str = "index.js";

const LOG_LEVELS: [&str; 7] = ["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL"];

/// Static configuration for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentConfig {
    /// Unique agent name
    pub name: String,
    /// Entry point passed to the runtime
    pub executable_path: PathBuf,
    /// Whether this agent may be invoked
    pub enabled: bool,
}

/// Options supplied by the host (command-line flags)
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Disable every agent
    pub no_agents: bool,
    /// Override the per-call timeout, in seconds
    pub agent_timeout: Option<u64>,
    /// Override the project root
    pub project_root: Option<PathBuf>,
}

/// Process-wide bridge configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SuperClaudeConfig {
    project_root: PathBuf,
    runtime: String,
    runtime_args: Vec<String>,
    entry_file: String,
    agents_enabled: bool,
    agent_timeout: Duration,
    agent_retry_count: u32,
    log_level: String,
    agents: BTreeMap<String, AgentConfig>,
}

impl SuperClaudeConfig {
    /// Default configuration rooted at `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let builder = ConfigBuilder::new(project_root);
        let project_root = absolute_root(&builder.project_root);
        Self {
            agents: builder.resolve_agents(&project_root),
            project_root,
            runtime: builder.runtime,
            runtime_args: builder.runtime_args,
            entry_file: builder.entry_file,
            agents_enabled: builder.agents_enabled,
            agent_timeout: Duration::from_secs(builder.agent_timeout_secs),
            agent_retry_count: builder.agent_retry_count,
            log_level: builder.log_level,
        }
    }

    /// Start building a configuration rooted at `project_root`
    pub fn builder(project_root: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new(project_root)
    }

    /// Layered configuration for the current process
    ///
    /// Same as [`Self::load`] with no explicit file and no host options:
    /// defaults, then `superclaude.toml` in the project root if present, then
    /// `SUPERCLAUDE_*` variables.
    pub fn from_env() -> Result<Self> {
        Self::load(None, &HostOptions::default())
    }

    /// Full layered load: defaults, optional file, environment, host options
    ///
    /// When `config_file` is `None`, `superclaude.toml` in the project root is
    /// used if it exists. The project root is taken from the host options,
    /// then `SUPERCLAUDE_PROJECT_ROOT`, then the current directory.
    pub fn load(config_file: Option<&Path>, host: &HostOptions) -> Result<Self> {
        Self::load_with(config_file, host, |key| std::env::var(key).ok())
    }

    /// [`Self::load`] with environment variables supplied by `lookup`
    pub fn load_with<F>(config_file: Option<&Path>, host: &HostOptions, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = match &host.project_root {
            Some(root) => root.clone(),
            None => match lookup(&format!("{}PROJECT_ROOT", ENV_PREFIX)) {
                Some(root) => PathBuf::from(root),
                None => std::env::current_dir()?,
            },
        };

        let mut builder = ConfigBuilder::new(&root);
        let default_file = root.join(CONFIG_FILE_NAME);
        match config_file {
            Some(path) => builder = builder.apply_file(path)?,
            None if default_file.is_file() => builder = builder.apply_file(&default_file)?,
            None => {}
        }

        builder.apply_env(lookup)?.apply_host(host).build()
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Interpreter used to run agent entry points
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    /// Fixed flags appended after the entry point
    pub fn runtime_args(&self) -> &[String] {
        &self.runtime_args
    }

    pub fn entry_file(&self) -> &str {
        &self.entry_file
    }

    /// Global switch; false when agents are disabled wholesale
    pub fn agents_enabled(&self) -> bool {
        self.agents_enabled
    }

    pub fn agent_timeout(&self) -> Duration {
        self.agent_timeout
    }

    /// Retries after the first attempt
    pub fn agent_retry_count(&self) -> u32 {
        self.agent_retry_count
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Look up an agent by name
    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    /// All configured agents, ordered by name
    pub fn agents(&self) -> impl Iterator<Item = &AgentConfig> {
        self.agents.values()
    }

    /// Whether an invocation of `name` would run a process
    pub fn is_agent_active(&self, name: &str) -> bool {
        self.agents_enabled && self.agent(name).is_some_and(|a| a.enabled)
    }

    /// Flat key/value view, with `agent_<name>_enabled` and `agent_<name>_path` entries
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert(
            "project_root".to_string(),
            Value::from(self.project_root.display().to_string()),
        );
        map.insert("runtime".to_string(), Value::from(self.runtime.clone()));
        map.insert("runtime_args".to_string(), Value::from(self.runtime_args.clone()));
        map.insert("entry_file".to_string(), Value::from(self.entry_file.clone()));
        map.insert("agents_enabled".to_string(), Value::from(self.agents_enabled));
        map.insert(
            "agent_timeout".to_string(),
            Value::from(self.agent_timeout.as_secs()),
        );
        map.insert(
            "agent_retry_count".to_string(),
            Value::from(self.agent_retry_count),
        );
        map.insert("log_level".to_string(), Value::from(self.log_level.clone()));

        for agent in self.agents.values() {
            map.insert(
                format!("agent_{}_enabled", agent.name),
                Value::from(agent.enabled),
            );
            map.insert(
                format!("agent_{}_path", agent.name),
                Value::from(agent.executable_path.display().to_string()),
            );
        }
        map
    }
}

/// Builder for [`SuperClaudeConfig`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    project_root: PathBuf,
    runtime: String,
    runtime_args: Vec<String>,
    entry_file: String,
    agents_enabled: bool,
    agent_timeout_secs: u64,
    agent_retry_count: u32,
    log_level: String,
    agent_names: Vec<String>,
    agent_paths: HashMap<String, PathBuf>,
    agent_enabled: HashMap<String, bool>,
}

impl ConfigBuilder {
    fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            runtime: DEFAULT_RUNTIME.to_string(),
            runtime_args: Vec::new(),
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
            agents_enabled: true,
            agent_timeout_secs: DEFAULT_TIMEOUT_SECS,
            agent_retry_count: DEFAULT_RETRY_COUNT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            agent_names: DEFAULT_AGENTS.iter().map(|s| s.to_string()).collect(),
            agent_paths: HashMap::new(),
            agent_enabled: HashMap::new(),
        }
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn runtime_arg(mut self, arg: impl Into<String>) -> Self {
        self.runtime_args.push(arg.into());
        self
    }

    pub fn entry_file(mut self, entry_file: impl Into<String>) -> Self {
        self.entry_file = entry_file.into();
        self
    }

    pub fn agents_enabled(mut self, enabled: bool) -> Self {
        self.agents_enabled = enabled;
        self
    }

    pub fn agent_timeout_secs(mut self, secs: u64) -> Self {
        self.agent_timeout_secs = secs;
        self
    }

    pub fn agent_retry_count(mut self, count: u32) -> Self {
        self.agent_retry_count = count;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Declare an agent with a derived entry point
    pub fn agent(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.agent_names.contains(&name) {
            self.agent_names.push(name);
        }
        self
    }

    /// Set an explicit entry point, declaring the agent if needed
    ///
    /// Relative paths are resolved against the project root.
    pub fn agent_path(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        self = self.agent(name.clone());
        self.agent_paths.insert(name, path.into());
        self
    }

    pub fn agent_enabled(mut self, name: impl Into<String>, enabled: bool) -> Self {
        let name = name.into();
        self = self.agent(name.clone());
        self.agent_enabled.insert(name, enabled);
        self
    }

    /// Drop every declared agent, including the defaults
    pub fn clear_agents(mut self) -> Self {
        self.agent_names.clear();
        self.agent_paths.clear();
        self.agent_enabled.clear();
        self
    }

    /// Layer values from a TOML config file
    pub fn apply_file(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.apply_toml(&content, base_dir)
            .map_err(|e| match e {
                BridgeError::ConfigParse { message, .. } => BridgeError::ConfigParse {
                    path: path.to_path_buf(),
                    message,
                },
                other => other,
            })
    }

    /// Layer values from TOML text; relative `project_root` resolves against `base_dir`
    pub fn apply_toml(mut self, content: &str, base_dir: &Path) -> Result<Self> {
        let file: FileConfig = toml::from_str(content).map_err(|e| BridgeError::ConfigParse {
            path: base_dir.join(CONFIG_FILE_NAME),
            message: e.to_string(),
        })?;

        if let Some(root) = file.project_root {
            self.project_root = base_dir.join(root);
        }
        if let Some(runtime) = file.runtime {
            self.runtime = runtime;
        }
        if let Some(args) = file.runtime_args {
            self.runtime_args = args;
        }
        if let Some(entry_file) = file.entry_file {
            self.entry_file = entry_file;
        }
        if let Some(enabled) = file.agents_enabled {
            self.agents_enabled = enabled;
        }
        if let Some(timeout) = file.agent_timeout {
            self.agent_timeout_secs = timeout;
        }
        if let Some(count) = file.agent_retry_count {
            self.agent_retry_count = count;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        for (name, agent) in file.agents {
            self = self.agent(name.clone());
            if let Some(path) = agent.path {
                self.agent_paths.insert(name.clone(), path);
            }
            if let Some(enabled) = agent.enabled {
                self.agent_enabled.insert(name, enabled);
            }
        }
        Ok(self)
    }

    /// Layer values from `SUPERCLAUDE_*` variables supplied by `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let key = format!("{}{}", ENV_PREFIX, suffix);
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, root)) = var("PROJECT_ROOT") {
            self.project_root = PathBuf::from(root);
        }
        if let Some((_, runtime)) = var("RUNTIME") {
            self.runtime = runtime;
        }
        if let Some((_, entry_file)) = var("ENTRY_FILE") {
            self.entry_file = entry_file;
        }
        if let Some((key, value)) = var("NO_AGENTS") {
            self.agents_enabled = !parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("AGENT_TIMEOUT") {
            self.agent_timeout_secs = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = var("AGENT_RETRY_COUNT") {
            self.agent_retry_count = parse_number(&key, &value)?;
        }
        if let Some((_, level)) = var("LOG_LEVEL") {
            self.log_level = level;
        }

        for name in self.agent_names.clone() {
            let upper = name.to_uppercase().replace('-', "_");
            if let Some((key, value)) = var(&format!("AGENT_{}_ENABLED", upper)) {
                self.agent_enabled.insert(name.clone(), parse_bool(&key, &value)?);
            }
            if let Some((_, path)) = var(&format!("AGENT_{}_PATH", upper)) {
                self.agent_paths.insert(name.clone(), PathBuf::from(path));
            }
        }
        Ok(self)
    }

    /// Layer host options on top of everything else
    pub fn apply_host(mut self, host: &HostOptions) -> Self {
        if host.no_agents {
            self.agents_enabled = false;
        }
        if let Some(timeout) = host.agent_timeout {
            self.agent_timeout_secs = timeout;
        }
        if let Some(root) = &host.project_root {
            self.project_root = root.clone();
        }
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<SuperClaudeConfig> {
        if self.agent_timeout_secs == 0 {
            return Err(BridgeError::invalid_config(
                "agent_timeout",
                "must be at least 1 second",
            ));
        }
        if self.runtime.trim().is_empty() {
            return Err(BridgeError::invalid_config("runtime", "must not be empty"));
        }
        let level = self.log_level.to_uppercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(BridgeError::invalid_config(
                "log_level",
                format!("unknown level '{}'", self.log_level),
            ));
        }
        for name in &self.agent_names {
            validate_agent_name(name)?;
        }

        let project_root = absolute_root(&self.project_root);
        let agents = self.resolve_agents(&project_root);

        Ok(SuperClaudeConfig {
            project_root,
            runtime: self.runtime,
            runtime_args: self.runtime_args,
            entry_file: self.entry_file,
            agents_enabled: self.agents_enabled,
            agent_timeout: Duration::from_secs(self.agent_timeout_secs),
            agent_retry_count: self.agent_retry_count,
            log_level: level,
            agents,
        })
    }

    fn resolve_agents(&self, project_root: &Path) -> BTreeMap<String, AgentConfig> {
        self.agent_names
            .iter()
            .map(|name| {
                let executable_path = match self.agent_paths.get(name) {
                    Some(path) if path.is_absolute() => path.clone(),
                    Some(path) => project_root.join(path),
                    None => project_root.join(name).join("dist").join(&self.entry_file),
                };
                let config = AgentConfig {
                    name: name.clone(),
                    executable_path,
                    enabled: self.agent_enabled.get(name).copied().unwrap_or(true),
                };
                (name.clone(), config)
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    project_root: Option<PathBuf>,
    runtime: Option<String>,
    runtime_args: Option<Vec<String>>,
    entry_file: Option<String>,
    agents_enabled: Option<bool>,
    agent_timeout: Option<u64>,
    agent_retry_count: Option<u32>,
    log_level: Option<String>,
    #[serde(default)]
    agents: BTreeMap<String, FileAgent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileAgent {
    path: Option<PathBuf>,
    enabled: Option<bool>,
}

/// Anchor a relative root at the current directory
///
/// Agents run with the project root as their working directory, so entry
/// paths derived from a relative root would resolve twice.
fn absolute_root(root: &Path) -> PathBuf {
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}

fn validate_agent_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(BridgeError::invalid_config(
            "agents",
            format!("invalid agent name '{}'", name),
        ))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(BridgeError::invalid_config(
            key,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        BridgeError::invalid_config(key, format!("expected a non-negative integer, got '{}'", value))
    })
}
