//! Configuration management
//!
//! Precedence, lowest first: built-in defaults, the JSON file at
//! [`config_path`], then environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::memory::DEFAULT_WINDOW;
use crate::tools::web::FETCH_TOOL;
use crate::Result;

/// Which entrypoint answers a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// One chat call with memory context; no plan, no tools.
    #[default]
    Direct,
    /// Plan, optional tool call, reflect.
    Cycle,
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(LoopMode::Direct),
            "cycle" => Ok(LoopMode::Cycle),
            other => Err(Error::Config(format!(
                "Unknown agent mode: {other} (expected \"direct\" or \"cycle\")"
            ))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use (only "ollama" is implemented)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Backend base URL; `http://` is assumed when no scheme is given
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Tool names the agent may invoke
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,

    /// Messages kept in short-term memory
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,

    #[serde(default)]
    pub mode: LoopMode,

    /// HTTP bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Named HTTP sessions kept before the oldest is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3.1:8b-instruct-q4_K_M".to_string()
}

/// Local Ollama on its standard port.
///
/// Deployments that reach the backend through a Docker bridge set this to
/// something like `172.17.128.1:11434`. A value without a scheme is
/// accepted and gets `http://` prepended when the client is built.
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful single agent with access to a limited toolset.\n\
     Answer concisely and prefer structured outputs."
        .to_string()
}

fn default_allowed_tools() -> Vec<String> {
    vec![FETCH_TOOL.to_string()]
}

fn default_memory_window() -> usize {
    DEFAULT_WINDOW
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_sessions() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            system_prompt: default_system_prompt(),
            allowed_tools: default_allowed_tools(),
            memory_window: default_memory_window(),
            mode: LoopMode::default(),
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Overlay values from an environment lookup.
    ///
    /// Takes the lookup as a function so tests never touch the process
    /// environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLM_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("AGENT_SYSTEM_PROMPT") {
            self.system_prompt = v;
        }
        if let Some(v) = lookup("AGENT_ALLOWED_TOOLS") {
            self.allowed_tools = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("AGENT_MEMORY_WINDOW") {
            self.memory_window = parse_var("AGENT_MEMORY_WINDOW", &v)?;
        }
        if let Some(v) = lookup("AGENT_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = lookup("AGENT_HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("AGENT_PORT") {
            self.port = parse_var("AGENT_PORT", &v)?;
        }
        if let Some(v) = lookup("AGENT_MAX_SESSIONS") {
            self.max_sessions = parse_var("AGENT_MAX_SESSIONS", &v)?;
        }
        Ok(())
    }

    /// Bind address for the HTTP façade
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {name}: {value:?}")))
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agent-starter")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Read a config file, or defaults when it does not exist
pub fn load_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load configuration: defaults, then the config file, then the environment
pub fn load() -> Result<Config> {
    let mut config = load_file(&config_path())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::ollama::normalize_base_url;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.1:8b-instruct-q4_K_M");
        assert_eq!(config.allowed_tools, vec!["web.fetch"]);
        assert_eq!(config.memory_window, 20);
        assert_eq!(config.mode, LoopMode::Direct);
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.max_sessions, 256);
    }

    #[test]
    fn test_default_base_url_and_bare_host() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:11434");

        let bridged = Config {
            base_url: "172.17.128.1:11434".to_string(),
            ..Config::default()
        };
        assert_eq!(normalize_base_url(&bridged.base_url), "http://172.17.128.1:11434");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("LLM_PROVIDER", "ollama"),
                ("LLM_MODEL", "qwen2:0.5b"),
                ("LLM_BASE_URL", "172.17.128.1:11434"),
                ("AGENT_ALLOWED_TOOLS", " web.fetch, ,calc "),
                ("AGENT_MEMORY_WINDOW", "4"),
                ("AGENT_MODE", "Cycle"),
                ("AGENT_PORT", "9090"),
                ("AGENT_MAX_SESSIONS", "8"),
            ]))
            .unwrap();

        assert_eq!(config.model, "qwen2:0.5b");
        assert_eq!(config.base_url, "172.17.128.1:11434");
        assert_eq!(config.allowed_tools, vec!["web.fetch", "calc"]);
        assert_eq!(config.memory_window, 4);
        assert_eq!(config.mode, LoopMode::Cycle);
        assert_eq!(config.port, 9090);
        assert_eq!(config.max_sessions, 8);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_env_empty_whitelist() {
        let mut config = Config::default();
        config.apply_env(env(&[("AGENT_ALLOWED_TOOLS", "")])).unwrap();
        assert!(config.allowed_tools.is_empty());
    }

    #[test]
    fn test_env_invalid_values() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("AGENT_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = config.apply_env(env(&[("AGENT_MODE", "swarm")])).unwrap_err();
        assert!(err.to_string().contains("swarm"));
    }

    #[test]
    fn test_file_round_trip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(load_file(&path).unwrap().model, Config::default().model);

        let config = Config {
            model: "mistral".to_string(),
            mode: LoopMode::Cycle,
            ..Config::default()
        };
        save_to(&config, &path).unwrap();
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.model, "mistral");
        assert_eq!(loaded.mode, LoopMode::Cycle);

        std::fs::write(&path, r#"{"port": 9001}"#).unwrap();
        let partial = load_file(&path).unwrap();
        assert_eq!(partial.port, 9001);
        assert_eq!(partial.provider, "ollama");
    }
}
