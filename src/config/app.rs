use super::defaults::{self, DEFAULT_MAX_RETRIES};
use super::error::ConfigError;
use super::loader;
use super::server::ServerConfig;
use super::tool::ToolConfig;
use crate::constants;
use crate::domain::types::Mode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Fully validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub endpoint: String,
    pub system_prompt: Option<String>,
    pub prompt_template: String,
    pub servers: Vec<ServerConfig>,
    pub tools: Vec<ToolConfig>,
    pub modes: ModesConfig,
    pub paths: PathsConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModesConfig {
    pub default: Mode,
    pub locked: bool,
}

#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub cache_file: PathBuf,
    pub memory_file: PathBuf,
    pub session_dir: PathBuf,
    pub provenance_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub max_retries: u32,
    pub timeouts: HashMap<String, u64>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeouts: HashMap::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let expand = |s: &str| -> PathBuf {
            shellexpand::full(s)
                .map(|cow| PathBuf::from(cow.into_owned()))
                .unwrap_or_else(|_| PathBuf::from(s))
        };
        Self {
            cache_file: expand(constants::CACHE_PATH),
            memory_file: expand(constants::MEMORY_PATH),
            session_dir: expand(constants::SESSION_DIR),
            provenance_dir: expand(constants::PROVENANCE_DIR),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: constants::DEFAULT_MODEL.to_string(),
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            system_prompt: None,
            prompt_template: defaults::DEFAULT_PROMPT_TEMPLATE.to_string(),
            servers: defaults::default_servers(),
            tools: defaults::default_tools(),
            modes: ModesConfig::default(),
            paths: PathsConfig::default(),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path, falling back to the
    /// fixed home-directory location and finally to built-in defaults
    /// when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        loader::load_config(path)
    }
}
