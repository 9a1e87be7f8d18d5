use super::app::{AppConfig, ModesConfig, PathsConfig, ResilienceConfig};
use super::defaults::{self, DEFAULT_MAX_RETRIES};
use super::error::ConfigError;
use super::server::{RawServer, ServerConfig};
use super::tool::{RawTool, ToolConfig};
use crate::constants;
use crate::domain::types::Mode;
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub system_prompt: Option<String>,
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub servers: Vec<RawServer>,
    #[serde(default)]
    pub tools: Vec<RawTool>,
    #[serde(default)]
    pub modes: RawModes,
    #[serde(default)]
    pub paths: RawPaths,
    #[serde(default)]
    pub resilience: RawResilience,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawModes {
    pub default: Option<String>,
    pub locked: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawPaths {
    pub cache_file: Option<String>,
    pub memory_file: Option<String>,
    pub session_dir: Option<String>,
    pub provenance_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawResilience {
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub timeouts: HashMap<String, u64>,
}

/// Ensures environment variables are loaded from ~/.crucible/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(expand(constants::ENV_PATH));
    });
}

fn expand(s: &str) -> PathBuf {
    shellexpand::full(s)
        .map(|cow| PathBuf::from(cow.into_owned()))
        .unwrap_or_else(|_| PathBuf::from(s))
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = match path {
        Some(explicit) => explicit.to_path_buf(),
        None => expand(constants::CONFIG_PATH),
    };
    read_config(&config_path)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No configuration file found; using built-in defaults");
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let default_mode = match parsed.modes.default {
        Some(value) => Mode::from_str(&value).ok_or(ConfigError::InvalidMode { value })?,
        None => Mode::default(),
    };

    // A config that declares neither servers nor tools runs against the
    // built-in roster; a config that declares either owns both.
    let (servers, tools): (Vec<ServerConfig>, Vec<ToolConfig>) =
        if parsed.servers.is_empty() && parsed.tools.is_empty() {
            (defaults::default_servers(), defaults::default_tools())
        } else {
            (
                parsed.servers.into_iter().map(ServerConfig::from).collect(),
                parsed.tools.into_iter().map(ToolConfig::from).collect(),
            )
        };

    let mut seen = HashSet::new();
    for server in &servers {
        if server.command.as_os_str().is_empty() {
            return Err(ConfigError::EmptyServerCommand {
                server: server.name.clone(),
            });
        }
        if !seen.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateServer {
                server: server.name.clone(),
            });
        }
    }
    for tool in &tools {
        if let Some(server) = tool.server.as_deref() {
            if !seen.contains(server) {
                return Err(ConfigError::UnknownServer {
                    tool: tool.name.clone(),
                    server: server.to_string(),
                });
            }
        }
    }

    let path_defaults = PathsConfig::default();
    let paths = PathsConfig {
        cache_file: parsed
            .paths
            .cache_file
            .map(|p| expand(&p))
            .unwrap_or(path_defaults.cache_file),
        memory_file: parsed
            .paths
            .memory_file
            .map(|p| expand(&p))
            .unwrap_or(path_defaults.memory_file),
        session_dir: parsed
            .paths
            .session_dir
            .map(|p| expand(&p))
            .unwrap_or(path_defaults.session_dir),
        provenance_dir: parsed
            .paths
            .provenance_dir
            .map(|p| expand(&p))
            .unwrap_or(path_defaults.provenance_dir),
    };

    Ok(AppConfig {
        model: parsed
            .model
            .unwrap_or_else(|| constants::DEFAULT_MODEL.to_string()),
        endpoint: parsed
            .endpoint
            .unwrap_or_else(|| constants::DEFAULT_ENDPOINT.to_string()),
        system_prompt: parsed.system_prompt,
        prompt_template: parsed
            .prompt_template
            .unwrap_or_else(|| defaults::DEFAULT_PROMPT_TEMPLATE.to_string()),
        servers,
        tools,
        modes: ModesConfig {
            default: default_mode,
            locked: parsed.modes.locked.unwrap_or(false),
        },
        paths,
        resilience: ResilienceConfig {
            max_retries: parsed.resilience.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            timeouts: parsed.resilience.timeouts,
        },
    })
}
