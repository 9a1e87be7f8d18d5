//! Application constants
//!
//! Single source of truth for the home-directory layout and other
//! fixed values. All paths are shell-expanded at load time.

/// Default configuration file path
pub const CONFIG_PATH: &str = "~/.crucible/config.toml";

/// Default environment file path
pub const ENV_PATH: &str = "~/.crucible/.env";

/// Default discovery cache file
pub const CACHE_PATH: &str = "~/.crucible/cache/discoveries.json";

/// Default user memory document
pub const MEMORY_PATH: &str = "~/.crucible/memory.md";

/// Default directory for persisted session histories
pub const SESSION_DIR: &str = "~/.crucible/sessions";

/// Default directory for provenance logs
pub const PROVENANCE_DIR: &str = "~/.crucible/provenance";

/// Default model endpoint (local Ollama instance)
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";

/// Default model served by the endpoint above
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
