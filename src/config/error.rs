use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown analysis mode '{value}' - expected creative, adaptive, or rigorous")]
    InvalidMode { value: String },

    #[error("tool '{tool}' references server '{server}' which is not configured")]
    UnknownServer { tool: String, server: String },

    #[error("server '{server}' has an empty command")]
    EmptyServerCommand { server: String },

    #[error("duplicate server name '{server}' in configuration")]
    DuplicateServer { server: String },
}
