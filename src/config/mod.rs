pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod server;
pub mod tool;

pub use app::{AppConfig, ModesConfig, PathsConfig, ResilienceConfig};
pub use defaults::{DEFAULT_MAX_RETRIES, DEFAULT_PROMPT_TEMPLATE};
pub use error::ConfigError;
pub use server::ServerConfig;
pub use tool::ToolConfig;
