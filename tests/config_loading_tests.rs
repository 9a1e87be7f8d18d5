// Config loading tests - AppConfig::load validation and defaults.

use crucible::config::{AppConfig, ConfigError};
use crucible::types::Mode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).expect("Failed to write config.toml");
    path
}

#[test]
fn missing_file_falls_back_to_builtin_defaults() {
    let config =
        AppConfig::load(Some(Path::new("/nonexistent/path/config.toml"))).expect("defaults");
    assert_eq!(config.servers.len(), 4);
    assert_eq!(config.tools.len(), 6);
    assert_eq!(config.modes.default, Mode::Adaptive);
    assert!(!config.modes.locked);
    assert!(
        config
            .tools
            .iter()
            .any(|tool| tool.name == "validate_composition")
    );
}

#[test]
fn parses_servers_tools_and_sections() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
model = "llama3.1:70b"

[[servers]]
name = "validity"
command = "/usr/local/bin/validity-server"
args = ["--stdio"]

[[tools]]
name = "validate_composition"
server = "validity"
family = "validity"
operation = "screen"
description = "Screen a composition"

[modes]
default = "rigorous"
locked = true

[resilience]
max_retries = 5

[resilience.timeouts]
validity_screen = 9
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config parses");
    assert_eq!(config.model, "llama3.1:70b");
    assert_eq!(config.servers.len(), 1);
    assert_eq!(config.tools.len(), 1);
    assert_eq!(config.modes.default, Mode::Rigorous);
    assert!(config.modes.locked);
    assert_eq!(config.resilience.max_retries, 5);
    assert_eq!(config.resilience.timeouts.get("validity_screen"), Some(&9));
}

#[test]
fn returns_error_for_invalid_mode() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[modes]
default = "exhaustive"
"#,
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidMode { value }) if value == "exhaustive"));
}

#[test]
fn returns_error_when_tool_references_unknown_server() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[servers]]
name = "validity"
command = "/usr/local/bin/validity-server"

[[tools]]
name = "evaluate_energy"
server = "forcefield"
"#,
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::UnknownServer { tool, server })
            if tool == "evaluate_energy" && server == "forcefield"
    ));
}

#[test]
fn returns_error_for_duplicate_server_names() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[servers]]
name = "validity"
command = "/usr/local/bin/validity-server"

[[servers]]
name = "validity"
command = "/usr/local/bin/other-server"
"#,
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::DuplicateServer { server }) if server == "validity"
    ));
}

#[test]
fn returns_error_for_empty_server_command() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[servers]]
name = "validity"
command = ""
"#,
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::EmptyServerCommand { server }) if server == "validity"
    ));
}

#[test]
fn returns_error_for_malformed_toml() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "model = [unclosed");

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn path_overrides_are_applied() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[paths]
cache_file = "/tmp/crucible-test/cache.json"
memory_file = "/tmp/crucible-test/memory.md"
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config parses");
    assert_eq!(
        config.paths.cache_file,
        PathBuf::from("/tmp/crucible-test/cache.json")
    );
    assert_eq!(
        config.paths.memory_file,
        PathBuf::from("/tmp/crucible-test/memory.md")
    );
}
