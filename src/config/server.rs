use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Launch description for one chemistry tool-server subprocess.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    pub(crate) name: String,
    pub(crate) command: String,
    #[serde(default)]
    pub(crate) args: Vec<String>,
    #[serde(default)]
    pub(crate) env: HashMap<String, String>,
    pub(crate) workdir: Option<String>,
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();

        Self {
            name: raw.name,
            command,
            args,
            env: raw.env,
            workdir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn expands_env_vars_in_command_and_args() {
        unsafe {
            env::set_var("CRUCIBLE_TEST_ROOT", "/opt/servers");
            env::set_var("CRUCIBLE_TEST_FLAG", "--stdio");
        }

        let raw = RawServer {
            name: "structure-gen".to_string(),
            command: "${CRUCIBLE_TEST_ROOT}/structure-gen".to_string(),
            args: vec!["${CRUCIBLE_TEST_FLAG}".to_string()],
            env: HashMap::new(),
            workdir: Some("${CRUCIBLE_TEST_ROOT}/work".to_string()),
        };

        let config = ServerConfig::from(raw);

        let cmd = config.command.to_str().expect("valid utf8");
        assert!(cmd.contains("/opt/servers/structure-gen"));
        assert!(config.args.contains(&"--stdio".to_string()));

        let workdir = config.workdir.expect("workdir exists");
        assert!(workdir.to_str().expect("valid utf8").contains("/opt/servers/work"));

        unsafe {
            env::remove_var("CRUCIBLE_TEST_ROOT");
            env::remove_var("CRUCIBLE_TEST_FLAG");
        }
    }
}
