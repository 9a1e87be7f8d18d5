use super::server::ServerConfig;
use super::tool::ToolConfig;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You are a materials-discovery assistant. You explore candidate compositions,
predict crystal structures, evaluate their energies, and report the most
promising materials with concrete supporting numbers.

{{custom_instruction}}

{{tool_guidance}}

Summarise important results as short lists (formula, space group, energy per
atom) and always state which tools produced each number.
"#;

/// Built-in tool-server roster, used when the configuration file is
/// missing or declares no servers of its own.
pub fn default_servers() -> Vec<ServerConfig> {
    let expand = |s: &str| -> PathBuf {
        shellexpand::full(s)
            .map(|cow| PathBuf::from(cow.into_owned()))
            .unwrap_or_else(|_| PathBuf::from(s))
    };

    vec![
        ServerConfig {
            name: "structure-gen".to_string(),
            command: expand("~/.crucible/servers/crucible-structure-server"),
            args: vec!["--stdio".to_string()],
            env: HashMap::new(),
            workdir: None,
        },
        ServerConfig {
            name: "forcefield".to_string(),
            command: expand("~/.crucible/servers/crucible-forcefield-server"),
            args: vec!["--stdio".to_string()],
            env: HashMap::new(),
            workdir: None,
        },
        ServerConfig {
            name: "validity".to_string(),
            command: expand("~/.crucible/servers/crucible-validity-server"),
            args: vec!["--stdio".to_string()],
            env: HashMap::new(),
            workdir: None,
        },
        ServerConfig {
            name: "viz".to_string(),
            command: expand("~/.crucible/servers/crucible-viz-server"),
            args: vec!["--stdio".to_string()],
            env: HashMap::new(),
            workdir: None,
        },
    ]
}

/// Tool bindings for the default roster.
pub fn default_tools() -> Vec<ToolConfig> {
    let tool = |name: &str, server: &str, family: &str, operation: &str, description: &str| {
        ToolConfig {
            name: name.to_string(),
            server: Some(server.to_string()),
            family: family.to_string(),
            operation: operation.to_string(),
            description: Some(description.to_string()),
        }
    };

    vec![
        tool(
            "generate_structures",
            "structure-gen",
            "structure",
            "generate",
            "Predict candidate crystal structures for a composition",
        ),
        tool(
            "refine_structure",
            "structure-gen",
            "structure",
            "refine",
            "Refine a candidate structure toward its nearest local minimum",
        ),
        tool(
            "evaluate_energy",
            "forcefield",
            "energy",
            "evaluate",
            "Compute force-field energy for a structure",
        ),
        tool(
            "relax_structure",
            "forcefield",
            "energy",
            "relax",
            "Relax a structure with the force field and return the final energy",
        ),
        tool(
            "validate_composition",
            "validity",
            "validity",
            "screen",
            "Screen a composition for charge balance and electronegativity sanity",
        ),
        tool(
            "render_structure",
            "viz",
            "viz",
            "render",
            "Render a structure to an image for inspection",
        ),
    ]
}
