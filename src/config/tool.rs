use serde::Deserialize;

/// One callable operation exposed to the agent, bound to a tool-server.
///
/// `family` and `operation` are logical labels used only for timeout
/// resolution and call-statistics bucketing; the server sees `name`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    pub name: String,
    pub server: Option<String>,
    pub family: String,
    pub operation: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTool {
    pub(crate) name: String,
    pub(crate) server: Option<String>,
    pub(crate) family: Option<String>,
    pub(crate) operation: Option<String>,
    pub(crate) description: Option<String>,
}

impl From<RawTool> for ToolConfig {
    fn from(raw: RawTool) -> Self {
        let family = raw
            .family
            .or_else(|| raw.server.clone())
            .unwrap_or_else(|| raw.name.clone());
        let operation = raw.operation.unwrap_or_else(|| "default".to_string());
        Self {
            name: raw.name,
            server: raw.server,
            family,
            operation,
            description: raw.description,
        }
    }
}
