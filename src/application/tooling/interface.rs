use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

/// Catalogue entry advertised by a tool-server.
#[derive(Debug, Clone)]
pub struct ServerToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
}

/// Seam between the agent runtime and the tool-server subprocesses.
///
/// The chemistry engines behind each server are opaque; everything the
/// orchestrator knows about them flows through this trait.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    async fn invoke_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError>;

    async fn server_instructions(&self, server: &str) -> Option<String>;

    async fn tool_metadata(&self, server: &str, tool: &str) -> Option<ServerToolInfo>;
}
