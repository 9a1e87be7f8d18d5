use crate::application::client::ClientError;
use crate::application::resilience::CallerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Client(err) => err.user_message(),
            AgentError::Tool(err) => err.user_message(),
            AgentError::InvalidResponse(_) => {
                "The model produced a response the agent could not interpret. Try rephrasing."
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("tool '{0}' is not bound to any tool-server")]
    UnboundTool(String),
    #[error("failed to execute tool '{tool}': {source}")]
    Execution {
        tool: String,
        #[source]
        source: CallerError,
    },
}

impl ToolError {
    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => {
                format!("Tool \"{name}\" is not available in this session.")
            }
            ToolError::UnboundTool(name) => {
                format!(
                    "Tool \"{name}\" is not connected to any tool-server. Check the client configuration."
                )
            }
            ToolError::Execution { tool, source } => {
                format!(
                    "Tool \"{tool}\" failed after {attempts} attempt(s): {cause}",
                    attempts = source.attempts(),
                    cause = source.cause()
                )
            }
        }
    }
}
