use thiserror::Error;

/// Retry classification for a failed tool invocation.
///
/// Derived from the error variant itself; retry decisions never inspect
/// error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level failure; the server may come back.
    Connection,
    /// The invocation exceeded its resolved timeout.
    Timeout,
    /// Server-side failure that is worth retrying.
    Transient,
    /// Retrying cannot help.
    Terminal,
}

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool server '{server}' is not configured")]
    NotConfigured { server: String },
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool server '{server}' request cancelled")]
    Cancelled { server: String },
    #[error("call to tool server '{server}' timed out after {elapsed_secs}s")]
    Timeout { server: String, elapsed_secs: u64 },
}

impl ToolInvokeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ToolInvokeError::Spawn { .. }
            | ToolInvokeError::Transport { .. }
            | ToolInvokeError::Terminated { .. }
            | ToolInvokeError::Cancelled { .. } => FailureKind::Connection,
            ToolInvokeError::Timeout { .. } => FailureKind::Timeout,
            // JSON-RPC reserves -32000..=-32099 for implementation-defined
            // server errors; the chemistry servers use the range for
            // transient conditions (queue full, engine warming up).
            ToolInvokeError::Rpc { code, .. } if (-32099..=-32000).contains(code) => {
                FailureKind::Transient
            }
            ToolInvokeError::Rpc { .. }
            | ToolInvokeError::InvalidJson { .. }
            | ToolInvokeError::NotConfigured { .. } => FailureKind::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_connection_failures() {
        let err = ToolInvokeError::Terminated {
            server: "forcefield".into(),
        };
        assert_eq!(err.kind(), FailureKind::Connection);
    }

    #[test]
    fn classifies_rpc_codes() {
        let transient = ToolInvokeError::Rpc {
            server: "structure-gen".into(),
            code: -32001,
            message: "engine warming up".into(),
        };
        assert_eq!(transient.kind(), FailureKind::Transient);

        let terminal = ToolInvokeError::Rpc {
            server: "structure-gen".into(),
            code: -32602,
            message: "invalid params".into(),
        };
        assert_eq!(terminal.kind(), FailureKind::Terminal);
    }
}
