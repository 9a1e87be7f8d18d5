use super::{ToolError, ToolRuntime, Value, json};
use crate::application::provenance;
use crate::application::resilience::CallOptions;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub(crate) struct ToolExecution {
    pub tool: String,
    pub success: bool,
    pub input: Value,
    pub output: Value,
    pub message: Option<String>,
}

impl ToolRuntime {
    pub(crate) async fn execute(
        &self,
        tool_name: &str,
        input: Value,
    ) -> Result<ToolExecution, ToolError> {
        if tool_name.eq_ignore_ascii_case("list_tools") {
            let manifest = self.build_context().await;
            let output = serde_json::to_value(&manifest).unwrap_or(Value::Null);
            debug!("Agent requested tool catalogue via list_tools");
            let execution = ToolExecution {
                tool: "list_tools".to_string(),
                success: true,
                input,
                output,
                message: Some(format!("{} configured tool(s) available.", manifest.tools.len())),
            };
            info!(tool = %execution.tool, success = execution.success, "Tool executed");
            return Ok(execution);
        }

        let key = tool_name.to_lowercase();
        let Some(tool) = self.index.get(&key).cloned() else {
            warn!(requested_tool = %tool_name, "Unknown tool requested by agent");
            return Err(ToolError::UnknownTool(tool_name.to_string()));
        };

        let tool_name = tool.name.clone();

        let server_name = match tool.server.as_deref() {
            Some(name) => name.to_string(),
            None => {
                warn!(tool = %tool_name, "Tool configured without server binding");
                return Err(ToolError::UnboundTool(tool_name));
            }
        };

        let mut arguments = match input.clone() {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        self.session.modes.apply(&mut arguments);

        self.record_event(
            provenance::TOOL_START,
            json!({
                "tool": tool_name,
                "server": server_name,
                "operation": tool.operation,
                "mode": self.session.modes.current().as_str(),
            }),
        );

        debug!(tool = %tool_name, server = %server_name, "Dispatching tool call");
        let started = Instant::now();
        let call_result = {
            let bridge = Arc::clone(&self.bridge);
            let server = server_name.clone();
            let name = tool_name.clone();
            let args = arguments.clone();
            self.session
                .resilience
                .call(&tool.family, &tool.operation, CallOptions::default(), move || {
                    let bridge = Arc::clone(&bridge);
                    let server = server.clone();
                    let name = name.clone();
                    let args = args.clone();
                    async move { bridge.invoke_tool(&server, &name, args).await }
                })
                .await
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match call_result {
            Ok(result) => {
                self.record_event(
                    provenance::TOOL_FIRST_BYTE,
                    json!({ "tool": tool_name, "elapsed_ms": elapsed_ms }),
                );
                let is_error = result
                    .get("isError")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                self.record_event(
                    provenance::TOOL_END,
                    json!({
                        "tool": tool_name,
                        "duration_ms": elapsed_ms,
                        "success": !is_error,
                    }),
                );
                if !is_error {
                    self.record_discovery(&tool_name, &result);
                }
                let message = extract_tool_message(&result);
                let execution = ToolExecution {
                    tool: tool_name,
                    success: !is_error,
                    input,
                    output: result,
                    message,
                };
                info!(tool = %execution.tool, success = execution.success, "Tool executed");
                Ok(execution)
            }
            Err(source) => {
                self.record_event(
                    provenance::TOOL_END,
                    json!({
                        "tool": tool_name,
                        "duration_ms": elapsed_ms,
                        "success": false,
                    }),
                );
                warn!(tool = %tool_name, server = %server_name, %source, "Tool execution failed");
                Err(ToolError::Execution {
                    tool: tool_name,
                    source,
                })
            }
        }
    }

    /// A successful result whose structured content names a formula is
    /// a discovery: cache it, log it, and remember it for the user.
    fn record_discovery(&self, tool_name: &str, result: &Value) {
        let Some(structured) = result.get("structuredContent").and_then(Value::as_object) else {
            return;
        };
        let Some(formula) = structured.get("formula").and_then(Value::as_str) else {
            return;
        };

        info!(formula, tool = tool_name, "Material recorded from tool result");
        {
            let mut cache = self.session.cache.lock().expect("discovery cache lock");
            if let Err(err) = cache.insert(formula, Value::Object(structured.clone())) {
                warn!(formula, %err, "failed to persist discovery cache entry");
            }
        }
        self.record_event(
            provenance::MATERIAL_FOUND,
            json!({ "formula": formula, "tool": tool_name }),
        );
        {
            let mut memory = self.session.memory.lock().expect("user memory lock");
            if let Err(err) = memory.append("Discoveries", format!("{formula} (via {tool_name})")) {
                warn!(formula, %err, "failed to append discovery to user memory");
            }
        }
    }

    fn record_event(&self, kind: &str, data: Value) {
        let mut recorder = self.session.provenance.lock().expect("provenance lock");
        if let Err(err) = recorder.record(kind, data) {
            warn!(kind, %err, "failed to write provenance event");
        }
    }
}

fn extract_tool_message(result: &Value) -> Option<String> {
    if let Some(array) = result.get("content").and_then(Value::as_array) {
        for block in array {
            if block
                .get("type")
                .and_then(Value::as_str)
                .map(|value| value.eq_ignore_ascii_case("text"))
                .unwrap_or(false)
            {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
    }

    if let Some(structured) = result.get("structuredContent").and_then(Value::as_object) {
        if let Some(error) = structured.get("error").and_then(Value::as_object) {
            if let Some(message) = error.get("message").and_then(Value::as_str) {
                let trimmed = message.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    None
}
