use super::errors::ToolError;
use super::runtime::ToolRuntime;
use crate::application::context::DiscoveryContext;
use crate::application::provenance;
use crate::application::tooling::{ServerToolInfo, ToolInvokeError, ToolServerInterface};
use crate::config::{AppConfig, ToolConfig};
use crate::domain::types::Mode;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct MockBridge {
    calls: Mutex<Vec<(String, String, Value)>>,
    response: Value,
}

impl MockBridge {
    fn new(response: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
        }
    }

    fn calls(&self) -> Vec<(String, String, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ToolServerInterface for MockBridge {
    async fn invoke_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
    ) -> Result<Value, ToolInvokeError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((server.to_string(), tool.to_string(), arguments));
        Ok(self.response.clone())
    }

    async fn server_instructions(&self, _server: &str) -> Option<String> {
        None
    }

    async fn tool_metadata(&self, _server: &str, _tool: &str) -> Option<ServerToolInfo> {
        None
    }
}

fn test_context(dir: &TempDir, mode: Mode) -> Arc<DiscoveryContext> {
    let mut config = AppConfig::default();
    config.modes.default = mode;
    config.paths.cache_file = dir.path().join("cache.json");
    config.paths.memory_file = dir.path().join("memory.md");
    config.paths.session_dir = dir.path().join("sessions");
    config.paths.provenance_dir = dir.path().join("provenance");
    Arc::new(DiscoveryContext::initialise(&config, "test-session").expect("context"))
}

fn validity_tool() -> ToolConfig {
    ToolConfig {
        name: "validate_composition".to_string(),
        server: Some("validity".to_string()),
        family: "validity".to_string(),
        operation: "screen".to_string(),
        description: Some("Screen a composition".to_string()),
    }
}

#[tokio::test]
async fn execute_overrides_agent_supplied_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = test_context(&dir, Mode::Rigorous);
    let bridge = Arc::new(MockBridge::new(json!({"content": []})));
    let runtime = ToolRuntime::new(vec![validity_tool()], bridge.clone(), session);

    let execution = runtime
        .execute(
            "validate_composition",
            json!({"composition": "NaCl", "mode": "creative"}),
        )
        .await
        .expect("execution succeeds");

    assert!(execution.success);
    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    let (server, tool, arguments) = &calls[0];
    assert_eq!(server, "validity");
    assert_eq!(tool, "validate_composition");
    assert_eq!(arguments["mode"], "rigorous");
    assert_eq!(arguments["composition"], "NaCl");
}

#[tokio::test]
async fn execute_records_discovery_in_cache_memory_and_provenance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = test_context(&dir, Mode::Adaptive);
    let bridge = Arc::new(MockBridge::new(json!({
        "content": [{"type": "text", "text": "BaTiO3 is charge balanced"}],
        "structuredContent": {"formula": "BaTiO3", "valid": true}
    })));
    let runtime = ToolRuntime::new(vec![validity_tool()], bridge, session.clone());

    let execution = runtime
        .execute("validate_composition", json!({"composition": "BaTiO3"}))
        .await
        .expect("execution succeeds");

    assert!(execution.success);
    assert_eq!(
        execution.message.as_deref(),
        Some("BaTiO3 is charge balanced")
    );

    {
        let cache = session.cache.lock().expect("cache lock");
        let entry = cache.get("BaTiO3").expect("cached entry");
        assert_eq!(entry.properties["valid"], true);
    }
    {
        let memory = session.memory.lock().expect("memory lock");
        let discoveries = memory.section("Discoveries").expect("section");
        assert!(discoveries.iter().any(|entry| entry.contains("BaTiO3")));
    }
    {
        let recorder = session.provenance.lock().expect("provenance lock");
        assert!(
            recorder
                .events()
                .iter()
                .any(|event| event.kind == provenance::MATERIAL_FOUND)
        );
    }
}

#[tokio::test]
async fn execute_rejects_unknown_tool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = test_context(&dir, Mode::Adaptive);
    let bridge = Arc::new(MockBridge::new(Value::Null));
    let runtime = ToolRuntime::new(vec![validity_tool()], bridge, session);

    let error = runtime
        .execute("simulate_spectrum", Value::Null)
        .await
        .expect_err("unknown tool must fail");
    assert!(matches!(error, ToolError::UnknownTool(name) if name == "simulate_spectrum"));
}

#[tokio::test]
async fn parser_extracts_fenced_directives() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = test_context(&dir, Mode::Adaptive);
    let bridge = Arc::new(MockBridge::new(Value::Null));
    let runtime = ToolRuntime::new(Vec::new(), bridge, session);

    let directive = runtime
        .parse_agent_action(
            "```json\n{\"action\":\"call_tool\",\"tool\":\"evaluate_energy\",\"input\":{\"structure\":1}}\n```",
        )
        .expect("directive parses");
    match directive {
        super::directive::AgentDirective::CallTool { tool, input } => {
            assert_eq!(tool, "evaluate_energy");
            assert_eq!(input["structure"], 1);
        }
        other => panic!("unexpected directive: {other:?}"),
    }

    let final_directive = runtime
        .parse_agent_action("The answer is {\"action\":\"final\",\"response\":\"done\"}")
        .expect("final parses");
    assert!(matches!(
        final_directive,
        super::directive::AgentDirective::Final { response } if response == "done"
    ));
}
