//! Shared test doubles for the executor and loop tests.

use async_trait::async_trait;
use energy_advisor_core::error::{ProviderError, ToolError};
use energy_advisor_core::message::{AssistantMessage, ToolCallRequest};
use energy_advisor_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use energy_advisor_core::tool::{Tool, ToolRegistry};
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request it was given. Panics if the script runs out.
pub struct SequentialMockProvider {
    responses: Vec<ProviderResponse>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match self.responses.get(index) {
            Some(response) => Ok(response.clone()),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                index,
                self.responses.len()
            ),
        }
    }
}

/// A provider that asks for the same tool on every turn.
pub struct AlwaysToolsProvider;

#[async_trait]
impl Provider for AlwaysToolsProvider {
    fn name(&self) -> &str {
        "always_tools"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = make_tool_call(
            &format!("call_{}", request.messages.len()),
            "echo",
            serde_json::json!({"text": "again"}),
        );
        Ok(make_tool_call_response(vec![call], None))
    }
}

/// A provider whose every call fails at the transport level.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// A provider that takes far longer than any reasonable deadline.
pub struct StalledProvider;

#[async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(make_text_response("too late"))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: AssistantMessage::text(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional accompanying text.
pub fn make_tool_call_response(
    tool_calls: Vec<ToolCallRequest>,
    thought: Option<&str>,
) -> ProviderResponse {
    ProviderResponse {
        message: AssistantMessage::with_tool_calls(thought.map(String::from), tool_calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call with JSON-text arguments, as OpenAI sends them.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest::new(
        id,
        name,
        energy_advisor_core::message::ToolArguments::Text(args.to_string()),
    )
}

/// Echoes its `text` argument back.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
        Ok(serde_json::json!({ "text": text }))
    }
}

/// Always returns an execution error.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "failing".into(),
            reason: "upstream unavailable".into(),
        })
    }
}

/// Panics whenever it is called.
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "panicking"
    }
    fn description(&self) -> &str {
        "Panics"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        panic!("meter offline");
    }
}

/// Sleeps before answering with its own name.
pub struct SlowTool {
    name: String,
    delay: Duration,
}

impl SlowTool {
    pub fn new(name: &str, delay_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Answers after a delay"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }
    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(serde_json::json!({ "tool": self.name }))
    }
}

/// Registry with the echo, failing and panicking tools.
pub fn registry() -> ToolRegistry {
    ToolRegistry::from_tools([
        Box::new(EchoTool) as Box<dyn Tool>,
        Box::new(FailingTool),
        Box::new(PanickingTool),
    ])
    .unwrap()
}
