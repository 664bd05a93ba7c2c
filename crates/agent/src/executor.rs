//! Tool execution for a single tool-call request.
//!
//! Nothing a tool does can fail the turn: unknown names, undecodable
//! arguments, tool errors and panics all become a `{"error": ...}` payload
//! that the model gets to read.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use energy_advisor_core::error::ToolError;
use energy_advisor_core::message::{ToolCallRequest, ToolResult};
use energy_advisor_core::tool::ToolRegistry;
use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, error, warn};

/// Executes tool-call requests against a shared, read-only registry.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one request and wrap whatever comes back as a [`ToolResult`].
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolResult {
        let payload = match self.registry.get(&request.name) {
            None => {
                warn!(tool = %request.name, call_id = %request.id, "Model requested unknown tool");
                error_payload(ToolError::NotFound(request.name.clone()).to_string())
            }
            Some(tool) => {
                let arguments = request.arguments.to_object().unwrap_or_else(|| {
                    warn!(
                        tool = %request.name,
                        call_id = %request.id,
                        "Tool arguments are not a JSON object, using empty arguments"
                    );
                    serde_json::Map::new()
                });

                debug!(tool = %request.name, call_id = %request.id, "Executing tool");

                let outcome = AssertUnwindSafe(tool.execute(serde_json::Value::Object(arguments)))
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(value)) => value,
                    Ok(Err(e)) => {
                        warn!(
                            tool = %request.name,
                            call_id = %request.id,
                            error = %e,
                            "Tool returned an error"
                        );
                        error_payload(e.to_string())
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        error!(
                            tool = %request.name,
                            call_id = %request.id,
                            panic = %message,
                            "Tool panicked"
                        );
                        error_payload(message)
                    }
                }
            }
        };

        ToolResult {
            call_id: request.id.clone(),
            tool_name: request.name.clone(),
            content: payload.to_string(),
        }
    }

    /// Run every request of one turn. Results come back in request order,
    /// whether the tools ran one after another or concurrently.
    pub async fn execute_all(
        &self,
        requests: &[ToolCallRequest],
        parallel: bool,
    ) -> Vec<ToolResult> {
        if parallel {
            join_all(requests.iter().map(|r| self.execute(r))).await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.execute(request).await);
            }
            results
        }
    }
}

fn error_payload(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "error": message.into() })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
