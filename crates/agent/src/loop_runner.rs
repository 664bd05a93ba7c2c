//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Duration;
use energy_advisor_core::error::{Error, ProviderError, Result};
use energy_advisor_core::message::{AssistantMessage, Conversation, ConversationId, Message};
use energy_advisor_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use energy_advisor_core::tool::ToolRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::executor::ToolExecutor;

/// The outcome of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct FinalAnswer {
    /// Conversation the answer belongs to (log correlation)
    pub conversation_id: ConversationId,

    /// The assistant message that ended the loop; it carries no tool calls
    pub answer: AssistantMessage,

    /// Full transcript, seed messages included
    pub messages: Vec<Message>,

    /// Number of model calls made
    pub iterations: u32,

    /// Token usage summed over all model calls
    pub usage: Usage,
}

impl FinalAnswer {
    /// The answer text, empty if the model sent none.
    pub fn text(&self) -> &str {
        self.answer.content.as_deref().unwrap_or_default()
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response
    max_tokens: Option<u32>,

    /// Runs tool calls against the registry
    executor: ToolExecutor,

    /// Maximum model calls per run
    max_iterations: u32,

    /// Execute the tool calls of one turn concurrently
    parallel_tool_calls: bool,

    /// Deadline for each model call
    request_timeout: Option<Duration>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            executor: ToolExecutor::new(tools),
            max_iterations: 25,
            parallel_tool_calls: false,
            request_timeout: None,
        }
    }

    /// Set the maximum number of model calls per run (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Run the tool calls of a turn concurrently instead of one by one.
    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }

    /// Fail a model call that takes longer than `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Answer `question` under `system_prompt`, with optional extra context.
    ///
    /// Calls the model until it replies without tool calls. Tool failures are
    /// reported back to the model; provider failures, a blank prompt or
    /// question, and running out of iterations are returned as errors.
    pub async fn run(
        &self,
        system_prompt: &str,
        context: Option<&str>,
        question: &str,
    ) -> Result<FinalAnswer> {
        if system_prompt.trim().is_empty() {
            return Err(Error::InvalidInput("system prompt must not be empty".into()));
        }
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("question must not be empty".into()));
        }

        let mut conversation = Conversation::seed(system_prompt, context, question);
        let tool_definitions = self.executor.registry().definitions();
        let mut usage = Usage::default();

        info!(
            conversation_id = %conversation.id,
            provider = %self.provider.name(),
            model = %self.model,
            tools = tool_definitions.len(),
            "Processing question"
        );

        for iteration in 1..=self.max_iterations {
            debug!(
                conversation_id = %conversation.id,
                iteration,
                messages = conversation.len(),
                "Agent loop iteration"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.complete(request).await.inspect_err(|e| {
                warn!(
                    conversation_id = %conversation.id,
                    iteration,
                    error = %e,
                    "Provider call failed"
                );
            })?;

            if let Some(u) = &response.usage {
                usage.accumulate(u);
            }

            let reply = response.message;
            if !reply.has_tool_calls() {
                conversation.push(Message::Assistant(reply.clone()));
                info!(
                    conversation_id = %conversation.id,
                    iterations = iteration,
                    total_tokens = usage.total_tokens,
                    "Final answer produced"
                );
                return Ok(FinalAnswer {
                    conversation_id: conversation.id.clone(),
                    answer: reply,
                    messages: conversation.into_messages(),
                    iterations: iteration,
                    usage,
                });
            }

            debug!(
                conversation_id = %conversation.id,
                tool_count = reply.tool_calls.len(),
                "Executing tool calls"
            );

            let calls = reply.tool_calls.clone();
            conversation.push(Message::Assistant(reply));

            let results = self
                .executor
                .execute_all(&calls, self.parallel_tool_calls)
                .await;
            for result in results {
                conversation.push(Message::Tool(result));
            }

            // Loop back: the model sees the tool results on the next call
        }

        warn!(
            conversation_id = %conversation.id,
            limit = self.max_iterations,
            "Max tool iterations reached without a final answer"
        );
        Err(Error::ToolLoopExceeded {
            limit: self.max_iterations,
        })
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let Some(timeout) = self.request_timeout else {
            return self.provider.complete(request).await;
        };

        match tokio::time::timeout(timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "Provider '{}' timed out after {}s",
                self.provider.name(),
                timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use energy_advisor_core::message::{Role, ToolArguments, ToolCallRequest};
    use serde_json::json;

    fn agent(provider: Arc<dyn Provider>) -> AgentLoop {
        AgentLoop::new(provider, "mock-model", 0.0, Arc::new(registry()))
    }

    #[tokio::test]
    async fn simple_text_response() {
        let provider = Arc::new(SequentialMockProvider::single_text("Run it after 22:00."));
        let answer = agent(provider.clone())
            .run("You advise on energy.", None, "When should I run the dryer?")
            .await
            .unwrap();

        assert_eq!(answer.text(), "Run it after 22:00.");
        assert_eq!(answer.iterations, 1);
        // System + User + Assistant = 3 messages
        assert_eq!(answer.messages.len(), 3);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(answer.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn context_is_sent_as_second_system_message() {
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        agent(provider.clone())
            .run("instructions", Some("Location: Berlin, DE"), "question")
            .await
            .unwrap();

        let request = &provider.requests()[0];
        let roles: Vec<Role> = request.messages.iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::System, Role::System, Role::User]);
        assert_eq!(request.messages[1].content(), Some("Location: Berlin, DE"));
        assert_eq!(request.tools.len(), 3);
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_in_request_order() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(
                vec![
                    make_tool_call("call_a", "echo", json!({"text": "first"})),
                    make_tool_call("call_b", "echo", json!({"text": "second"})),
                ],
                None,
            ),
            make_text_response("done"),
        ]));

        let answer = agent(provider.clone())
            .run("instructions", None, "question")
            .await
            .unwrap();

        assert_eq!(answer.text(), "done");
        assert_eq!(answer.iterations, 2);
        assert_eq!(answer.usage.total_tokens, 30);

        // system, user, assistant(tool calls), tool, tool, assistant
        let roles: Vec<Role> = answer.messages.iter().map(Message::role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Tool,
                Role::Assistant
            ]
        );

        let second_request = &provider.requests()[1];
        assert_eq!(second_request.messages.len(), 5);
        let Message::Tool(first) = &second_request.messages[3] else {
            panic!("expected tool result");
        };
        let Message::Tool(second) = &second_request.messages[4] else {
            panic!("expected tool result");
        };
        assert_eq!(first.call_id, "call_a");
        assert_eq!(first.payload().unwrap()["text"], "first");
        assert_eq!(second.call_id, "call_b");
    }

    #[tokio::test]
    async fn unknown_tool_does_not_abort() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(
                vec![ToolCallRequest::new("call_x", "nonexistent_tool", ToolArguments::default())],
                Some("Let me check."),
            ),
            make_text_response("That tool does not exist."),
        ]));

        let answer = agent(provider)
            .run("instructions", None, "question")
            .await
            .unwrap();

        let Message::Tool(result) = &answer.messages[3] else {
            panic!("expected tool result");
        };
        assert_eq!(
            result.payload().unwrap(),
            json!({"error": "Tool 'nonexistent_tool' not found"})
        );
        assert_eq!(answer.text(), "That tool does not exist.");
    }

    #[tokio::test]
    async fn tool_fault_is_isolated() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(
                vec![ToolCallRequest::new("call_p", "panicking", ToolArguments::default())],
                None,
            ),
            make_tool_call_response(
                vec![make_tool_call("call_e", "echo", json!({"text": "still here"}))],
                None,
            ),
            make_text_response("recovered"),
        ]));

        let answer = agent(provider)
            .run("instructions", None, "question")
            .await
            .unwrap();

        assert_eq!(answer.iterations, 3);
        let Message::Tool(fault) = &answer.messages[3] else {
            panic!("expected tool result");
        };
        assert_eq!(fault.payload().unwrap(), json!({"error": "meter offline"}));
        let Message::Tool(next) = &answer.messages[5] else {
            panic!("expected tool result");
        };
        assert_eq!(next.payload().unwrap()["text"], "still here");
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_the_limit() {
        let agent = agent(Arc::new(AlwaysToolsProvider)).with_max_iterations(4);
        let err = agent
            .run("instructions", None, "question")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolLoopExceeded { limit: 4 }));
    }

    #[tokio::test]
    async fn answer_on_last_allowed_iteration_succeeds() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![make_tool_call("c1", "echo", json!({"text": "1"}))], None),
            make_tool_call_response(vec![make_tool_call("c2", "echo", json!({"text": "2"}))], None),
            make_text_response("just in time"),
        ]));
        let answer = agent(provider)
            .with_max_iterations(3)
            .run("instructions", None, "question")
            .await
            .unwrap();
        assert_eq!(answer.text(), "just in time");
        assert_eq!(answer.iterations, 3);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let err = agent(Arc::new(FailingProvider))
            .run("instructions", None, "question")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn provider_deadline_is_enforced() {
        let err = agent(Arc::new(StalledProvider))
            .with_request_timeout(Duration::from_secs(5))
            .run("instructions", None, "question")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Timeout(_))));
    }

    #[tokio::test]
    async fn blank_question_rejected() {
        let provider = Arc::new(SequentialMockProvider::single_text("unused"));
        let err = agent(provider.clone())
            .run("instructions", None, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_system_prompt_rejected() {
        let provider = Arc::new(SequentialMockProvider::single_text("unused"));
        let err = agent(provider)
            .run("", None, "question")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn parallel_mode_produces_same_transcript() {
        let script = || {
            vec![
                make_tool_call_response(
                    vec![
                        make_tool_call("c1", "echo", json!({"text": "a"})),
                        ToolCallRequest::new("c2", "failing", ToolArguments::default()),
                        make_tool_call("c3", "echo", json!({"text": "c"})),
                    ],
                    None,
                ),
                make_text_response("done"),
            ]
        };

        let sequential = agent(Arc::new(SequentialMockProvider::new(script())))
            .run("instructions", None, "question")
            .await
            .unwrap();
        let parallel = agent(Arc::new(SequentialMockProvider::new(script())))
            .with_parallel_tool_calls(true)
            .run("instructions", None, "question")
            .await
            .unwrap();

        assert_eq!(sequential.messages, parallel.messages);
    }

    #[test]
    fn zero_iterations_is_clamped() {
        let agent = agent(Arc::new(FailingProvider)).with_max_iterations(0);
        assert_eq!(agent.max_iterations(), 1);
    }
}
