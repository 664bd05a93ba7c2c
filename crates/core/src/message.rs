//! Message and Conversation domain types.
//!
//! A conversation is an append-only transcript: the seed messages, then every
//! assistant reply and tool result in the order they happened. Each message
//! kind is its own variant, so the loop branches on the variant instead of
//! probing for optional fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions and injected context
    System,
    /// The end user
    User,
    /// The language model
    Assistant,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant(AssistantMessage),
    Tool(ToolResult),
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a text-only assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage::text(content))
    }

    /// Create a tool result message.
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool(ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        })
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::Tool(_) => Role::Tool,
        }
    }

    /// Text content, if the message carries any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Message::System { content } | Message::User { content } => Some(content),
            Message::Assistant(msg) => msg.content.as_deref(),
            Message::Tool(result) => Some(&result.content),
        }
    }
}

/// A reply from the language model.
///
/// `content` is `None` when the model only requested tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,

    /// Tool calls requested by the model, in the order it emitted them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A model-emitted instruction to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id; echoed back on the matching [`ToolResult`]
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments, left unparsed until execution
    pub arguments: ToolArguments,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Tool-call arguments as they arrived from the provider.
///
/// OpenAI-style APIs send a JSON document encoded as a string; other gateways
/// hand over structured data directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Structured(serde_json::Map<String, serde_json::Value>),
    Text(String),
}

impl ToolArguments {
    /// Decode the arguments into a JSON object.
    ///
    /// Returns `None` when the text is not valid JSON or is not an object.
    pub fn to_object(&self) -> Option<serde_json::Map<String, serde_json::Value>> {
        match self {
            ToolArguments::Structured(map) => Some(map.clone()),
            ToolArguments::Text(text) if text.trim().is_empty() => Some(serde_json::Map::new()),
            ToolArguments::Text(text) => {
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(serde_json::Value::Object(map)) => Some(map),
                    _ => None,
                }
            }
        }
    }

    /// The wire form expected by OpenAI-compatible APIs.
    pub fn to_json_text(&self) -> String {
        match self {
            ToolArguments::Structured(map) => {
                serde_json::Value::Object(map.clone()).to_string()
            }
            ToolArguments::Text(text) => text.clone(),
        }
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        ToolArguments::Structured(serde_json::Map::new())
    }
}

impl From<serde_json::Value> for ToolArguments {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => ToolArguments::Structured(map),
            serde_json::Value::String(text) => ToolArguments::Text(text),
            other => ToolArguments::Text(other.to_string()),
        }
    }
}

/// The outcome of one tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The id of the [`ToolCallRequest`] this answers
    pub call_id: String,

    /// Name of the tool that was requested
    pub tool_name: String,

    /// JSON-encoded payload (success data or `{"error": ...}`)
    pub content: String,
}

impl ToolResult {
    /// Decode the payload back into JSON.
    pub fn payload(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.content).ok()
    }

    pub fn is_error(&self) -> bool {
        self.payload()
            .is_some_and(|v| v.get("error").is_some())
    }
}

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
        }
    }

    /// Start a conversation from instructions, optional context, and a question.
    ///
    /// Context is injected as a second system message; blank context is skipped.
    pub fn seed(system_prompt: &str, context: Option<&str>, question: &str) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(system_prompt));
        if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
            conv.push(Message::system(ctx));
        }
        conv.push(Message::user(question));
        conv
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
