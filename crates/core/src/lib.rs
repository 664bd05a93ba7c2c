//! # Energy Advisor Core
//!
//! Domain types, traits, and error definitions for the energy advisor agent.
//! Every collaborator of the tool-calling loop is defined here as a type or a
//! trait; implementations live in their respective crates.
//!
//! - [`Message`] and [`Conversation`]: the append-only transcript
//! - [`Tool`] and [`ToolRegistry`]: the deterministic functions exposed to the model
//! - [`Provider`]: the language model gateway

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{
    AssistantMessage, Conversation, ConversationId, Message, Role, ToolArguments,
    ToolCallRequest, ToolResult,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry};
