//! LLM client module for chat-completions providers.
//!
//! Shared wire types for the OpenRouter streaming client plus the typed
//! event sequence the streaming decoder produces.

mod error;
mod openrouter;
mod stream;

pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use openrouter::{
    OpenAiResponsesClient, OpenRouterClient, OPENAI_DEEP_RESEARCH_MODEL, OPENAI_RESPONSES_URL,
    OPENROUTER_CHAT_URL,
};
pub use stream::{decode_sse_stream, ToolCallAccumulator};

use serde::{Deserialize, Serialize};

/// Role in a chat exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a simple text message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant turn that carries tool-call requests.
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool-result turn answering the call with the given id.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// Function call details inside a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as a JSON string. May be empty for no-argument functions.
    #[serde(default)]
    pub arguments: String,
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Function definition with JSON schema parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Token usage as reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    /// Create a usage object ensuring `total_tokens` is consistent.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Optional parameters for a chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Maximum output tokens to generate
    pub max_tokens: Option<u64>,
    /// Tool definitions to advertise; None disables tool calling
    pub tools: Option<Vec<ToolDefinition>>,
}

/// A tool call merged from stream fragments until flush.
///
/// `arguments` is the ordered concatenation of every argument fragment the
/// provider sent for this call; it is expected to parse as JSON once the
/// call is flushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One event decoded from a streaming completion.
///
/// Transient: consumed by the orchestrator as it arrives, never stored.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A fragment of assistant text
    Content(String),
    /// A fully-accumulated tool call, flushed at a finish signal
    ToolCall(AccumulatedToolCall),
    /// Completion marker; carries token usage when the provider reports it
    Done { usage: Option<Usage> },
    /// Transport or provider failure, decoded into a human-readable message
    Error(String),
}
