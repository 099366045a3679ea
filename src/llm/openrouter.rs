//! HTTP clients for the two model providers.
//!
//! [`OpenRouterClient`] speaks the OpenAI-compatible chat completions API
//! with streaming always on; every model except the deep-research one is
//! reached through it. [`OpenAiResponsesClient`] is the single non-streaming
//! call to OpenAI's responses endpoint for the `openai_deep` strategy, which
//! uses its own API key.

use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::error::{classify_http_status, LlmError};
use super::stream::decode_sse_stream;
use super::{ChatMessage, ChatOptions, StreamEvent, ToolDefinition};

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// Model used for every deep-research request.
pub const OPENAI_DEEP_RESEARCH_MODEL: &str = "o3-deep-research";

const APP_REFERER: &str = "https://llm-tasks.app";
const APP_TITLE: &str = "LLM Tasks";

/// Streaming chat client for the OpenRouter API.
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    chat_url: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENROUTER_CHAT_URL.to_string())
    }

    /// Point the client at a different endpoint. Test hook.
    pub fn with_base_url(api_key: String, chat_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            chat_url,
        }
    }

    /// Open a streaming chat completion and decode it into [`StreamEvent`]s.
    ///
    /// Failures never escape as `Err`: a rejected or unreachable request
    /// becomes a single `Error` event carrying the provider's message, so
    /// consumers handle exactly one shape. Cancelling `cancel` ends the
    /// stream without a further event.
    pub fn stream_chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            stream: true,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tools: options.tools.filter(|t| !t.is_empty()),
        };
        let http = self.http.clone();
        let api_key = self.api_key.clone();
        let url = self.chat_url.clone();

        async_stream::stream! {
            tracing::debug!(
                model = %request.model,
                messages = request.messages.len(),
                "opening chat stream"
            );

            let response = match http
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .header("HTTP-Referer", APP_REFERER)
                .header("X-Title", APP_TITLE)
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    let message = if e.is_timeout() {
                        format!("Request timeout: {}", e)
                    } else if e.is_connect() {
                        format!("Connection failed: {}", e)
                    } else {
                        format!("Request failed: {}", e)
                    };
                    yield StreamEvent::Error(message);
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    status = status.as_u16(),
                    kind = %classify_http_status(status.as_u16()),
                    "chat request rejected"
                );
                yield StreamEvent::Error(api_error_message(status, &body));
                return;
            }

            let mut events = Box::pin(decode_sse_stream(response.bytes_stream(), cancel));
            while let Some(event) = events.next().await {
                yield event;
            }
        }
    }
}

/// Non-streaming client for OpenAI's responses endpoint.
pub struct OpenAiResponsesClient {
    http: Client,
    api_key: String,
    url: String,
}

impl OpenAiResponsesClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_RESPONSES_URL.to_string())
    }

    /// Point the client at a different endpoint. Test hook.
    pub fn with_base_url(api_key: String, url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            url,
        }
    }

    /// Run one deep-research request and return the report text.
    ///
    /// Blocks until the provider answers; deep research routinely takes
    /// minutes. The report is taken from `output_text`, falling back to the
    /// first choice's message content when that field is empty.
    ///
    /// # Errors
    /// The error message is the provider's own where one is present, so it
    /// can be surfaced to the user verbatim.
    pub async fn deep_research(&self, input: &str) -> Result<String, LlmError> {
        let request = ResponsesRequest {
            model: OPENAI_DEEP_RESEARCH_MODEL,
            input,
        };

        tracing::debug!(model = OPENAI_DEEP_RESEARCH_MODEL, "starting deep research request");

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network_error(format!("Request timeout: {}", e))
                } else if e.is_connect() {
                    LlmError::network_error(format!("Connection failed: {}", e))
                } else {
                    LlmError::network_error(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("OpenAI error: {}", status.as_u16()));
            return Err(LlmError::from_status(status.as_u16(), message));
        }

        let reply: ResponsesReply = serde_json::from_str(&body)
            .map_err(|e| LlmError::parse_error(format!("Failed to parse response: {}", e)))?;

        let text = reply.output_text.unwrap_or_default();
        if !text.is_empty() {
            return Ok(text);
        }
        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default())
    }
}

/// Extract a human-readable message from a failure body.
///
/// Providers wrap failures as `{"error": {"message": ...}}`; other JSON is
/// surfaced whole, and a non-JSON body falls back to the HTTP status line.
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        Err(_) => format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown error")
        ),
    }
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
}

/// Responses endpoint request body.
#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Responses endpoint reply. Only the report text matters here.
#[derive(Debug, Default, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    choices: Vec<ResponsesChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponsesChoice {
    #[serde(default)]
    message: Option<ResponsesMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponsesMessage {
    #[serde(default)]
    content: Option<String>,
}
