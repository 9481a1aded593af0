//! OpenAI-compatible chat completion client
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` shape (Ollama, vLLM, LiteLLM).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::LlmConfig;
use crate::core::{Message, MessageKind, Result, ToolCall, ToolDefinition, TradeHelperError};
use crate::llm::traits::{ReasoningProvider, Reply, TokenUsage};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    temperature: f32,
}

/// Message in the wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Tool call in the wire format; arguments travel as a JSON string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        if config.api_key.is_none() && base_url.contains("api.openai.com") {
            return Err(TradeHelperError::config(
                "OPENAI_API_KEY is required for api.openai.com",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Model requests are sent to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert the dialogue into the analyst's view of the chat
    fn to_wire_messages(directive: &str, history: &[Message]) -> Vec<WireMessage> {
        let mut out = Vec::with_capacity(history.len() + 1);
        out.push(WireMessage::new("system", directive));

        for msg in history {
            match msg.kind {
                MessageKind::Task | MessageKind::Acknowledgement => {
                    out.push(WireMessage::new("user", msg.content.clone()));
                }
                MessageKind::Reasoning => {
                    let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
                        msg.tool_calls
                            .iter()
                            .map(|tc| WireToolCall {
                                id: tc.id.clone(),
                                call_type: function_type(),
                                function: WireFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.to_string(),
                                },
                            })
                            .collect()
                    });
                    out.push(WireMessage {
                        role: "assistant".to_string(),
                        content: (!msg.content.is_empty()).then(|| msg.content.clone()),
                        tool_calls,
                        tool_call_id: None,
                    });
                }
                MessageKind::ToolResponse => {
                    for result in &msg.tool_results {
                        out.push(WireMessage {
                            role: "tool".to_string(),
                            content: Some(result.output.clone()),
                            tool_calls: None,
                            tool_call_id: Some(result.call_id.clone()),
                        });
                    }
                }
            }
        }

        out
    }

    /// Convert a response message into a Reply
    ///
    /// `position` is the index the reply will take in the history; missing call
    /// ids are derived from it so they stay unique across turns.
    fn to_reply(message: WireMessage, usage: Option<WireUsage>, position: usize) -> Reply {
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| {
                // Malformed argument JSON is passed through and rejected by the registry
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments));
                let id = if tc.id.is_empty() {
                    format!("call_{}_{}", position, i)
                } else {
                    tc.id
                };
                ToolCall::new(id, tc.function.name, arguments)
            })
            .collect();

        Reply {
            content: message.content.unwrap_or_default(),
            tool_calls,
            usage: usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        }
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiClient {
    async fn generate(
        &self,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Reply> {
        let request = ChatRequest {
            model: &self.model,
            messages: Self::to_wire_messages(directive, history),
            tools: (!tools.is_empty()).then_some(tools),
            temperature: self.temperature,
        };

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = tools.len(),
            "chat completion request"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                TradeHelperError::llm(format!("Cannot connect to {}", self.base_url))
            } else if e.is_timeout() {
                TradeHelperError::llm(format!("Request to {} timed out", self.base_url))
            } else {
                TradeHelperError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TradeHelperError::llm(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| TradeHelperError::llm(format!("Failed to parse response: {}", e)))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TradeHelperError::llm("Response contained no choices"))?;

        let reply = Self::to_reply(choice.message, chat_response.usage, history.len());
        if let Some(usage) = reply.usage {
            tracing::debug!(total_tokens = usage.total_tokens, "chat completion usage");
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolOutcome;
    use serde_json::json;

    fn local_config() -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            api_key: None,
            model: "qwen3:8b".to_string(),
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::from_config(&local_config()).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model(), "qwen3:8b");
    }

    #[test]
    fn test_openai_requires_key() {
        let config = LlmConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            ..local_config()
        };
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(TradeHelperError::Config(_))
        ));
    }

    #[test]
    fn test_history_conversion() {
        let call = ToolCall::new("call_9", "get_company_profile", json!({"symbol": "ACME"}));
        let history = vec![
            Message::task("Analyze ACME"),
            Message::reasoning("", vec![call.clone()]),
            Message::tool_response(vec![ToolOutcome::success(&call, "Acme Corp")]),
            Message::acknowledgement("Continue."),
        ];

        let wire = OpenAiClient::to_wire_messages("You are an analyst", &history);
        let roles: Vec<&str> = wire.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool", "user"]);

        assert_eq!(wire[2].content, None);
        let calls = wire[2].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"symbol":"ACME"}"#);
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_9"));
        assert_eq!(wire[3].content.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_response_parsing() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "", "type": "function",
                         "function": {"name": "get_stock_data", "arguments": "{\"symbol\":\"ACME\"}"}},
                        {"id": "x", "type": "function",
                         "function": {"name": "get_company_news", "arguments": "not json"}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        let mut choices = parsed.choices;
        let reply = OpenAiClient::to_reply(choices.remove(0).message, parsed.usage, 3);

        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls[0].id, "call_3_0");
        assert_eq!(reply.tool_calls[0].arguments, json!({"symbol": "ACME"}));
        assert_eq!(reply.tool_calls[1].arguments, json!("not json"));
        assert_eq!(reply.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_generated_call_ids_differ_between_turns() {
        let message = || WireMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![WireToolCall {
                id: String::new(),
                call_type: function_type(),
                function: WireFunction {
                    name: "get_company_profile".to_string(),
                    arguments: r#"{"symbol":"ACME"}"#.to_string(),
                },
            }]),
            tool_call_id: None,
        };

        let first = OpenAiClient::to_reply(message(), None, 1);
        let later = OpenAiClient::to_reply(message(), None, 5);
        assert_eq!(first.tool_calls[0].id, "call_1_0");
        assert_ne!(first.tool_calls[0].id, later.tool_calls[0].id);
    }
}
