use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::error::GenerationError;

/// Output shape the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Choices,
    Consequence,
    Answer,
}

impl ResponseShape {
    pub fn name(self) -> &'static str {
        match self {
            ResponseShape::Choices => "choices",
            ResponseShape::Consequence => "consequence",
            ResponseShape::Answer => "answer",
        }
    }

    /// JSON schema passed as `response_format`.
    pub fn schema(self) -> Value {
        let string = json!({"type": "string"});
        match self {
            ResponseShape::Choices => json!({
                "type": "object",
                "properties": {
                    "choices": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "emoji": string,
                                "name": string,
                                "choice": string,
                                "choice_type": string,
                            },
                            "required": ["emoji", "name", "choice", "choice_type"],
                            "additionalProperties": false,
                        },
                    },
                },
                "required": ["choices"],
                "additionalProperties": false,
            }),
            ResponseShape::Consequence => json!({
                "type": "object",
                "properties": {
                    "choice": string,
                    "consequence": string,
                    "plot": string,
                    "prose": string,
                },
                "required": ["choice", "consequence", "plot", "prose"],
                "additionalProperties": false,
            }),
            ResponseShape::Answer => json!({
                "type": "object",
                "properties": { "answer": string },
                "required": ["answer"],
                "additionalProperties": false,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub shape: ResponseShape,
    pub max_tokens: Option<u32>,
}

/// Anything that turns a prompt into raw model text.
pub trait LlmBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub response_format: Value,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
pub struct CompletionChoice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

/// Blocking client for OpenAI-compatible `/v1/chat/completions` endpoints
/// (OpenAI, LM Studio, llama.cpp server, ...). No timeout is set.
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(settings: &Settings) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key: settings.api_key(),
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: request.prompt.clone(),
            }],
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.shape.name(),
                    "strict": true,
                    "schema": request.shape.schema(),
                },
            }),
        }
    }
}

impl LlmBackend for ChatCompletionsClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let mut http = self.client.post(&self.endpoint).json(&self.build_request(request));
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let resp = http.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp: ChatCompletionResponse = resp.json()?;
        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::Empty("completion"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_schema_and_skips_absent_max_tokens() {
        let client = ChatCompletionsClient::new(&Settings::default()).unwrap();
        let req = client.build_request(&CompletionRequest {
            prompt: "hello".into(),
            shape: ResponseShape::Answer,
            max_tokens: None,
        });
        let body = serde_json::to_value(&req).unwrap();

        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["response_format"]["json_schema"]["name"], "answer");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["required"],
            json!(["answer"])
        );
    }

    #[test]
    fn choice_schema_lists_all_fields() {
        let schema = ResponseShape::Choices.schema();
        let required = &schema["properties"]["choices"]["items"]["required"];
        assert_eq!(required, &json!(["emoji", "name", "choice", "choice_type"]));
    }
}
