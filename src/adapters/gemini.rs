//! Google Gemini provider.
//!
//! Calls the `generateContent` endpoint of the Generative Language API.
//! Supports function calling (for agent tools) and structured JSON
//! output via `responseMimeType`/`responseSchema`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{FunctionDeclaration, GenerationRequest, Provider, ProviderReply, Turn};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider over the REST API
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a provider for a model with an explicit API key
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the base URL (tests against a local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_id, self.api_key
        )
    }

    /// Map the runner's conversation turns to Gemini contents
    fn to_contents(turns: &[Turn]) -> Vec<GeminiContent> {
        turns
            .iter()
            .map(|turn| match turn {
                Turn::User(text) => GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart::Text { text: text.clone() }],
                },
                Turn::ToolCall { name, args } => GeminiContent {
                    role: "model".to_string(),
                    parts: vec![GeminiPart::FunctionCall {
                        function_call: GeminiFunctionCall {
                            name: name.clone(),
                            args: args.clone(),
                        },
                    }],
                },
                Turn::ToolResult { name, content } => GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart::FunctionResponse {
                        function_response: GeminiFunctionResponse {
                            name: name.clone(),
                            response: serde_json::json!({ "content": content }),
                        },
                    }],
                },
            })
            .collect()
    }

    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        let generation_config = GeminiGenerationConfig {
            temperature: Some(request.generation.temperature),
            top_p: Some(request.generation.top_p),
            max_output_tokens: Some(request.generation.max_output_tokens),
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
        };

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTools {
                function_declarations: request.tools.clone(),
            }])
        };

        GeminiRequest {
            contents: Self::to_contents(&request.turns),
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart::Text {
                    text: request.system_instruction.clone(),
                }],
            }),
            generation_config: Some(generation_config),
            tools,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<ProviderReply> {
        debug!(
            model_id = %self.model_id,
            turns = request.turns.len(),
            tools = request.tools.len(),
            structured = request.response_schema.is_some(),
            "Generating"
        );

        let body = self.build_request(&request);

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(%status, "Gemini API returned an error");
            if status.as_u16() == 429 {
                anyhow::bail!("Gemini rate limit or quota exceeded: {}", text.trim());
            }
            anyhow::bail!("Gemini API error ({}): {}", status, text.trim());
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let candidate = parsed
            .candidates
            .first()
            .context("No candidates in Gemini API response")?;

        let part = candidate
            .content
            .parts
            .first()
            .context("No content parts in Gemini API response")?;

        match part {
            GeminiPart::Text { text } => Ok(ProviderReply::Text(text.clone())),
            GeminiPart::FunctionCall { function_call } => Ok(ProviderReply::ToolCall {
                name: function_call.name.clone(),
                args: function_call.args.clone(),
            }),
            GeminiPart::FunctionResponse { .. } => {
                anyhow::bail!("Unexpected functionResponse part in model output")
            }
        }
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTools {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::GenerationConfig;

    #[test]
    fn test_endpoint_url() {
        let provider = GeminiProvider::new("gemini-1.5-flash", "KEY");
        assert_eq!(
            provider.endpoint(),
            format!("{}/models/gemini-1.5-flash:generateContent?key=KEY", BASE_URL)
        );
    }

    #[test]
    fn test_turn_mapping_roles() {
        let turns = vec![
            Turn::User("hello".to_string()),
            Turn::ToolCall {
                name: "web_search".to_string(),
                args: serde_json::json!({ "query": "q" }),
            },
            Turn::ToolResult {
                name: "web_search".to_string(),
                content: "results".to_string(),
            },
        ];

        let contents = GeminiProvider::to_contents(&turns);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
        assert!(matches!(
            contents[1].parts[0],
            GeminiPart::FunctionCall { .. }
        ));
        assert!(matches!(
            contents[2].parts[0],
            GeminiPart::FunctionResponse { .. }
        ));
    }

    #[test]
    fn test_structured_request_sets_json_mime() {
        let provider = GeminiProvider::new("gemini-1.5-flash", "KEY");
        let request = GenerationRequest {
            system_instruction: "sys".to_string(),
            turns: vec![Turn::User("u".to_string())],
            generation: GenerationConfig::default(),
            tools: Vec::new(),
            response_schema: Some(serde_json::json!({ "type": "object" })),
        };

        let body = provider.build_request(&request);
        let config = body.generation_config.unwrap();
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        assert!(config.response_schema.is_some());
        assert!(body.tools.is_none());
    }

    #[test]
    fn test_response_parsing_function_call() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "functionCall": { "name": "web_search", "args": { "query": "x" } } }]
                }
            }]
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(json).unwrap();
        let part = &parsed.candidates[0].content.parts[0];
        match part {
            GeminiPart::FunctionCall { function_call } => {
                assert_eq!(function_call.name, "web_search");
            }
            _ => panic!("Expected a functionCall part"),
        }
    }
}
