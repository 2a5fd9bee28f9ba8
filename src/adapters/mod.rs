//! Provider interfaces for external generation and search services.
//!
//! Providers give the runner a unified interface over the language
//! model. The runner drives a bounded conversation (text turns and tool
//! calls); the provider maps it to its wire format.

pub mod gemini;
pub mod serper;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::agents::GenerationConfig;

pub use gemini::GeminiProvider;
pub use serper::SerperClient;

/// One turn in the conversation the runner maintains per task
#[derive(Debug, Clone)]
pub enum Turn {
    /// Prompt text from the runner
    User(String),

    /// A tool call the model requested
    ToolCall {
        name: String,
        args: serde_json::Value,
    },

    /// The result of executing a tool call
    ToolResult { name: String, content: String },
}

/// A tool exposed to the model as a callable function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Request for one model round-trip
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Role identity and standing instructions
    pub system_instruction: String,

    /// Conversation so far (never empty)
    pub turns: Vec<Turn>,

    /// Sampling and token budget
    pub generation: GenerationConfig,

    /// Tools the model may call (empty = none)
    pub tools: Vec<FunctionDeclaration>,

    /// Structured-output JSON schema (mutually exclusive with tools)
    pub response_schema: Option<serde_json::Value>,
}

/// What the model came back with
#[derive(Debug, Clone)]
pub enum ProviderReply {
    /// Final text for this round-trip
    Text(String),

    /// The model wants a tool executed
    ToolCall {
        name: String,
        args: serde_json::Value,
    },
}

/// Trait for generative-text providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Execute one model round-trip
    async fn generate(&self, request: GenerationRequest) -> Result<ProviderReply>;
}
