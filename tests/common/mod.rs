//! Shared test support: a scripted provider standing in for Gemini.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use markforge::adapters::{GenerationRequest, Provider, ProviderReply, Turn};

/// Provider that replays a scripted reply queue and records every request
pub struct MockProvider {
    replies: Mutex<VecDeque<Result<ProviderReply>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(replies: Vec<Result<ProviderReply>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The first user-turn text of each request (the task prompts)
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| {
                r.turns.iter().find_map(|t| match t {
                    Turn::User(text) => Some(text.clone()),
                    _ => None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<ProviderReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("mock reply queue exhausted")))
    }
}

/// A plain text reply
pub fn text(s: &str) -> Result<ProviderReply> {
    Ok(ProviderReply::Text(s.to_string()))
}

/// A structured-output reply: a valid artifact JSON object
pub fn artifact_json(content_type: &str, topic: &str) -> Result<ProviderReply> {
    Ok(ProviderReply::Text(
        serde_json::json!({
            "content_type": content_type,
            "topic": topic,
            "target_audience": "Test audience",
            "tags": ["alpha", "beta"],
            "content": format!("Generated {} about {}.", content_type, topic),
        })
        .to_string(),
    ))
}

/// A tool-call reply
pub fn tool_call(name: &str, args: serde_json::Value) -> Result<ProviderReply> {
    Ok(ProviderReply::ToolCall {
        name: name.to_string(),
        args,
    })
}
