//! Serper.dev search client.
//!
//! Backs the web-search capability. Only constructed when the
//! SERPER_API_KEY credential is present.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

const SEARCH_URL: &str = "https://google.serper.dev/search";

/// Thin client over the Serper search API
#[derive(Debug, Clone)]
pub struct SerperClient {
    api_key: String,
    search_url: String,
    client: Client,
}

/// One organic search result
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

impl SerperClient {
    /// Create a client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            search_url: SEARCH_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Override the search URL (tests against a local stub)
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Run a search, returning up to `limit` organic hits
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(&self.search_url)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await
            .context("Failed to reach the Serper API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            anyhow::bail!("Serper API error ({}): {}", status, text.trim());
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .context("Failed to parse Serper response")?;

        Ok(parsed.organic.into_iter().take(limit).collect())
    }
}

/// Render hits as a compact text block for a prompt
pub fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    hits.iter()
        .map(|h| format!("- {} ({})\n  {}", h.title, h.link, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_organic_results() {
        let json = r#"{
            "organic": [
                { "title": "A", "link": "https://a.example", "snippet": "first" },
                { "title": "B", "link": "https://b.example" }
            ]
        }"#;

        let parsed: SerperResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[1].snippet, "");
    }

    #[test]
    fn test_render_hits() {
        let hits = vec![SearchHit {
            title: "A".to_string(),
            link: "https://a.example".to_string(),
            snippet: "first".to_string(),
        }];

        let text = render_hits(&hits);
        assert!(text.contains("A (https://a.example)"));
        assert!(text.contains("first"));

        assert_eq!(render_hits(&[]), "No results found.");
    }
}
