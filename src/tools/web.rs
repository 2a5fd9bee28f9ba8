//! Web tools: search via Serper, page scraping via plain HTTP GET.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::Tool;
use crate::adapters::serper::{render_hits, SerperClient};

/// Cap on scraped page text fed back to the model
const SCRAPE_MAX_CHARS: usize = 8_000;

/// Web search backed by the Serper API
pub struct WebSearch {
    client: SerperClient,
}

impl WebSearch {
    pub fn new(client: SerperClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web. Returns titles, links, and snippets for the top results."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: &serde_json::Value) -> Result<String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .context("Missing required argument 'query'")?;

        let hits = self.client.search(query, 5).await?;
        Ok(render_hits(&hits))
    }
}

/// Fetch a page and strip it down to readable text
pub struct ScrapePage {
    client: Client,
}

impl ScrapePage {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ScrapePage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScrapePage {
    fn name(&self) -> &'static str {
        "scrape_page"
    }

    fn description(&self) -> &'static str {
        "Fetch a web page and return its text content, tags stripped."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Page URL" }
            },
            "required": ["url"]
        })
    }

    async fn invoke(&self, args: &serde_json::Value) -> Result<String> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .context("Missing required argument 'url'")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Fetch failed for {} ({})", url, status);
        }

        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        let mut text = strip_tags(&html);
        if text.len() > SCRAPE_MAX_CHARS {
            text.truncate(SCRAPE_MAX_CHARS);
            text.push_str("\n[truncated]");
        }
        Ok(text)
    }
}

/// ASCII case-insensitive prefix check on raw bytes
fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

/// Remove tags, scripts, and styles; collapse whitespace
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 4);
    let mut in_tag = false;
    let mut skip_until: Option<&str> = None;
    let mut last_space = true;

    for (i, c) in html.char_indices() {
        if let Some(end) = skip_until {
            if starts_with_ci(&html[i..], end) {
                skip_until = None;
                in_tag = true; // consume the closing tag itself
            }
            continue;
        }

        if c == '<' {
            if starts_with_ci(&html[i..], "<script") {
                skip_until = Some("</script");
            } else if starts_with_ci(&html[i..], "<style") {
                skip_until = Some("</style");
            } else {
                in_tag = true;
            }
            continue;
        }
        if in_tag {
            if c == '>' {
                in_tag = false;
                if !last_space {
                    out.push(' ');
                    last_space = true;
                }
            }
            continue;
        }

        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_basic() {
        let html = "<html><body><h1>Title</h1><p>Some <b>bold</b> text.</p></body></html>";
        assert_eq!(strip_tags(html), "Title Some bold text.");
    }

    #[test]
    fn test_strip_tags_drops_scripts_and_styles() {
        let html = "<p>keep</p><script>var x = 1;</script><style>p{color:red}</style><p>this</p>";
        let text = strip_tags(html);
        assert!(text.contains("keep"));
        assert!(text.contains("this"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_strip_tags_collapses_whitespace() {
        let html = "<div>a\n\n   b</div>";
        assert_eq!(strip_tags(html), "a b");
    }
}
