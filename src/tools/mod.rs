//! Capability implementations.
//!
//! Each `Capability` on an agent maps to one `Tool`. A `ToolSet` is the
//! concrete, invocable set built for an agent at run time; it exposes
//! function declarations for the provider and dispatches calls by name.

pub mod files;
pub mod web;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::adapters::{FunctionDeclaration, SerperClient};
use crate::agents::{Agent, Capability};

pub use files::{ListDir, ReadFile, WriteFile};
pub use web::{ScrapePage, WebSearch};

/// A tool an agent may invoke during a task
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name exposed to the model
    fn name(&self) -> &'static str;

    /// One-line description for the function declaration
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool
    async fn invoke(&self, args: &serde_json::Value) -> Result<String>;
}

/// The invocable tool set for one agent
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolSet {
    /// Build the tool set an agent's capability set allows.
    ///
    /// `serper` must be Some for Search/Scrape capabilities to resolve;
    /// the registry only attaches those capabilities when the credential
    /// exists, so a None here with web capabilities is a caller bug and
    /// the capabilities are silently skipped.
    pub fn for_agent(agent: &Agent, drafts_root: &Path, serper: Option<&SerperClient>) -> Self {
        let mut tools: Vec<Box<dyn Tool>> = Vec::new();

        let list_root = match &agent.list_scope {
            Some(sub) => drafts_root.join(sub),
            None => drafts_root.to_path_buf(),
        };

        for capability in &agent.capabilities {
            match capability {
                Capability::Search => {
                    if let Some(client) = serper {
                        tools.push(Box::new(WebSearch::new(client.clone())));
                    }
                }
                Capability::Scrape => {
                    if serper.is_some() {
                        tools.push(Box::new(ScrapePage::new()));
                    }
                }
                Capability::ReadFile => {
                    tools.push(Box::new(ReadFile::new(drafts_root.to_path_buf())));
                }
                Capability::WriteFile => {
                    tools.push(Box::new(WriteFile::new(drafts_root.to_path_buf())));
                }
                Capability::ListDir => {
                    tools.push(Box::new(ListDir::new(list_root.clone())));
                }
            }
        }

        Self { tools }
    }

    /// Function declarations for the provider request
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Tool names, in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Dispatch a tool call by name.
    ///
    /// Unknown names and tool failures are returned as error text rather
    /// than aborting the task; the model gets to see what went wrong.
    pub async fn invoke(&self, name: &str, args: &serde_json::Value) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return format!("Error: unknown tool '{}'", name);
        };

        match tool.invoke(args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {} failed: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Registry, Role};
    use tempfile::TempDir;

    #[test]
    fn test_toolset_without_search_credential() {
        let temp = TempDir::new().unwrap();
        let agent = Registry::new(false).unwrap().agent(Role::HeadOfMarketing);

        let tools = ToolSet::for_agent(&agent, temp.path(), None);
        let names = tools.names();

        assert!(!names.contains(&"web_search"));
        assert!(!names.contains(&"scrape_page"));
        assert!(names.contains(&"read_file"));
        assert!(names.contains(&"write_file"));
        assert!(names.contains(&"list_dir"));
    }

    #[test]
    fn test_toolset_with_search_credential() {
        let temp = TempDir::new().unwrap();
        let agent = Registry::new(true).unwrap().agent(Role::HeadOfMarketing);
        let serper = SerperClient::new("test-key");

        let tools = ToolSet::for_agent(&agent, temp.path(), Some(&serper));
        let names = tools.names();

        assert!(names.contains(&"web_search"));
        assert!(names.contains(&"scrape_page"));
        assert_eq!(tools.declarations().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_text() {
        let temp = TempDir::new().unwrap();
        let agent = Registry::new(false).unwrap().agent(Role::SeoSpecialist);
        let tools = ToolSet::for_agent(&agent, temp.path(), None);

        let output = tools.invoke("nonexistent", &serde_json::json!({})).await;
        assert!(output.starts_with("Error: unknown tool"));
    }
}
