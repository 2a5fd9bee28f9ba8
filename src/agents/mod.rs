//! Role-bound agent registry.
//!
//! Four roles, each with a static prompt identity (loaded from
//! `config/agents.yaml`), a capability set, and a shared generation
//! budget. Web capabilities (search/scrape) are attached only when a
//! search-provider credential is available; otherwise agents are
//! restricted to local file tools.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Embedded default role configuration
const DEFAULT_AGENTS_YAML: &str = include_str!("../../config/agents.yaml");

/// The four pipeline roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Market research and strategy
    HeadOfMarketing,

    /// Calendar, post drafts, and reel scripts
    SocialMediaCreator,

    /// Blog research and drafts
    BlogWriter,

    /// Final SEO pass
    SeoSpecialist,
}

impl Role {
    /// All roles, in pipeline order of first appearance
    pub fn all() -> [Role; 4] {
        [
            Role::HeadOfMarketing,
            Role::SocialMediaCreator,
            Role::BlogWriter,
            Role::SeoSpecialist,
        ]
    }

    /// Key used in the agents YAML file
    pub fn key(&self) -> &'static str {
        match self {
            Role::HeadOfMarketing => "head_of_marketing",
            Role::SocialMediaCreator => "social_media_creator",
            Role::BlogWriter => "blog_writer",
            Role::SeoSpecialist => "seo_specialist",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Tools an agent may invoke during a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Web search via the search provider
    Search,

    /// Fetch and strip a web page
    Scrape,

    /// Read a file under the drafts tree
    ReadFile,

    /// Write a file under the drafts tree
    WriteFile,

    /// List files under the drafts tree
    ListDir,
}

/// Shared language-model generation settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        // Tight budget: outputs stay compact and cheap
        Self {
            temperature: 0.3,
            top_p: 0.8,
            max_output_tokens: 900,
        }
    }
}

/// Prompt identity for a role, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Human-readable role label
    pub role: String,

    /// What this agent is trying to achieve
    pub goal: String,

    /// Persona/context injected into the system instruction
    pub backstory: String,
}

/// A role-bound agent, immutable after construction
#[derive(Debug, Clone)]
pub struct Agent {
    pub role: Role,
    pub profile: AgentProfile,
    pub capabilities: Vec<Capability>,
    pub generation: GenerationConfig,

    /// Maximum model round-trips per task (tool loop bound)
    pub max_iter: u32,

    /// Maximum provider requests per minute
    pub max_rpm: u32,

    /// Subdirectory the ListDir capability is scoped to (drafts root if None)
    pub list_scope: Option<String>,
}

impl Agent {
    /// Check whether a capability is attached
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// System instruction assembled from the profile
    pub fn system_instruction(&self, current_date: &str) -> String {
        format!(
            "You are {role}. {backstory}\n\nYour goal: {goal}\nToday's date is {date}.\nKeep outputs tight and useful; do not pad.",
            role = self.profile.role,
            backstory = self.profile.backstory,
            goal = self.profile.goal,
            date = current_date,
        )
    }
}

/// Constructs role-bound agents from static configuration
#[derive(Debug, Clone)]
pub struct Registry {
    profiles: HashMap<String, AgentProfile>,
    search_available: bool,
}

impl Registry {
    /// Build a registry from the embedded role configuration
    pub fn new(search_available: bool) -> Result<Self> {
        Self::from_yaml(DEFAULT_AGENTS_YAML, search_available)
    }

    /// Build a registry from YAML role configuration
    pub fn from_yaml(yaml: &str, search_available: bool) -> Result<Self> {
        let profiles: HashMap<String, AgentProfile> =
            serde_yaml::from_str(yaml).context("Failed to parse agents YAML")?;

        for role in Role::all() {
            if !profiles.contains_key(role.key()) {
                anyhow::bail!("Agents config is missing role '{}'", role.key());
            }
        }

        Ok(Self {
            profiles,
            search_available,
        })
    }

    /// Build a registry, detecting the search credential from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(crate::config::serper_api_key().is_some())
    }

    /// Construct the agent for a role
    pub fn agent(&self, role: Role) -> Agent {
        let profile = self.profiles[role.key()].clone();

        let mut capabilities = Vec::new();
        if self.search_available {
            capabilities.push(Capability::Search);
            capabilities.push(Capability::Scrape);
        }
        capabilities.extend([
            Capability::ListDir,
            Capability::ReadFile,
            Capability::WriteFile,
        ]);

        // Research/review roles get a smaller loop than drafting roles
        let max_iter = match role {
            Role::HeadOfMarketing | Role::SeoSpecialist => 2,
            Role::SocialMediaCreator | Role::BlogWriter => 3,
        };

        // The blog writer reads only its own directory to keep context small
        let list_scope = match role {
            Role::BlogWriter => Some("blogs".to_string()),
            _ => None,
        };

        Agent {
            role,
            profile,
            capabilities,
            generation: GenerationConfig::default(),
            max_iter,
            max_rpm: 3,
            list_scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds_all_roles() {
        let registry = Registry::new(true).unwrap();
        for role in Role::all() {
            let agent = registry.agent(role);
            assert_eq!(agent.role, role);
            assert!(!agent.profile.goal.is_empty());
        }
    }

    #[test]
    fn test_web_capabilities_require_search_credential() {
        let without = Registry::new(false).unwrap().agent(Role::HeadOfMarketing);
        assert!(!without.has_capability(Capability::Search));
        assert!(!without.has_capability(Capability::Scrape));
        assert!(without.has_capability(Capability::ReadFile));
        assert!(without.has_capability(Capability::WriteFile));
        assert!(without.has_capability(Capability::ListDir));

        let with = Registry::new(true).unwrap().agent(Role::HeadOfMarketing);
        assert!(with.has_capability(Capability::Search));
        assert!(with.has_capability(Capability::Scrape));
    }

    #[test]
    fn test_iteration_caps_per_role() {
        let registry = Registry::new(false).unwrap();
        assert_eq!(registry.agent(Role::HeadOfMarketing).max_iter, 2);
        assert_eq!(registry.agent(Role::SeoSpecialist).max_iter, 2);
        assert_eq!(registry.agent(Role::SocialMediaCreator).max_iter, 3);
        assert_eq!(registry.agent(Role::BlogWriter).max_iter, 3);
    }

    #[test]
    fn test_blog_writer_list_scope() {
        let registry = Registry::new(false).unwrap();
        assert_eq!(
            registry.agent(Role::BlogWriter).list_scope.as_deref(),
            Some("blogs")
        );
        assert!(registry.agent(Role::SeoSpecialist).list_scope.is_none());
    }

    #[test]
    fn test_missing_role_rejected() {
        let yaml = r#"
head_of_marketing:
  role: Head of Marketing
  goal: g
  backstory: b
"#;
        assert!(Registry::from_yaml(yaml, false).is_err());
    }
}
