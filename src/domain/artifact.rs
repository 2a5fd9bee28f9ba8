//! Structured content artifacts produced by schema-declaring tasks.
//!
//! An artifact is the one real structured entity in the system: a typed
//! piece of content persisted as a file under a category directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured output record for content-producing tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentArtifact {
    /// Kind of content: "blog", "social post", "email", "reel"
    pub content_type: String,

    /// Topic the content covers
    pub topic: String,

    /// Audience the content addresses
    pub target_audience: String,

    /// Ordered list of tags/keywords
    pub tags: Vec<String>,

    /// The content body itself
    pub content: String,
}

impl ContentArtifact {
    /// Parse an artifact from a provider's JSON reply
    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(raw.trim())
            .map_err(|e| ArtifactError::InvalidJson(e.to_string()))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check that all five fields are populated
    pub fn validate(&self) -> Result<(), ArtifactError> {
        for (field, value) in [
            ("content_type", &self.content_type),
            ("topic", &self.topic),
            ("target_audience", &self.target_audience),
            ("content", &self.content),
        ] {
            if value.trim().is_empty() {
                return Err(ArtifactError::EmptyField { field });
            }
        }
        if self.tags.is_empty() || self.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(ArtifactError::EmptyField { field: "tags" });
        }
        Ok(())
    }

    /// Category directory this artifact belongs under
    pub fn category(&self) -> ContentCategory {
        ContentCategory::from_content_type(&self.content_type)
    }

    /// File name derived from the topic
    pub fn file_name(&self) -> String {
        format!("{}.md", slug(&self.topic))
    }

    /// Serialize as a markdown document with a metadata header
    pub fn to_markdown(&self) -> String {
        format!(
            "# {}\n\n- content-type: {}\n- target-audience: {}\n- tags: {}\n\n{}\n",
            self.topic,
            self.content_type,
            self.target_audience,
            self.tags.join(", "),
            self.content.trim_end()
        )
    }

    /// JSON schema sent to the provider for structured output
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content_type": {
                    "type": "string",
                    "description": "blog, social post, email, reel"
                },
                "topic": { "type": "string" },
                "target_audience": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "content": { "type": "string" }
            },
            "required": ["content_type", "topic", "target_audience", "tags", "content"]
        })
    }
}

/// Category subdirectories under the drafts root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    /// Long-form posts, saved under blogs/
    Blog,

    /// Social media post drafts, saved under posts/
    SocialPost,

    /// Reel/short-video scripts, saved under reels/
    Reel,

    /// Everything else (emails, research notes), saved at the drafts root
    General,
}

impl ContentCategory {
    /// Map a free-text content_type to a category
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_lowercase();
        if ct.contains("blog") {
            Self::Blog
        } else if ct.contains("reel") {
            Self::Reel
        } else if ct.contains("social") || ct.contains("post") {
            Self::SocialPost
        } else {
            Self::General
        }
    }

    /// Subdirectory relative to the drafts root ("" for General)
    pub fn subdir(&self) -> &'static str {
        match self {
            Self::Blog => "blogs",
            Self::SocialPost => "posts",
            Self::Reel => "reels",
            Self::General => "",
        }
    }

    /// Resolve the directory for this category under a drafts root
    pub fn dir(&self, drafts_root: &Path) -> PathBuf {
        match self.subdir() {
            "" => drafts_root.to_path_buf(),
            sub => drafts_root.join(sub),
        }
    }

    /// Identifier used by the files API and CLI filters
    pub fn key(&self) -> &'static str {
        match self {
            Self::General => "general",
            other => other.subdir(),
        }
    }

    /// All categories that have their own subdirectory
    pub fn subdirs() -> [ContentCategory; 3] {
        [Self::Blog, Self::SocialPost, Self::Reel]
    }

    /// Categories shown in file listings (General covers files at the
    /// drafts root itself)
    pub fn browsable() -> [ContentCategory; 4] {
        [Self::Blog, Self::SocialPost, Self::Reel, Self::General]
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Blog => "blog",
            Self::SocialPost => "social post",
            Self::Reel => "reel",
            Self::General => "general",
        };
        write!(f, "{}", name)
    }
}

/// Artifact schema violations
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("Artifact reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Artifact field '{field}' is empty")]
    EmptyField { field: &'static str },
}

/// Lowercase alphanumeric slug with dashes, capped at 64 chars
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
        if out.len() >= 64 {
            break;
        }
    }
    let trimmed = out.trim_matches('-').to_string();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentArtifact {
        ContentArtifact {
            content_type: "blog".to_string(),
            topic: "AI in Excel: 5 Wins".to_string(),
            target_audience: "SMEs".to_string(),
            tags: vec!["ai".to_string(), "excel".to_string()],
            content: "Body text.".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_artifact() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_content() {
        let mut artifact = sample();
        artifact.content = "  ".to_string();
        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::EmptyField { field: "content" })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_tags() {
        let mut artifact = sample();
        artifact.tags.clear();
        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::EmptyField { field: "tags" })
        ));

        artifact.tags = vec!["".to_string()];
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed = ContentArtifact::from_json(&json).unwrap();
        assert_eq!(parsed.topic, "AI in Excel: 5 Wins");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ContentArtifact::from_json("not json"),
            Err(ArtifactError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            ContentCategory::from_content_type("blog"),
            ContentCategory::Blog
        );
        assert_eq!(
            ContentCategory::from_content_type("Social Post"),
            ContentCategory::SocialPost
        );
        assert_eq!(
            ContentCategory::from_content_type("reel"),
            ContentCategory::Reel
        );
        assert_eq!(
            ContentCategory::from_content_type("email"),
            ContentCategory::General
        );
    }

    #[test]
    fn test_category_keys() {
        assert_eq!(ContentCategory::Blog.key(), "blogs");
        assert_eq!(ContentCategory::General.key(), "general");
        assert_eq!(ContentCategory::General.subdir(), "");
        assert!(ContentCategory::browsable().contains(&ContentCategory::General));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("AI in Excel: 5 Wins"), "ai-in-excel-5-wins");
        assert_eq!(slug("   "), "untitled");
        assert_eq!(slug("--A--B--"), "a-b");
    }

    #[test]
    fn test_file_name_uses_topic_slug() {
        assert_eq!(sample().file_name(), "ai-in-excel-5-wins.md");
    }
}
