//! File tools scoped to the drafts tree.
//!
//! All paths are taken relative to the tool's root; absolute paths and
//! `..` traversal are rejected so an agent cannot reach outside the
//! output tree.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::Pattern;

use super::Tool;

/// Resolve a model-supplied relative path inside `root`
fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf> {
    let candidate = Path::new(relative);

    if candidate.is_absolute() {
        anyhow::bail!("Absolute paths are not allowed: {}", relative);
    }
    for component in candidate.components() {
        if matches!(component, Component::ParentDir) {
            anyhow::bail!("Path traversal is not allowed: {}", relative);
        }
    }

    Ok(root.join(candidate))
}

fn string_arg<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .with_context(|| format!("Missing required argument '{}'", key))
}

/// Read a file under the drafts tree
pub struct ReadFile {
    root: PathBuf,
}

impl ReadFile {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a draft file. Takes a path relative to the drafts directory."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative file path" }
            },
            "required": ["path"]
        })
    }

    async fn invoke(&self, args: &serde_json::Value) -> Result<String> {
        let path = resolve_within(&self.root, string_arg(args, "path")?)?;
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Write a file under the drafts tree
pub struct WriteFile {
    root: PathBuf,
}

impl WriteFile {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write a draft file. Takes a path relative to the drafts directory and the content to write."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Relative file path" },
                "content": { "type": "string", "description": "File content" }
            },
            "required": ["path", "content"]
        })
    }

    async fn invoke(&self, args: &serde_json::Value) -> Result<String> {
        let path = resolve_within(&self.root, string_arg(args, "path")?)?;
        let content = string_arg(args, "content")?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(format!("Wrote {} bytes to {}", content.len(), path.display()))
    }
}

/// List files under the tool's root, optionally filtered by a glob
pub struct ListDir {
    root: PathBuf,
}

impl ListDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn collect(dir: &Path, root: &Path, pattern: Option<&Pattern>, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                Self::collect(&path, root, pattern, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                let rel = rel.to_string_lossy().to_string();
                if pattern.map(|p| p.matches(&rel)).unwrap_or(true) {
                    out.push(rel);
                }
            }
        }
    }
}

#[async_trait]
impl Tool for ListDir {
    fn name(&self) -> &'static str {
        "list_dir"
    }

    fn description(&self) -> &'static str {
        "List draft files. Optional glob pattern, e.g. '*.md' or 'blogs/*'."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Optional glob filter" }
            }
        })
    }

    async fn invoke(&self, args: &serde_json::Value) -> Result<String> {
        let pattern = match args.get("pattern").and_then(|v| v.as_str()) {
            Some(p) => Some(Pattern::new(p).with_context(|| format!("Invalid glob: {}", p))?),
            None => None,
        };

        let mut files = Vec::new();
        Self::collect(&self.root, &self.root, pattern.as_ref(), &mut files);
        files.sort();

        if files.is_empty() {
            Ok("(no files)".to_string())
        } else {
            Ok(files.join("\n"))
        }
    }
}
