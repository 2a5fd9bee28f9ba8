//! Configuration for markforge paths and credentials.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MARKFORGE_HOME, MARKFORGE_DRAFTS)
//! 2. Config file (.markforge/config.yaml)
//! 3. Defaults (~/.markforge, ./resources/drafts)
//!
//! Config file discovery:
//! - Searches current directory and parents for .markforge/config.yaml
//! - Paths in config file are relative to the config file's parent directory
//!
//! Credentials are environment-only: GEMINI_API_KEY (required, with
//! GOOGLE_API_KEY accepted as an alias) and SERPER_API_KEY (optional).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::ContentCategory;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Run summaries directory (relative to config file)
    pub home: Option<String>,
    /// Drafts output tree (relative to config file)
    pub drafts: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Run summaries and engine state
    pub home: PathBuf,
    /// Root of the generated-content tree
    pub drafts: PathBuf,
    /// Generation model id
    pub model: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".markforge").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".markforge");

    let default_drafts = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("resources")
        .join("drafts");

    let config_file = find_config_file();

    let (home, drafts, model) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .markforge/ (i.e., the project root)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        let home = if let Ok(env_home) = std::env::var("MARKFORGE_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            resolve_path(base_dir, home_path)
        } else {
            default_home.clone()
        };

        let drafts = if let Ok(env_drafts) = std::env::var("MARKFORGE_DRAFTS") {
            PathBuf::from(env_drafts)
        } else if let Some(ref drafts_path) = config.paths.drafts {
            resolve_path(base_dir, drafts_path)
        } else {
            default_drafts.clone()
        };

        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        (home, drafts, model)
    } else {
        let home = std::env::var("MARKFORGE_HOME")
            .map(PathBuf::from)
            .unwrap_or(default_home);

        let drafts = std::env::var("MARKFORGE_DRAFTS")
            .map(PathBuf::from)
            .unwrap_or(default_drafts);

        (home, drafts, DEFAULT_MODEL.to_string())
    };

    Ok(ResolvedConfig {
        home,
        drafts,
        model,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the runs directory ($MARKFORGE_HOME/runs)
pub fn runs_dir() -> Result<PathBuf> {
    Ok(config()?.home.join("runs"))
}

/// Get the drafts root directory
pub fn drafts_dir() -> Result<PathBuf> {
    Ok(config()?.drafts.clone())
}

/// Required generation-provider credential.
///
/// Checked before any work starts; a missing key aborts the run up front.
pub fn gemini_api_key() -> Result<String> {
    std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .ok()
        .filter(|k| !k.trim().is_empty())
        .context("GEMINI_API_KEY is not set (GOOGLE_API_KEY is accepted as an alias)")
}

/// Optional search-provider credential; gates the Search/Scrape capabilities
pub fn serper_api_key() -> Option<String> {
    std::env::var("SERPER_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Output locations for a run: the drafts tree and the runs directory
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root of the generated-content tree
    pub drafts: PathBuf,

    /// Where run summaries are written
    pub runs: PathBuf,
}

impl Workspace {
    /// Workspace from the resolved global configuration
    pub fn from_config() -> Result<Self> {
        Ok(Self {
            drafts: drafts_dir()?,
            runs: runs_dir()?,
        })
    }

    /// Workspace rooted at an explicit directory (tests, overrides)
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            drafts: root.join("drafts"),
            runs: root.join("runs"),
        }
    }

    /// Create the drafts tree (root + category subdirectories) and runs dir
    pub fn ensure(&self) -> Result<()> {
        for category in ContentCategory::subdirs() {
            let dir = category.dir(&self.drafts);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create drafts directory: {}", dir.display()))?;
        }
        std::fs::create_dir_all(&self.runs)
            .with_context(|| format!("Failed to create runs directory: {}", self.runs.display()))?;
        Ok(())
    }

    /// Directory for a content category
    pub fn category_dir(&self, category: ContentCategory) -> PathBuf {
        category.dir(&self.drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let markforge_dir = temp.path().join(".markforge");
        std::fs::create_dir_all(&markforge_dir).unwrap();

        let config_path = markforge_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  drafts: ./resources/drafts
model: gemini-1.5-pro
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./state".to_string()));
        assert_eq!(config.paths.drafts, Some("./resources/drafts".to_string()));
        assert_eq!(config.model, Some("gemini-1.5-pro".to_string()));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }

    #[test]
    fn test_workspace_layout() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::rooted_at(temp.path());
        workspace.ensure().unwrap();

        assert!(workspace.drafts.join("blogs").is_dir());
        assert!(workspace.drafts.join("posts").is_dir());
        assert!(workspace.drafts.join("reels").is_dir());
        assert!(workspace.runs.is_dir());

        assert_eq!(
            workspace.category_dir(ContentCategory::Blog),
            workspace.drafts.join("blogs")
        );
        assert_eq!(
            workspace.category_dir(ContentCategory::General),
            workspace.drafts
        );
    }
}
