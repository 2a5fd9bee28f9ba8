//! Pipeline definition and loading.
//!
//! The task sequence is defined in YAML (embedded default in
//! `config/tasks.yaml`) and is strictly linear: each task binds exactly
//! one agent role and optionally declares the structured output schema.
//! Run modes select a static prefix of the list; there is no dependency
//! graph and no branching between tasks.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::agents::Role;

/// Embedded default task sequence
const DEFAULT_TASKS_YAML: &str = include_str!("../../config/tasks.yaml");

/// The ordered task sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Ordered list of task specifications
    pub tasks: Vec<TaskSpec>,
}

impl Pipeline {
    /// The standard marketing pipeline (embedded definition)
    pub fn standard() -> Result<Self> {
        Self::from_yaml(DEFAULT_TASKS_YAML)
    }

    /// Load a pipeline from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tasks file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a pipeline from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let pipeline: Self =
            serde_yaml::from_str(content).context("Failed to parse tasks YAML")?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Validate the pipeline definition
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            anyhow::bail!("Pipeline must have at least one task");
        }

        for (i, task) in self.tasks.iter().enumerate() {
            if task.name.is_empty() {
                anyhow::bail!("Task {} has an empty name", i);
            }
            if task.description.trim().is_empty() {
                anyhow::bail!("Task '{}' has an empty description", task.name);
            }
            // Task names become file names under the drafts root
            if task.name.contains('/') || task.name.contains('\\') || task.name.contains("..") {
                anyhow::bail!("Task name '{}' contains path characters", task.name);
            }
            if self.tasks[..i].iter().any(|t| t.name == task.name) {
                anyhow::bail!("Duplicate task name '{}'", task.name);
            }
        }

        Ok(())
    }

    /// Get a task by name
    pub fn get_task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// A single task specification: a prompt bound to one agent role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task name (unique within the pipeline)
    pub name: String,

    /// Role of the agent that executes this task
    pub agent: Role,

    /// Prompt template ({field} placeholders from the campaign context)
    pub description: String,

    /// What a good answer looks like, appended to the prompt
    #[serde(default)]
    pub expected_output: String,

    /// Whether the task declares the ContentArtifact output schema
    #[serde(default)]
    pub structured: bool,
}

/// Which prefix of the task list a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Research and strategy only (2 tasks)
    Fastest,

    /// Through social post drafts (4 tasks)
    Fast,

    /// The whole sequence
    Full,
}

impl RunMode {
    /// How many tasks this mode executes at most
    pub fn task_count(&self) -> usize {
        match self {
            Self::Fastest => 2,
            Self::Fast => 4,
            Self::Full => usize::MAX,
        }
    }

    /// The task subset this mode executes: a strict prefix of the list
    pub fn select<'a>(&self, pipeline: &'a Pipeline) -> &'a [TaskSpec] {
        let n = self.task_count().min(pipeline.tasks.len());
        &pipeline.tasks[..n]
    }

    /// Stable label used in run summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Fast => "fast",
            Self::Full => "full",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_shape() {
        let pipeline = Pipeline::standard().unwrap();

        assert_eq!(pipeline.tasks.len(), 8);
        assert_eq!(pipeline.tasks[0].name, "market_research");
        assert_eq!(pipeline.tasks[7].name, "seo_optimization");

        // Schema-declaring tasks
        let structured: Vec<&str> = pipeline
            .tasks
            .iter()
            .filter(|t| t.structured)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(
            structured,
            vec![
                "prepare_post_drafts",
                "prepare_scripts_for_reels",
                "draft_blogs",
                "seo_optimization"
            ]
        );
    }

    #[test]
    fn test_agent_binding() {
        let pipeline = Pipeline::standard().unwrap();
        assert_eq!(
            pipeline.get_task("market_research").unwrap().agent,
            Role::HeadOfMarketing
        );
        assert_eq!(
            pipeline.get_task("draft_blogs").unwrap().agent,
            Role::BlogWriter
        );
        assert_eq!(
            pipeline.get_task("seo_optimization").unwrap().agent,
            Role::SeoSpecialist
        );
    }

    #[test]
    fn test_mode_selects_exact_prefix() {
        let pipeline = Pipeline::standard().unwrap();

        let fastest = RunMode::Fastest.select(&pipeline);
        assert_eq!(fastest.len(), 2);
        assert_eq!(fastest[0].name, "market_research");
        assert_eq!(fastest[1].name, "prepare_marketing_strategy");

        let fast = RunMode::Fast.select(&pipeline);
        assert_eq!(fast.len(), 4);
        assert_eq!(fast[3].name, "prepare_post_drafts");

        assert_eq!(RunMode::Full.select(&pipeline).len(), 8);
    }

    #[test]
    fn test_duplicate_task_names_rejected() {
        let yaml = r#"
tasks:
  - name: one
    agent: head_of_marketing
    description: a
  - name: one
    agent: seo_specialist
    description: b
"#;
        assert!(Pipeline::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(Pipeline::from_yaml("tasks: []").is_err());
    }

    #[test]
    fn test_path_like_task_names_rejected() {
        for name in ["../note", "a/b", "a\\b", "notes/.."] {
            let yaml = format!(
                "tasks:\n  - name: \"{}\"\n    agent: head_of_marketing\n    description: a\n",
                name.replace('\\', "\\\\")
            );
            assert!(
                Pipeline::from_yaml(&yaml).is_err(),
                "name {:?} should be rejected",
                name
            );
        }
    }
}
