//! Run state and persistence.
//!
//! A PipelineRun is the ordered collection of task results from one
//! execution. The run summary is written as `run.json` under the runs
//! directory so it can be inspected after the fact; there is no
//! checkpointing or resume.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::ContentArtifact;
use super::context::CampaignContext;
use crate::agents::Role;

/// A single pipeline execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Run mode label ("full", "fast", "fastest")
    pub mode: String,

    /// Shared input passed to every task
    pub context: CampaignContext,

    /// Current state of the run
    pub state: RunState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (if it has)
    pub completed_at: Option<DateTime<Utc>>,

    /// Task results, ordered by pipeline position
    pub results: Vec<TaskResult>,
}

impl PipelineRun {
    /// Create a new in-progress run
    pub fn new(mode: impl Into<String>, context: CampaignContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: mode.into(),
            context,
            state: RunState::Running,
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
        }
    }

    /// Mark the run completed
    pub fn complete(&mut self) {
        self.state = RunState::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = RunState::Failed {
            error: error.into(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// Output of the last completed task, if any
    pub fn final_output(&self) -> Option<&str> {
        self.results
            .iter()
            .rev()
            .find(|r| r.status == TaskStatus::Completed)
            .map(|r| r.output.as_str())
    }

    /// Check if the run is still in progress
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    /// Persist the run summary as `<runs_dir>/<id>/run.json`
    pub async fn save(&self, runs_dir: &Path) -> Result<PathBuf> {
        let run_dir = runs_dir.join(self.id.to_string());
        tokio::fs::create_dir_all(&run_dir)
            .await
            .with_context(|| format!("Failed to create run directory: {}", run_dir.display()))?;

        let path = run_dir.join("run.json");
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write run summary: {}", path.display()))?;

        Ok(path)
    }

    /// Load a run summary by id
    pub async fn load(runs_dir: &Path, run_id: Uuid) -> Result<Self> {
        let path = runs_dir.join(run_id.to_string()).join("run.json");
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Run {} not found at {}", run_id, path.display()))?;
        serde_json::from_str(&json).context("Failed to parse run summary")
    }

    /// List runs under the runs directory, most recent first
    pub async fn list(runs_dir: &Path, limit: usize) -> Result<Vec<Self>> {
        let mut runs = Vec::new();

        if !runs_dir.exists() {
            return Ok(runs);
        }

        let mut entries = tokio::fs::read_dir(runs_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            let Ok(run_id) = Uuid::parse_str(&name) else {
                continue;
            };
            if let Ok(run) = Self::load(runs_dir, run_id).await {
                runs.push(run);
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }
}

/// State of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunState {
    /// Currently executing
    Running,

    /// All selected tasks completed
    Completed,

    /// Aborted at the first unrecovered task failure
    Failed { error: String },
}

/// Result of one task in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name from the pipeline definition
    pub task_name: String,

    /// Role of the agent that executed the task
    pub role: Role,

    /// Final textual output of the task
    pub output: String,

    /// Structured artifact, for schema-declaring tasks
    pub artifact: Option<ContentArtifact>,

    /// File the output was written to
    pub file: Option<PathBuf>,

    /// Completion status
    pub status: TaskStatus,

    /// Wall-clock task duration in milliseconds
    pub duration_ms: u64,
}

/// Status of a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Completed successfully
    Completed,

    /// Failed (aborts the run)
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> CampaignContext {
        CampaignContext::new("X", "Y", "Z", "1000").with_date("2024-01-01")
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = PipelineRun::new("full", test_context());
        assert!(run.is_running());

        run.complete();
        assert_eq!(run.state, RunState::Completed);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_final_output_skips_failed_tasks() {
        let mut run = PipelineRun::new("full", test_context());
        run.results.push(TaskResult {
            task_name: "market_research".to_string(),
            role: Role::HeadOfMarketing,
            output: "research notes".to_string(),
            artifact: None,
            file: None,
            status: TaskStatus::Completed,
            duration_ms: 10,
        });
        run.results.push(TaskResult {
            task_name: "prepare_marketing_strategy".to_string(),
            role: Role::HeadOfMarketing,
            output: String::new(),
            artifact: None,
            file: None,
            status: TaskStatus::Failed,
            duration_ms: 5,
        });

        assert_eq!(run.final_output(), Some("research notes"));
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut run = PipelineRun::new("fastest", test_context());
        run.complete();

        run.save(temp.path()).await.unwrap();
        let loaded = PipelineRun::load(temp.path(), run.id).await.unwrap();

        assert_eq!(loaded.id, run.id);
        assert_eq!(loaded.state, RunState::Completed);
        assert_eq!(loaded.mode, "fastest");
    }
}
