//! Sequential pipeline runner.
//!
//! Executes the selected task prefix strictly in order, passing the
//! shared campaign context plus the outputs of earlier tasks to each
//! one. A task failure aborts the run; there is no retry and no resume.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{GenerationRequest, Provider, ProviderReply, SerperClient, Turn};
use crate::agents::{Agent, Registry, Role};
use crate::config::Workspace;
use crate::domain::{CampaignContext, ContentArtifact, PipelineRun, TaskResult, TaskStatus};
use crate::tools::ToolSet;

use super::pipeline::{Pipeline, RunMode, TaskSpec};

/// Per-output cap when prior task outputs are folded into a prompt
const CONTEXT_SNIPPET_CHARS: usize = 4_000;

/// Sequential pipeline runner
pub struct Runner {
    provider: Arc<dyn Provider>,
    registry: Registry,
    workspace: Workspace,
    serper: Option<SerperClient>,
    pacer: Pacer,
}

impl Runner {
    /// Create a runner over a provider
    pub fn new(provider: Arc<dyn Provider>, registry: Registry, workspace: Workspace) -> Self {
        Self {
            provider,
            registry,
            workspace,
            serper: None,
            pacer: Pacer::new(Duration::from_secs(60)),
        }
    }

    /// Attach the search client (enables the Search capability's tool)
    pub fn with_serper(mut self, serper: SerperClient) -> Self {
        self.serper = Some(serper);
        self
    }

    /// Override the rate-limit window (default: one minute)
    pub fn with_pacing_window(mut self, window: Duration) -> Self {
        self.pacer = Pacer::new(window);
        self
    }

    /// Execute the selected prefix of the pipeline with the given context.
    ///
    /// Returns the run record in all cases where the run itself could be
    /// started; a task failure is recorded on the run, not bubbled as Err.
    #[instrument(skip(self, pipeline, context), fields(mode = mode.label()))]
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        mode: RunMode,
        context: CampaignContext,
    ) -> Result<PipelineRun> {
        self.workspace.ensure()?;

        let mut run = PipelineRun::new(mode.label(), context.clone());
        let selected = mode.select(pipeline);
        info!(run_id = %run.id, tasks = selected.len(), "Starting pipeline run");

        for task in selected {
            info!(task = %task.name, role = %task.agent, "Executing task");

            match self.execute_task(task, &context, &run.results).await {
                Ok(result) => {
                    debug!(
                        task = %task.name,
                        duration_ms = result.duration_ms,
                        structured = result.artifact.is_some(),
                        "Task completed"
                    );
                    run.results.push(result);
                }
                Err(e) => {
                    error!(task = %task.name, error = %e, "Task failed, aborting run");
                    run.results.push(TaskResult {
                        task_name: task.name.clone(),
                        role: task.agent,
                        output: String::new(),
                        artifact: None,
                        file: None,
                        status: TaskStatus::Failed,
                        duration_ms: 0,
                    });
                    run.fail(format!("Task '{}' failed: {}", task.name, e));
                    self.persist(&run).await;
                    return Ok(run);
                }
            }
        }

        run.complete();
        info!(run_id = %run.id, "Run completed");
        self.persist(&run).await;
        Ok(run)
    }

    /// Execute one task end to end
    async fn execute_task(
        &self,
        task: &TaskSpec,
        context: &CampaignContext,
        prior: &[TaskResult],
    ) -> Result<TaskResult> {
        let started = Instant::now();

        let agent = self.registry.agent(task.agent);
        let tools = ToolSet::for_agent(&agent, &self.workspace.drafts, self.serper.as_ref());

        // Profile goals/backstories carry the same {field} placeholders
        // as task descriptions
        let system = context.render(&agent.system_instruction(&context.current_date));
        let prompt = assemble_prompt(task, context, prior);

        let draft = self.drive_agent(&agent, &tools, &system, prompt).await?;
        if draft.trim().is_empty() {
            anyhow::bail!("Model returned an empty result");
        }

        let (artifact, file) = if task.structured {
            let artifact = self.structure_artifact(&agent, &system, &draft).await?;
            let dir = self.workspace.category_dir(artifact.category());
            let path = dir.join(artifact.file_name());
            tokio::fs::write(&path, artifact.to_markdown())
                .await
                .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
            (Some(artifact), Some(path))
        } else {
            let path = self.workspace.drafts.join(format!("{}.md", task.name));
            tokio::fs::write(&path, &draft)
                .await
                .with_context(|| format!("Failed to write draft: {}", path.display()))?;
            (None, Some(path))
        };

        Ok(TaskResult {
            task_name: task.name.clone(),
            role: task.agent,
            output: draft,
            artifact,
            file,
            status: TaskStatus::Completed,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Bounded tool loop: at most `max_iter` round-trips with tools, then
    /// one final tool-free call if the model is still asking for tools.
    async fn drive_agent(
        &self,
        agent: &Agent,
        tools: &ToolSet,
        system: &str,
        prompt: String,
    ) -> Result<String> {
        let declarations = tools.declarations();
        let mut turns = vec![Turn::User(prompt)];

        for _ in 0..agent.max_iter {
            self.pacer.admit(agent.role, agent.max_rpm).await;

            let reply = self
                .provider
                .generate(GenerationRequest {
                    system_instruction: system.to_string(),
                    turns: turns.clone(),
                    generation: agent.generation,
                    tools: declarations.clone(),
                    response_schema: None,
                })
                .await?;

            match reply {
                ProviderReply::Text(text) => return Ok(text),
                ProviderReply::ToolCall { name, args } => {
                    debug!(role = %agent.role, tool = %name, "Tool call");
                    let output = tools.invoke(&name, &args).await;
                    turns.push(Turn::ToolCall {
                        name: name.clone(),
                        args,
                    });
                    turns.push(Turn::ToolResult {
                        name,
                        content: output,
                    });
                }
            }
        }

        // Iteration budget spent on tools; force a text answer
        warn!(role = %agent.role, "Iteration cap reached, requesting final answer");
        self.pacer.admit(agent.role, agent.max_rpm).await;
        let reply = self
            .provider
            .generate(GenerationRequest {
                system_instruction: system.to_string(),
                turns,
                generation: agent.generation,
                tools: Vec::new(),
                response_schema: None,
            })
            .await?;

        match reply {
            ProviderReply::Text(text) => Ok(text),
            ProviderReply::ToolCall { name, .. } => {
                anyhow::bail!("Model kept requesting tool '{}' with no tools offered", name)
            }
        }
    }

    /// Second pass for schema-declaring tasks: structure the draft into a
    /// validated ContentArtifact (tool-free, JSON response schema).
    async fn structure_artifact(
        &self,
        agent: &Agent,
        system: &str,
        draft: &str,
    ) -> Result<ContentArtifact> {
        let prompt = format!(
            "Format the draft below as the required JSON object. Use the draft's \
             own wording for `content`; fill `content_type`, `topic`, \
             `target_audience`, and `tags` from it. Every field must be \
             populated.\n\n---\n{}",
            draft
        );

        self.pacer.admit(agent.role, agent.max_rpm).await;
        let reply = self
            .provider
            .generate(GenerationRequest {
                system_instruction: system.to_string(),
                turns: vec![Turn::User(prompt)],
                generation: agent.generation,
                tools: Vec::new(),
                response_schema: Some(ContentArtifact::response_schema()),
            })
            .await?;

        let raw = match reply {
            ProviderReply::Text(text) => text,
            ProviderReply::ToolCall { name, .. } => {
                anyhow::bail!("Expected structured JSON, got tool call '{}'", name)
            }
        };

        ContentArtifact::from_json(&raw).map_err(anyhow::Error::from)
    }

    /// Best-effort run summary persistence; a failed write must not mask
    /// the run outcome.
    async fn persist(&self, run: &PipelineRun) {
        if let Err(e) = run.save(&self.workspace.runs).await {
            warn!(run_id = %run.id, error = %e, "Failed to persist run summary");
        }
    }
}

/// Build the user prompt for a task: rendered description, expected
/// output, and the outputs of earlier tasks only.
pub fn assemble_prompt(task: &TaskSpec, context: &CampaignContext, prior: &[TaskResult]) -> String {
    let mut prompt = context.render(&task.description);

    if !task.expected_output.trim().is_empty() {
        prompt.push_str("\n\nExpected output: ");
        prompt.push_str(context.render(&task.expected_output).trim());
    }

    if !prior.is_empty() {
        prompt.push_str("\n\nWork completed so far:");
        for result in prior {
            let mut snippet = result.output.as_str();
            if snippet.len() > CONTEXT_SNIPPET_CHARS {
                let mut cut = CONTEXT_SNIPPET_CHARS;
                while !snippet.is_char_boundary(cut) {
                    cut -= 1;
                }
                snippet = &snippet[..cut];
            }
            prompt.push_str(&format!("\n\n## {}\n{}", result.task_name, snippet));
        }
    }

    prompt
}

/// Sliding-window requests-per-minute limiter, keyed by role
struct Pacer {
    window: Duration,
    stamps: tokio::sync::Mutex<HashMap<Role, VecDeque<Instant>>>,
}

impl Pacer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            stamps: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Wait until a request for `role` fits under `max_rpm` in the window.
    /// A limit of zero means unpaced.
    async fn admit(&self, role: Role, max_rpm: u32) {
        if max_rpm == 0 {
            return;
        }
        loop {
            let wait = {
                let mut stamps = self.stamps.lock().await;
                let queue = stamps.entry(role).or_default();

                while let Some(front) = queue.front() {
                    if front.elapsed() >= self.window {
                        queue.pop_front();
                    } else {
                        break;
                    }
                }

                if (queue.len() as u32) < max_rpm {
                    queue.push_back(Instant::now());
                    return;
                }

                // Oldest stamp decides how long until a slot frees up
                let Some(front) = queue.front() else { continue };
                self.window.saturating_sub(front.elapsed())
            };

            debug!(role = %role, wait_ms = wait.as_millis() as u64, "Pacing provider request");
            tokio::time::sleep(wait).await;
        }
    }
}
