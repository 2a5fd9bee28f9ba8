//! Command-line interface for markforge.
//!
//! Provides commands for running the content pipeline, checking run
//! status, listing runs, browsing generated drafts, and serving the
//! web front-end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::adapters::{GeminiProvider, SerperClient};
use crate::agents::Registry;
use crate::config::{self, Workspace};
use crate::core::{Pipeline, RunMode, Runner};
use crate::domain::{CampaignContext, ContentCategory, PipelineRun, RunState, TaskStatus};

/// markforge - Multi-agent marketing content pipeline
#[derive(Parser, Debug)]
#[command(name = "markforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the content pipeline for a campaign
    Run {
        /// Product or service being marketed
        #[arg(long)]
        product_name: String,

        /// Audience the campaign targets
        #[arg(long)]
        target_audience: String,

        /// Short description of the product
        #[arg(long)]
        product_description: String,

        /// Campaign budget, free-form (e.g. "5000 USD")
        #[arg(long)]
        budget: String,

        /// How much of the pipeline to run
        #[arg(short, long, value_enum, default_value_t = RunMode::Full)]
        mode: RunMode,

        /// Override the campaign date (YYYY-MM-DD; defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Custom task definitions (YAML; defaults to the built-in sequence)
        #[arg(long)]
        tasks: Option<PathBuf>,
    },

    /// Check the status of a run
    Status {
        /// Run ID (UUID)
        run_id: String,
    },

    /// List recent runs
    Runs {
        /// Maximum number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List generated draft files
    Files {
        /// Filter by content category
        #[arg(short, long, value_enum)]
        category: Option<FileCategory>,
    },

    /// Show resolved configuration (debug)
    Config,

    /// Serve the web front-end
    Serve {
        /// Address to bind to
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        address: String,
    },
}

/// Content category for CLI (maps to ContentCategory)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FileCategory {
    /// Long-form blog drafts
    Blogs,

    /// Social media post drafts
    Posts,

    /// Short-form reel scripts
    Reels,

    /// Research notes and other root-level drafts
    General,
}

impl From<FileCategory> for ContentCategory {
    fn from(c: FileCategory) -> Self {
        match c {
            FileCategory::Blogs => ContentCategory::Blog,
            FileCategory::Posts => ContentCategory::SocialPost,
            FileCategory::Reels => ContentCategory::Reel,
            FileCategory::General => ContentCategory::General,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                product_name,
                target_audience,
                product_description,
                budget,
                mode,
                date,
                tasks,
            } => {
                run_campaign(
                    product_name,
                    target_audience,
                    product_description,
                    budget,
                    mode,
                    date,
                    tasks,
                )
                .await
            }
            Commands::Status { run_id } => show_status(&run_id).await,
            Commands::Runs { limit } => list_runs(limit).await,
            Commands::Files { category } => list_files(category).await,
            Commands::Config => show_config().await,
            Commands::Serve { address } => crate::server::serve(&address).await,
        }
    }
}

/// Build a runner from the resolved configuration and environment.
/// Fails before any generation work if the Gemini credential is missing.
pub fn build_runner() -> Result<Runner> {
    let cfg = config::config()?;
    let api_key = config::gemini_api_key()?;

    let provider = Arc::new(GeminiProvider::new(&cfg.model, api_key));
    let registry = Registry::from_env()?;
    let workspace = Workspace::from_config()?;

    let mut runner = Runner::new(provider, registry, workspace);
    if let Some(serper_key) = config::serper_api_key() {
        runner = runner.with_serper(SerperClient::new(serper_key));
    }

    Ok(runner)
}

/// Run the pipeline for a campaign
async fn run_campaign(
    product_name: String,
    target_audience: String,
    product_description: String,
    budget: String,
    mode: RunMode,
    date: Option<String>,
    tasks: Option<PathBuf>,
) -> Result<()> {
    if product_name.trim().is_empty() {
        anyhow::bail!("--product-name must not be empty");
    }
    if target_audience.trim().is_empty() {
        anyhow::bail!("--target-audience must not be empty");
    }

    let runner = build_runner()?;
    let pipeline = match &tasks {
        Some(path) => Pipeline::from_file(path)?,
        None => Pipeline::standard()?,
    };

    let mut context =
        CampaignContext::new(product_name, target_audience, product_description, budget);
    if let Some(date) = date {
        context = context.with_date(date);
    }

    if config::serper_api_key().is_none() {
        eprintln!("Note: SERPER_API_KEY not set, running without web search");
    }
    eprintln!(
        "Running {} pipeline for '{}'...",
        mode.label(),
        context.product_name
    );

    let run = runner.run(&pipeline, mode, context).await?;

    match &run.state {
        RunState::Completed => {
            if let Some(output) = run.final_output() {
                println!("{}", output);
            }
            eprintln!("\n[Run {} completed successfully]", run.id);
            for result in &run.results {
                if let Some(file) = &result.file {
                    eprintln!("  {} -> {}", result.task_name, file.display());
                }
            }
        }
        RunState::Failed { error } => {
            eprintln!("\n[Run {} failed: {}]", run.id, error);
            std::process::exit(1);
        }
        RunState::Running => {
            eprintln!("\n[Run {} in state: {:?}]", run.id, run.state);
        }
    }

    Ok(())
}

/// Show the status of a run
async fn show_status(run_id_str: &str) -> Result<()> {
    let run_id =
        Uuid::parse_str(run_id_str).with_context(|| format!("Invalid run ID: {}", run_id_str))?;

    let runs_dir = config::runs_dir()?;
    let run = PipelineRun::load(&runs_dir, run_id).await?;

    println!("Run ID: {}", run.id);
    println!("Mode: {}", run.mode);
    println!("Product: {}", run.context.product_name);
    println!("State: {:?}", run.state);
    println!("Started: {}", run.started_at);
    if let Some(completed) = run.completed_at {
        println!("Completed: {}", completed);
    }
    println!("\nTask statuses:");
    for result in &run.results {
        let status = match result.status {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        println!("  {}: {} ({} ms)", result.task_name, status, result.duration_ms);
    }

    Ok(())
}

/// List recent runs
async fn list_runs(limit: usize) -> Result<()> {
    let runs_dir = config::runs_dir()?;
    let runs = PipelineRun::list(&runs_dir, limit).await?;

    if runs.is_empty() {
        println!("No runs found");
        return Ok(());
    }

    println!("{:<38} {:<10} {:<25} {:<12}", "RUN ID", "MODE", "PRODUCT", "STATE");
    println!("{}", "-".repeat(87));

    for run in runs {
        let state_str = match &run.state {
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed { .. } => "failed",
        };
        let product = truncate_label(&run.context.product_name, 22);
        println!("{:<38} {:<10} {:<25} {:<12}", run.id, run.mode, product, state_str);
    }

    Ok(())
}

/// Shorten a table cell to `max` characters, never splitting a
/// multibyte character
fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// List generated draft files
async fn list_files(category: Option<FileCategory>) -> Result<()> {
    let drafts = config::drafts_dir()?;

    let categories: Vec<ContentCategory> = match category {
        Some(c) => vec![c.into()],
        None => ContentCategory::browsable().to_vec(),
    };

    let mut total = 0;
    for cat in categories {
        let dir = cat.dir(&drafts);
        if !dir.is_dir() {
            continue;
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read drafts directory: {}", dir.display()))?
        {
            let entry = entry?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        println!("{}/", cat.key());
        if names.is_empty() {
            println!("  (empty)");
        }
        for name in &names {
            println!("  {}", name);
        }
        total += names.len();
    }

    println!("\nTotal: {} files", total);
    Ok(())
}

/// Show the resolved configuration (for debugging)
async fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("markforge configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home (run state): {}", cfg.home.display());
    println!("  Runs:             {}", cfg.home.join("runs").display());
    println!("  Drafts:           {}", cfg.drafts.display());
    println!();
    println!("Model: {}", cfg.model);
    println!();
    println!("Credentials:");
    println!(
        "  GEMINI_API_KEY: {}",
        if config::gemini_api_key().is_ok() { "set" } else { "NOT SET (required)" }
    );
    println!(
        "  SERPER_API_KEY: {}",
        if config::serper_api_key().is_some() { "set (web search enabled)" } else { "not set (web search disabled)" }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label_short_names_unchanged() {
        assert_eq!(truncate_label("WidgetPro", 22), "WidgetPro");
    }

    #[test]
    fn test_truncate_label_long_ascii() {
        assert_eq!(
            truncate_label("A product with a very long name", 22),
            "A product with a very ..."
        );
    }

    #[test]
    fn test_truncate_label_multibyte_names() {
        // Byte 22 falls inside a character here; slicing by bytes
        // would panic
        let rupees = "₹".repeat(30);
        assert_eq!(truncate_label(&rupees, 22), format!("{}...", "₹".repeat(22)));

        let mixed = "Crème Brûlée Boxes légers et fins";
        let truncated = truncate_label(mixed, 22);
        assert_eq!(truncated.chars().count(), 25);
        assert!(truncated.ends_with("..."));
    }
}
