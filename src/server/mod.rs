//! Web front-end: a campaign form that starts pipeline runs, plus a
//! small JSON API for browsing the generated drafts.
//!
//! Credentials can come from the form or from the environment; the run
//! endpoint rejects the request before any generation work when no
//! Gemini key is available from either source.

use std::path::Component;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::adapters::{GeminiProvider, SerperClient};
use crate::agents::Registry;
use crate::config::{self, Workspace};
use crate::core::{Pipeline, RunMode, Runner};
use crate::domain::{CampaignContext, ContentCategory, RunState};

static INDEX_HTML: &str = include_str!("index.html");

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub workspace: Workspace,
    pub model: String,
}

/// JSON error response with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Start the HTTP server on the given address
pub async fn serve(address: &str) -> Result<()> {
    let cfg = config::config()?;
    let state = Arc::new(AppState {
        workspace: Workspace::from_config()?,
        model: cfg.model.clone(),
    });
    state.workspace.ensure()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("Serving on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/run", post(start_run))
        .route("/api/files", get(list_files))
        .route("/api/files/{category}/{name}", get(get_file))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    product_name: String,
    target_audience: String,
    product_description: String,
    budget: String,
    #[serde(default)]
    mode: Option<RunMode>,
    /// Overrides GEMINI_API_KEY for this request
    #[serde(default)]
    gemini_api_key: Option<String>,
    /// Overrides SERPER_API_KEY for this request
    #[serde(default)]
    serper_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    run_id: String,
    state: String,
    error: Option<String>,
    final_output: Option<String>,
    files: Vec<String>,
}

/// Run the pipeline for the submitted campaign. Blocks until the run
/// finishes; failures are reported in the response body, not as 5xx.
async fn start_run(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    for (field, value) in [
        ("product_name", &request.product_name),
        ("target_audience", &request.target_audience),
        ("product_description", &request.product_description),
        ("budget", &request.budget),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{} must not be empty", field)));
        }
    }

    let gemini_key = request
        .gemini_api_key
        .filter(|k| !k.trim().is_empty())
        .map(Ok)
        .unwrap_or_else(|| config::gemini_api_key().map_err(|e| e.to_string()))
        .map_err(|_| {
            ApiError::bad_request(
                "No Gemini API key: provide gemini_api_key or set GEMINI_API_KEY",
            )
        })?;

    let serper_key = request
        .serper_api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(config::serper_api_key);

    let pipeline = Pipeline::standard().map_err(|e| ApiError::internal(e.to_string()))?;
    let registry = Registry::new(serper_key.is_some())
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let provider = Arc::new(GeminiProvider::new(&state.model, gemini_key));
    let mut runner = Runner::new(provider, registry, state.workspace.clone());
    if let Some(key) = serper_key {
        runner = runner.with_serper(SerperClient::new(key));
    }

    let mode = request.mode.unwrap_or(RunMode::Full);
    let context = CampaignContext::new(
        request.product_name,
        request.target_audience,
        request.product_description,
        request.budget,
    );

    let run = runner.run(&pipeline, mode, context).await.map_err(|e| {
        error!(error = %e, "Run could not be started");
        ApiError::internal(e.to_string())
    })?;

    let (state_str, error) = match &run.state {
        RunState::Completed => ("completed", None),
        RunState::Failed { error } => ("failed", Some(error.clone())),
        RunState::Running => ("running", None),
    };

    Ok(Json(RunResponse {
        run_id: run.id.to_string(),
        state: state_str.to_string(),
        error,
        final_output: run.final_output().map(str::to_string),
        files: run
            .results
            .iter()
            .filter_map(|r| r.file.as_ref())
            .map(|p| p.display().to_string())
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct FilesQuery {
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct FileEntry {
    category: String,
    name: String,
}

/// List draft files, optionally filtered by category
async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let categories = match query.category.as_deref() {
        Some(c) => vec![parse_category(c)?],
        None => ContentCategory::browsable().to_vec(),
    };

    let mut entries = Vec::new();
    for category in categories {
        let dir = category.dir(&state.workspace.drafts);
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(_) => continue,
        };
        // General resolves to the drafts root; the is_file check keeps
        // the category subdirectories out of its listing
        while let Ok(Some(entry)) = reader.next_entry().await {
            if entry.path().is_file() {
                entries.push(FileEntry {
                    category: category.key().to_string(),
                    name: entry.file_name().to_string_lossy().into_owned(),
                });
            }
        }
    }

    entries.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
    Ok(Json(entries))
}

/// Fetch one draft file as markdown text
async fn get_file(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let category = parse_category(&category)?;

    // File names come from slugs; anything path-like is rejected
    let name_path = std::path::Path::new(&name);
    if name_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let path = category.dir(&state.workspace.drafts).join(&name);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| ApiError::not_found(format!("No such file: {}", name)))?;

    Ok(([("content-type", "text/markdown; charset=utf-8")], content).into_response())
}

fn parse_category(value: &str) -> Result<ContentCategory, ApiError> {
    ContentCategory::browsable()
        .into_iter()
        .find(|c| c.key() == value)
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "Unknown category '{}' (expected blogs, posts, reels, or general)",
                value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("blogs").unwrap(), ContentCategory::Blog);
        assert_eq!(parse_category("posts").unwrap(), ContentCategory::SocialPost);
        assert_eq!(parse_category("reels").unwrap(), ContentCategory::Reel);
        assert_eq!(parse_category("general").unwrap(), ContentCategory::General);
        assert!(parse_category("other").is_err());
    }

    #[tokio::test]
    async fn test_list_files_includes_root_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::rooted_at(dir.path());
        workspace.ensure().unwrap();

        std::fs::write(workspace.drafts.join("market_research.md"), "# notes").unwrap();
        std::fs::write(workspace.drafts.join("blogs/why.md"), "# blog").unwrap();

        let state = Arc::new(AppState {
            workspace,
            model: "test-model".to_string(),
        });

        let Json(entries) = list_files(State(state.clone()), Query(FilesQuery { category: None }))
            .await
            .unwrap();
        let listed: Vec<(String, String)> = entries
            .into_iter()
            .map(|e| (e.category, e.name))
            .collect();
        assert!(listed.contains(&("general".to_string(), "market_research.md".to_string())));
        assert!(listed.contains(&("blogs".to_string(), "why.md".to_string())));
        // The category subdirectories are not files of the root listing
        assert!(!listed.iter().any(|(_, name)| name == "blogs"));

        let Json(only_root) = list_files(
            State(state),
            Query(FilesQuery {
                category: Some("general".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(only_root.len(), 1);
        assert_eq!(only_root[0].name, "market_research.md");
    }
}
