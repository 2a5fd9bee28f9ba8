//! Domain data structures.
//!
//! The campaign input record, structured content artifacts, and the
//! per-run result collection.

pub mod artifact;
pub mod context;
pub mod run;

pub use artifact::{ArtifactError, ContentArtifact, ContentCategory};
pub use context::CampaignContext;
pub use run::{PipelineRun, RunState, TaskResult, TaskStatus};
