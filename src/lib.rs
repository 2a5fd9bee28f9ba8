//! markforge - Sequential marketing-content pipeline over role-bound
//! generative agents
//!
//! A fixed, strictly linear pipeline of content-generation tasks
//! (market research → strategy → calendar → posts → reels → blog
//! research → blog drafts → SEO), each bound to one role-configured
//! agent backed by a generative-text provider.
//!
//! # Modules
//!
//! - `adapters`: Provider integrations (Gemini, Serper)
//! - `agents`: Role-bound agent registry and capability sets
//! - `core`: Pipeline definition and the sequential runner
//! - `domain`: Data structures (CampaignContext, ContentArtifact, PipelineRun)
//! - `tools`: Capability implementations (search, scrape, file tools)
//! - `cli`: Command-line interface
//! - `server`: Web form front-end
//!
//! # Usage
//!
//! ```bash
//! # Run the full campaign pipeline
//! markforge run --product-name "X" --target-audience "Y" \
//!     --product-description "Z" --budget "1000"
//!
//! # Check a previous run
//! markforge status <run-id>
//!
//! # Web front-end
//! markforge serve --address 127.0.0.1:8080
//! ```

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod tools;

// Re-export main types at crate root for convenience
pub use crate::core::{Pipeline, RunMode, Runner, TaskSpec};
pub use agents::{Agent, Capability, Registry, Role};
pub use domain::{CampaignContext, ContentArtifact, ContentCategory, PipelineRun, RunState};
