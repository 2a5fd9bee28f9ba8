//! Pipeline definition and sequential execution.

pub mod pipeline;
pub mod runner;

pub use pipeline::{Pipeline, RunMode, TaskSpec};
pub use runner::Runner;
