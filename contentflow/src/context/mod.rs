//! Run-time state threaded through a pipeline run.
//!
//! This module provides:
//! - The per-run [`ExecutionContext`] every step reads and writes
//! - Run identity for correlating logs, events and reports
//! - Template rendering over earlier step outputs

mod execution;
mod identity;
mod template;

pub use execution::ExecutionContext;
pub use identity::RunIdentity;
pub use template::{render_template, PREVIOUS_RESULT_PLACEHOLDER};
