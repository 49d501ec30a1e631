//! The pipeline aggregate.
//!
//! This module provides:
//! - [`Pipeline`]: ordered steps, enable status, failure counter, schedule
//! - [`Schedule`]: manual, one-off and recurring trigger metadata
//! - [`PipelineRepository`]: the persistence port, with an in-memory version

mod aggregate;
mod repository;
mod schedule;

pub use aggregate::{Pipeline, FAILURE_THRESHOLD};
pub use repository::{InMemoryPipelineRepository, PipelineRepository};
pub use schedule::{RecurringFrequency, Schedule, ScheduleType};
