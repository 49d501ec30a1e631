//! Running pipelines and ingesting their results.
//!
//! - [`RunDriver`]: executes a pipeline's steps in order and maintains the
//!   failure counter
//! - [`RunReport`] / [`StepRunReport`]: what a run recorder needs
//! - [`ResultIngestor`]: writes externally produced step results back

mod driver;
mod ingest;
mod report;

pub use driver::RunDriver;
pub use ingest::{IngestReport, ResultIngestor};
pub use report::{RunReport, StepRunReport, StepStatus};
