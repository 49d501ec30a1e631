//! Testing utilities for contentflow pipelines.
//!
//! This module provides:
//! - Mock model and action providers
//! - Empty step services and a driver test harness

mod fixtures;
mod mocks;

pub use fixtures::{mock_services, TestHarness};
pub use mocks::{FailingProvider, MockActionProvider, MockLlmProvider};
