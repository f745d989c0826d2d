//! Shared test utilities for custom domain association crates
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`fixtures`]: Unique domain names, requests and validation records
//! - [`logging`]: Test tracing subscriber

pub mod fixtures;
pub mod logging;

// Re-export commonly used items
pub use custom_domain_reconciler::testing::{Call, DescribeStep, ScriptedClient};
pub use fixtures::{pending_validation_record, test_request, test_run_id, TEST_SERVICE_ARN};
pub use logging::init_tracing;
