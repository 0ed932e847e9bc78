//! Shared test utilities for iamwatch
//!
//! This crate provides common test helpers that can be used across
//! multiple test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique test name generation
//! - [`fixtures`]: IAM user records and account files in their JSON shapes

pub mod aws;
pub mod fixtures;

// Re-export commonly used items
pub use aws::{get_test_region, test_user_name};
pub use fixtures::{accounts_json, user_json};
