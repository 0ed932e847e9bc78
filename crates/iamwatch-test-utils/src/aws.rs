//! AWS test utilities
//!
//! Provides region detection and unique resource names for AWS integration tests.

use chrono::Utc;

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-1 (IAM's home region)
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-1".to_string())
}

/// Generate a unique IAM user name for test resources.
///
/// Format: `iamwatch-test-{timestamp_ms}-{counter}`, which stays well under
/// the 64 character IAM user name limit.
///
/// # Example
///
/// ```
/// use iamwatch_test_utils::aws::test_user_name;
///
/// let name = test_user_name();
/// assert!(name.starts_with("iamwatch-test-"));
/// ```
pub fn test_user_name() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("iamwatch-test-{}-{}", ts, counter)
}
