//! Default values shared between the watcher and its configuration
//!
//! These constants keep record keys and config defaults consistent across
//! all iamwatch components.

/// Technology index for IAM users
pub const IAM_USER_INDEX: &str = "iamuser";

/// Exception source label for the IAM user watcher
pub const IAM_USER_SOURCE: &str = "iamuser-watcher";

/// Region recorded for global (non-regional) services such as IAM
pub const UNIVERSAL_REGION: &str = "universal";

/// Region used to reach global services when an account lists none
pub const DEFAULT_REGION: &str = "us-east-1";

/// Schema version stamped into enriched user records
pub const USER_RECORD_VERSION: u32 = 1;

// Serde default functions for struct field defaults

/// Returns the default region list
pub fn default_regions() -> Vec<String> {
    vec![DEFAULT_REGION.to_string()]
}

/// Accounts are watched unless marked otherwise
pub fn default_active() -> bool {
    true
}
