//! iamwatch-common - Shared types and utilities
//!
//! This crate provides the data model shared by the watcher and its tests,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`account`]: Watched account entries and the accounts file
//! - [`change_item`]: Normalized resource snapshots handed to the audit engine
//! - [`context`]: Account and region a watcher pass runs against
//! - [`defaults`]: Constants shared across the watcher
//! - [`error`]: Configuration errors
//! - [`exception`]: Per-cycle failure records keyed by context
//! - [`ignore_list`]: Name prefixes excluded from collection
//! - [`user_record`]: IAM user configuration as returned by the API

pub mod account;
pub mod change_item;
pub mod context;
pub mod defaults;
pub mod error;
pub mod exception;
pub mod ignore_list;
pub mod user_record;

// Re-export commonly used types
pub use account::{Account, AccountRegistry};
pub use change_item::{ChangeItem, IamUserItem};
pub use context::SlurpContext;
pub use error::ConfigError;
pub use exception::{ErrorKind, ExceptionKey, ExceptionMap, ExceptionRecord};
pub use ignore_list::{IgnoreList, IgnoreRegistry};
pub use user_record::UserRecord;
