//! AWS client modules for the watcher
//!
//! This module provides wrappers around AWS SDK clients for:
//! - IAM: User listing and per-user configuration
//! - STS: Account ID lookup and verification

pub mod account;
pub mod context;
pub mod error;
pub mod iam;

pub use account::{AccountId, get_current_account_id, verify_account};
pub use context::{AwsContext, FromAwsContext};
pub use error::{AwsError, api_error, classify_anyhow_error, classify_aws_error};
pub use iam::{AwsIamConnector, IamClient, IamConnector, IamOperations};
