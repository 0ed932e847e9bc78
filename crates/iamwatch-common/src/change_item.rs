//! Change items: one resource's configuration at one point in time
//!
//! Change items are the unit handed to the external diff/audit engine.
//! They are built once per resource per slurp and never mutated afterwards.

use crate::defaults::{IAM_USER_INDEX, UNIVERSAL_REGION};
use crate::user_record::UserRecord;
use serde::{Deserialize, Serialize};

/// Normalized snapshot of a resource's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem<C> {
    /// Technology index (e.g. "iamuser")
    pub index: String,
    /// Region, or "universal" for global services
    pub region: String,
    /// Account name from the slurp context
    pub account: String,
    /// Resource name
    pub name: String,
    /// Globally unique resource identifier
    pub arn: String,
    /// Full fetched configuration
    pub new_config: C,
}

/// Change item for an IAM user
pub type IamUserItem = ChangeItem<UserRecord>;

impl ChangeItem<UserRecord> {
    /// Build a change item from a fetched user record.
    ///
    /// `name` and `arn` are copied from the record, which then becomes
    /// `new_config` unmodified.
    pub fn from_slurp(user: UserRecord, account_name: &str) -> Self {
        Self {
            index: IAM_USER_INDEX.to_string(),
            region: UNIVERSAL_REGION.to_string(),
            account: account_name.to_string(),
            name: user.user_name.clone(),
            arn: user.arn.clone(),
            new_config: user,
        }
    }
}
