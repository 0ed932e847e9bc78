//! IAM user configuration record
//!
//! The listing call produces a record with the base user attributes; the
//! fetch call replaces it with an enriched record carrying keys, policies,
//! groups and credentials. Keys follow the PascalCase names used by IAM.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration of a single IAM user.
///
/// `UserName` and `Arn` are always present; everything else lives in
/// `attributes` and is serialized alongside them as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecord {
    pub user_name: String,
    pub arn: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl UserRecord {
    pub fn new(user_name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            arn: arn.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
