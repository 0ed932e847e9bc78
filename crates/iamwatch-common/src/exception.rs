//! Exception records collected during a slurp
//!
//! Failures of the listing and fetch calls are never fatal: each one is
//! recorded here under the context it happened in, and collection moves on.
//! The exception map is returned to the caller alongside the change items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse classification of a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The resource disappeared between listing and fetching
    NotFound,
    /// The credentials lack permission for the call
    AccessDenied,
    /// The API rate limit was hit
    Throttled,
    /// Could not build a client or verify the account
    Connection,
    /// Any other SDK or service failure
    Sdk,
}

/// Context a failure is recorded under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExceptionKey {
    pub index: String,
    pub account: String,
    pub region: String,
    /// Resource name, when the failure concerns a single resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ExceptionKey {
    pub fn new(index: &str, account: &str, region: &str) -> Self {
        Self {
            index: index.to_string(),
            account: account.to_string(),
            region: region.to_string(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

impl fmt::Display for ExceptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.index, self.account, self.region)?;
        if let Some(name) = &self.name {
            write!(f, "/{name}")?;
        }
        Ok(())
    }
}

/// A single recorded failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    /// Component that recorded the failure (e.g. "iamuser-watcher")
    pub source: String,
    #[serde(flatten)]
    pub key: ExceptionKey,
    pub kind: ErrorKind,
    /// AWS error code, when one could be extracted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl ExceptionRecord {
    pub fn new(
        source: &str,
        key: ExceptionKey,
        kind: ErrorKind,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.to_string(),
            key,
            kind,
            code,
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Failures recorded during one slurp, ordered by key.
///
/// A later record for the same key replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionMap(BTreeMap<ExceptionKey, ExceptionRecord>);

impl ExceptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure, returning the record it replaced, if any
    pub fn insert(&mut self, record: ExceptionRecord) -> Option<ExceptionRecord> {
        self.0.insert(record.key.clone(), record)
    }

    pub fn get(&self, key: &ExceptionKey) -> Option<&ExceptionRecord> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExceptionRecord> {
        self.0.values()
    }

    /// Merge another map into this one
    pub fn merge(&mut self, other: ExceptionMap) {
        self.0.extend(other.0);
    }
}

impl Extend<ExceptionRecord> for ExceptionMap {
    fn extend<T: IntoIterator<Item = ExceptionRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<ExceptionRecord> for ExceptionMap {
    fn from_iter<T: IntoIterator<Item = ExceptionRecord>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl IntoIterator for ExceptionMap {
    type Item = ExceptionRecord;
    type IntoIter = std::collections::btree_map::IntoValues<ExceptionKey, ExceptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

// Serialized as a list of records; the key is already flattened into each.
impl Serialize for ExceptionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}
