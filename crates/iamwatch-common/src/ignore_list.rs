//! Ignore lists: resource names excluded from collection
//!
//! Entries are name prefixes matched case-insensitively, so an exact name
//! also ignores just that resource. Empty entries never match.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Name prefixes ignored for one technology.
///
/// An empty entry is skipped rather than treated as a prefix of every name,
/// so a stray `""` in the ignore file cannot silence a whole technology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreList {
    prefixes: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Return the first prefix that matches `name`, if any
    pub fn matching_prefix(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find(|p| name.starts_with(&p.to_lowercase()))
            .map(String::as_str)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.matching_prefix(name).is_some()
    }

    pub fn push(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Ignore lists for every technology, keyed by index.
///
/// File format: `{"iamuser": ["svc-", "breakglass"]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnoreRegistry(BTreeMap<String, IgnoreList>);

impl IgnoreRegistry {
    /// Load ignore lists from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        let registry = Self::from_json(&content)?;
        debug!(path = %path.display(), indexes = registry.0.len(), "Loaded ignore lists");
        Ok(registry)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Add a prefix for one technology
    pub fn add(&mut self, index: &str, prefix: impl Into<String>) {
        self.0.entry(index.to_string()).or_default().push(prefix);
    }

    /// Entries for one technology (empty when none are configured)
    pub fn for_index(&self, index: &str) -> IgnoreList {
        self.0.get(index).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_exact_name_is_ignored() {
        let list = IgnoreList::new(["bob"]);
        assert!(list.is_ignored("bob"));
        assert!(!list.is_ignored("alice"));
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let list = IgnoreList::new(["SVC-"]);
        assert_eq!(list.matching_prefix("svc-deploy"), Some("SVC-"));
        assert!(list.is_ignored("Svc-Backup"));
        assert!(!list.is_ignored("deploy-svc"));
    }

    #[test]
    fn test_empty_entries_never_match() {
        let list = IgnoreList::new([""]);
        assert!(!list.is_ignored("alice"));
        assert!(!list.is_ignored(""));
    }

    #[test]
    fn test_registry_lookup_by_index() {
        let registry =
            IgnoreRegistry::from_json(r#"{"iamuser": ["bob"], "iamrole": ["admin"]}"#).unwrap();

        assert!(registry.for_index("iamuser").is_ignored("bob"));
        assert!(!registry.for_index("iamuser").is_ignored("admin"));
        assert!(registry.for_index("s3").is_empty());
    }

    #[test]
    fn test_registry_add() {
        let mut registry = IgnoreRegistry::default();
        registry.add("iamuser", "carol");
        registry.add("iamuser", "dave");
        assert_eq!(registry.for_index("iamuser").len(), 2);
    }

    #[test]
    fn test_registry_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"iamuser": ["breakglass"]}}"#).unwrap();

        let registry = IgnoreRegistry::load(file.path()).unwrap();
        assert!(registry.for_index("iamuser").is_ignored("breakglass-01"));
    }

    #[test]
    fn test_registry_load_missing_file() {
        let err = IgnoreRegistry::load(Path::new("/nonexistent/ignore.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
