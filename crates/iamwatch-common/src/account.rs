//! Watched AWS accounts
//!
//! The accounts file is a JSON array of [`Account`] entries. Each entry is
//! validated with `garde` when the registry is built.

use crate::defaults::{DEFAULT_REGION, default_active, default_regions};
use crate::error::ConfigError;
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// A single watched account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct Account {
    /// Unique human-readable name, recorded on change items
    #[garde(length(min = 1))]
    pub name: String,

    /// 12-digit AWS account number
    #[garde(pattern(r"^[0-9]{12}$"))]
    pub number: String,

    /// Inactive accounts are skipped (default: true)
    #[serde(default = "default_active")]
    #[garde(skip)]
    pub active: bool,

    /// AWS named profile used to reach this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub profile: Option<String>,

    /// Regions to visit; global services only use the first
    #[serde(default = "default_regions")]
    #[garde(length(min = 1), inner(length(min = 1)))]
    pub regions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub notes: Option<String>,
}

impl Account {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            active: true,
            profile: None,
            regions: default_regions(),
            notes: None,
        }
    }

    /// Region used to reach global services
    pub fn home_region(&self) -> &str {
        self.regions
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REGION)
    }
}

/// Validated set of accounts, in file order
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Validate entries and reject duplicate names
    pub fn new(accounts: Vec<Account>) -> Result<Self, ConfigError> {
        if accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }

        let mut seen = HashSet::new();
        for account in &accounts {
            account.validate().map_err(|report| ConfigError::InvalidAccount {
                name: account.name.clone(),
                report: report.to_string(),
            })?;
            if !seen.insert(account.name.as_str()) {
                return Err(ConfigError::DuplicateAccount(account.name.clone()));
            }
        }

        Ok(Self { accounts })
    }

    /// Load the registry from a JSON accounts file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        let registry = Self::from_json(&content)?;
        debug!(path = %path.display(), accounts = registry.len(), "Loaded accounts");
        Ok(registry)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let accounts: Vec<Account> = serde_json::from_str(content)?;
        Self::new(accounts)
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Names of all active accounts
    pub fn active_names(&self) -> Vec<String> {
        self.accounts
            .iter()
            .filter(|a| a.active)
            .map(|a| a.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
