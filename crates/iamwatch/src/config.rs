//! Configuration types for the watcher binary

use anyhow::{Context, Result};
use iamwatch_common::defaults::IAM_USER_INDEX;
use iamwatch_common::{AccountRegistry, IgnoreRegistry};
use std::path::PathBuf;

/// How a slurp's results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Configuration for one slurp
#[derive(Debug, Clone)]
pub struct SlurpConfig {
    /// JSON file listing the watchable accounts
    pub accounts_file: PathBuf,
    /// Account names to watch; every active account when `None`
    pub accounts: Option<Vec<String>>,
    /// Extra IAM user name prefixes to ignore
    pub ignore: Vec<String>,
    /// JSON file mapping technology index to ignored prefixes
    pub ignore_file: Option<PathBuf>,
    pub format: OutputFormat,
    /// Write the JSON document here as well
    pub output: Option<PathBuf>,
    /// Check each account's credentials via STS before slurping
    pub verify_account: bool,
}

impl SlurpConfig {
    pub fn load_accounts(&self) -> Result<AccountRegistry> {
        AccountRegistry::load(&self.accounts_file).with_context(|| {
            format!(
                "Failed to load accounts from {}",
                self.accounts_file.display()
            )
        })
    }

    /// Ignore file entries plus the command-line prefixes for IAM users
    pub fn load_ignore_registry(&self) -> Result<IgnoreRegistry> {
        let mut registry = match &self.ignore_file {
            Some(path) => IgnoreRegistry::load(path)
                .with_context(|| format!("Failed to load ignore list from {}", path.display()))?,
            None => IgnoreRegistry::default(),
        };

        for prefix in &self.ignore {
            registry.add(IAM_USER_INDEX, prefix.as_str());
        }

        Ok(registry)
    }
}

/// Split a comma-separated account list, dropping empty entries
pub fn parse_account_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
