//! Configuration loading and validation errors

use thiserror::Error;

/// Configuration errors for accounts and ignore-list files
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An account entry failed validation
    #[error("invalid account '{name}': {report}")]
    InvalidAccount { name: String, report: String },

    /// Two account entries share a name
    #[error("duplicate account name: {0}")]
    DuplicateAccount(String),

    /// The accounts file has no entries
    #[error("no accounts configured")]
    NoAccounts,

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
