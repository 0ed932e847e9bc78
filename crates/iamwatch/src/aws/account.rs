//! AWS account identity and verification

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    debug!(account_id = %account, "Resolved caller account");

    Ok(AccountId(account.to_string()))
}

/// Check that the resolved credentials belong to `expected`.
pub async fn verify_account(config: &aws_config::SdkConfig, expected: &str) -> Result<AccountId> {
    let actual = get_current_account_id(config).await?;
    ensure_account_matches(&actual, expected)?;
    info!(account_id = %actual, "AWS account verified");
    Ok(actual)
}

fn ensure_account_matches(actual: &AccountId, expected: &str) -> Result<()> {
    if actual.as_str() != expected {
        anyhow::bail!(
            "Credentials resolve to account {} but {} was configured",
            actual,
            expected
        );
    }
    Ok(())
}
