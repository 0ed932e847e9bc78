//! Per-iteration slurp context

use crate::account::Account;
use serde::Serialize;

/// The account and region one pass of a watcher runs against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlurpContext {
    pub account_name: String,
    pub account_number: String,
    /// Region used to build clients
    pub region: String,
    /// AWS named profile, when the account pins one
    pub profile: Option<String>,
}

impl SlurpContext {
    pub fn for_account(account: &Account, region: &str) -> Self {
        Self {
            account_name: account.name.clone(),
            account_number: account.number.clone(),
            region: region.to_string(),
            profile: account.profile.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_account() {
        let mut account = Account::new("prod", "123456789012");
        account.profile = Some("audit".to_string());

        let ctx = SlurpContext::for_account(&account, "us-east-1");
        assert_eq!(ctx.account_name, "prod");
        assert_eq!(ctx.account_number, "123456789012");
        assert_eq!(ctx.region, "us-east-1");
        assert_eq!(ctx.profile.as_deref(), Some("audit"));
    }
}
