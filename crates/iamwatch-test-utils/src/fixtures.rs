//! JSON fixtures shaped like IAM API output and iamwatch config files
//!
//! Fixtures are plain `serde_json::Value`s so that any crate can
//! deserialize them into its own types.

use serde_json::{Value, json};

/// A listed IAM user: base attributes only.
///
/// The ARN is `arn:aws:iam::{account_number}:user/{name}`.
pub fn user_json(name: &str, account_number: &str) -> Value {
    json!({
        "UserName": name,
        "Arn": format!("arn:aws:iam::{account_number}:user/{name}"),
        "UserId": format!("AIDA{}", name.to_uppercase()),
        "Path": "/",
        "CreateDate": "2024-01-15T10:30:00+00:00",
    })
}

/// An accounts file with one entry per `(name, number)` pair
pub fn accounts_json(accounts: &[(&str, &str)]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|(name, number)| json!({ "name": name, "number": number }))
            .collect(),
    )
}
