//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use iamwatch_common::ErrorKind;
use thiserror::Error;

/// AWS error categories, used to label recorded exceptions
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found (e.g. deleted between listing and fetching)
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Caller is not authorized, or its credentials are invalid
    #[error("Access denied: {message}")]
    AccessDenied { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// The AWS error code, when one is known
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. }
            | AwsError::AccessDenied { code, .. }
            | AwsError::Throttled { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Exception kind recorded for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AwsError::NotFound { .. } => ErrorKind::NotFound,
            AwsError::AccessDenied { .. } => ErrorKind::AccessDenied,
            AwsError::Throttled { .. } => ErrorKind::Throttled,
            AwsError::Sdk { .. } => ErrorKind::Sdk,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["NoSuchEntity", "NoSuchEntityException"];

/// Known AWS error codes for authorization and credential failures
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "ExpiredToken",
    "SignatureDoesNotMatch",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Convert an SDK operation error into an `anyhow::Error` carrying a
/// classified [`AwsError`], with the operation name as context.
pub fn api_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> anyhow::Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    // Dispatch and timeout failures carry no service message
    let message = err.message().map(str::to_string);
    let message = message.unwrap_or_else(|| DisplayErrorContext(err).to_string());
    let classified = classify_aws_error(code.as_deref(), Some(&message));
    anyhow::Error::new(classified).context(format!("{operation} failed"))
}

/// Classify an error from an anyhow::Error.
///
/// Walks the error chain looking for an [`AwsError`] attached by
/// [`api_error`]. Falls back to string matching on the Debug representation
/// if no typed error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<AwsError>() {
            return e.clone();
        }
    }

    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&format!("{error:#}")));
    }

    AwsError::Sdk {
        code: None,
        message: format!("{error:#}"),
    }
}

/// All known AWS error codes for extraction from debug strings
const ALL_KNOWN_CODES: &[&[&str]] = &[NOT_FOUND_CODES, ACCESS_DENIED_CODES, THROTTLING_CODES];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    // Longest match first so "AccessDeniedException" wins over "AccessDenied"
    let mut known: Vec<&str> = ALL_KNOWN_CODES.iter().flat_map(|c| c.iter().copied()).collect();
    known.sort_by_key(|c| std::cmp::Reverse(c.len()));
    if let Some(code) = known.into_iter().find(|c| debug_str.contains(c)) {
        return Some(code.to_string());
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "AccessDenied",
        "Grant iam:List* and iam:Get* on users to the watcher's credentials.",
    ),
    (
        "AccessDeniedException",
        "Grant iam:List* and iam:Get* on users to the watcher's credentials.",
    ),
    (
        "InvalidClientTokenId",
        "The access key is not valid for this account. Check the configured profile.",
    ),
    (
        "ExpiredToken",
        "Session credentials have expired. Refresh the profile's credentials.",
    ),
    (
        "Throttling",
        "IAM API rate limit hit. Reduce the number of watched accounts per cycle.",
    ),
    (
        "ThrottlingException",
        "IAM API rate limit hit. Reduce the number of watched accounts per cycle.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("user gone"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn access_denied_codes() {
        for code in ACCESS_DENIED_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert_eq!(err.kind(), ErrorKind::AccessDenied, "code: {code}");
            assert_eq!(err.code(), Some(*code));
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled { .. }), "code: {code}");
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("ServiceFailure"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { code: Some(ref c), .. } if c == "ServiceFailure"));
        assert_eq!(err.kind(), ErrorKind::Sdk);

        let err2 = classify_aws_error(None, Some("connection reset"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
        assert!(err2.code().is_none());
    }

    #[test]
    fn classify_finds_typed_error_in_chain() {
        let err = anyhow::Error::new(classify_aws_error(Some("AccessDenied"), Some("nope")))
            .context("ListUsers failed")
            .context("listing users for prod");

        let classified = classify_anyhow_error(&err);
        assert_eq!(classified.kind(), ErrorKind::AccessDenied);
        assert_eq!(classified.code(), Some("AccessDenied"));
    }

    #[test]
    fn classify_falls_back_to_debug_string() {
        let err = anyhow::anyhow!("service error: ThrottlingException: Rate exceeded");
        let classified = classify_anyhow_error(&err);
        assert!(matches!(classified, AwsError::Throttled { ref code, .. } if code == "ThrottlingException"));
    }

    #[test]
    fn classify_untyped_error() {
        let err = anyhow::anyhow!("connection refused");
        let classified = classify_anyhow_error(&err);
        assert!(matches!(classified, AwsError::Sdk { code: None, .. }));
        assert!(classified.to_string().contains("connection refused"));
    }

    #[test]
    fn extract_prefers_longest_code() {
        assert_eq!(
            extract_error_code("AccessDeniedException: not authorized").as_deref(),
            Some("AccessDeniedException")
        );
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("ServiceFailure"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("ServiceFailure")
        );
    }

    #[test]
    fn extract_none_from_unrelated_string() {
        assert!(extract_error_code("connection refused").is_none());
    }

    #[test]
    fn suggestions_for_known_codes() {
        for (code, _) in SUGGESTIONS {
            assert!(
                suggestion_for_code(code).is_some(),
                "No suggestion for code: {code}"
            );
        }
        assert!(suggestion_for_code("SomeUnknownCode").is_none());
        assert!(
            classify_aws_error(Some("ExpiredToken"), None)
                .suggestion()
                .is_some()
        );
    }
}
