//! Error-capturing wrapper for watcher calls
//!
//! A failing listing or fetch call must not abort the slurp. The wrapper
//! awaits the call, turns any failure into an [`ExceptionRecord`] in the
//! per-cycle map and hands back `None` in place of the result.

use crate::aws::error::classify_anyhow_error;
use anyhow::Result;
use iamwatch_common::{ErrorKind, ExceptionKey, ExceptionMap, ExceptionRecord};
use std::future::Future;
use tracing::warn;

/// Await `operation`, recording a failure under `key` instead of returning it.
pub async fn record_exception<T, F>(
    source: &str,
    key: ExceptionKey,
    exceptions: &mut ExceptionMap,
    operation: F,
) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match operation.await {
        Ok(value) => Some(value),
        Err(e) => {
            record_error(source, key, None, &e, exceptions);
            None
        }
    }
}

/// Record a failure to reach an account at all.
pub fn record_connection_failure(
    source: &str,
    key: ExceptionKey,
    error: &anyhow::Error,
    exceptions: &mut ExceptionMap,
) {
    record_error(source, key, Some(ErrorKind::Connection), error, exceptions);
}

fn record_error(
    source: &str,
    key: ExceptionKey,
    kind: Option<ErrorKind>,
    error: &anyhow::Error,
    exceptions: &mut ExceptionMap,
) {
    let classified = classify_anyhow_error(error);
    let kind = kind.unwrap_or_else(|| classified.kind());
    let message = format!("{error:#}");

    warn!(
        source,
        index = %key.index,
        account = %key.account,
        region = %key.region,
        name = ?key.name,
        kind = ?kind,
        code = ?classified.code(),
        suggestion = ?classified.suggestion(),
        error = %message,
        "Recorded exception"
    );

    exceptions.insert(ExceptionRecord::new(
        source,
        key,
        kind,
        classified.code().map(str::to_string),
        message,
    ));
}
