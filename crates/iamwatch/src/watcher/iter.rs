//! Account/region iteration
//!
//! Runs a watcher body once per selected account and region, connecting a
//! client for each, and merges the per-context items and exceptions into a
//! single [`SlurpOutput`].

use crate::aws::iam::IamConnector;
use crate::watcher::record::record_connection_failure;
use iamwatch_common::{AccountRegistry, ExceptionKey, ExceptionMap, SlurpContext};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, error, info};

/// Items and exceptions collected by one slurp
#[derive(Debug, Clone, Serialize)]
pub struct SlurpOutput<T> {
    pub items: Vec<T>,
    pub exceptions: ExceptionMap,
}

impl<T> Default for SlurpOutput<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            exceptions: ExceptionMap::new(),
        }
    }
}

/// How a watcher's technology maps onto accounts and regions
#[derive(Debug, Clone, Copy)]
pub struct IterOptions<'a> {
    pub index: &'a str,
    pub source: &'a str,
    /// Region recorded on exceptions instead of the iteration region
    pub exception_region: Option<&'a str>,
    /// Visit every configured region; otherwise only the account's home region
    pub regional: bool,
}

/// Run `body` for every selected account and region.
///
/// Unknown and inactive accounts are skipped. A failure to connect is
/// recorded and that context is skipped; other contexts still run.
pub async fn iter_account_region<C, T, F, Fut>(
    connector: &C,
    accounts: &AccountRegistry,
    selection: &[String],
    options: IterOptions<'_>,
    mut body: F,
) -> SlurpOutput<T>
where
    C: IamConnector,
    F: FnMut(C::Client, SlurpContext) -> Fut,
    Fut: Future<Output = (Vec<T>, ExceptionMap)>,
{
    let mut output = SlurpOutput::default();

    for name in selection {
        let Some(account) = accounts.get(name) else {
            error!(account = %name, index = options.index, "Couldn't find account");
            continue;
        };
        if !account.active {
            info!(account = %name, index = options.index, "Skipping inactive account");
            continue;
        }

        let regions: Vec<&str> = if options.regional {
            account.regions.iter().map(String::as_str).collect()
        } else {
            vec![account.home_region()]
        };

        for region in regions {
            let ctx = SlurpContext::for_account(account, region);
            let exception_region = options.exception_region.unwrap_or(region);

            let client = match connector.connect(&ctx).await {
                Ok(client) => client,
                Err(e) => {
                    let key = ExceptionKey::new(options.index, &ctx.account_name, exception_region);
                    record_connection_failure(options.source, key, &e, &mut output.exceptions);
                    continue;
                }
            };

            let (items, exceptions) = body(client, ctx).await;
            debug!(
                account = %name,
                region,
                index = options.index,
                items = items.len(),
                exceptions = exceptions.len(),
                "Finished account"
            );
            output.items.extend(items);
            output.exceptions.merge(exceptions);
        }
    }

    output
}
