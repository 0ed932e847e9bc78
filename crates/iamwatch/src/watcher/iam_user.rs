//! IAM user watcher
//!
//! Lists the users of every selected account, drops ignored names, fetches
//! each remaining user's configuration and turns it into an
//! [`IamUserItem`]. Listing and fetch failures are recorded, never raised.

use crate::aws::iam::{IamConnector, IamOperations};
use crate::watcher::iter::{IterOptions, SlurpOutput, iter_account_region};
use crate::watcher::record::record_exception;
use crate::watcher::{Watcher, WatcherBase};
use iamwatch_common::defaults::{IAM_USER_INDEX, IAM_USER_SOURCE, UNIVERSAL_REGION};
use iamwatch_common::{ExceptionKey, ExceptionMap, IamUserItem, SlurpContext, UserRecord};
use tracing::{debug, info};

pub struct IamUserWatcher<C> {
    base: WatcherBase,
    connector: C,
}

impl<C: IamConnector> IamUserWatcher<C> {
    pub fn new(base: WatcherBase, connector: C) -> Self {
        Self { base, connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// List the account's users, minus ignored names.
    ///
    /// A listing failure is recorded under the account and yields no users.
    pub async fn list_users(
        &self,
        client: &C::Client,
        ctx: &SlurpContext,
        exceptions: &mut ExceptionMap,
    ) -> Vec<UserRecord> {
        let key = ExceptionKey::new(IAM_USER_INDEX, &ctx.account_name, UNIVERSAL_REGION);
        let users = record_exception(IAM_USER_SOURCE, key, exceptions, client.list_users())
            .await
            .unwrap_or_default();

        users
            .into_iter()
            .filter(|user| !self.base.check_ignore_list(IAM_USER_INDEX, &user.user_name))
            .collect()
    }

    /// Fetch one user's configuration.
    ///
    /// A fetch failure is recorded under the user's name and yields `None`.
    pub async fn process_user(
        &self,
        client: &C::Client,
        user: &UserRecord,
        ctx: &SlurpContext,
        exceptions: &mut ExceptionMap,
    ) -> Option<UserRecord> {
        debug!(
            "Slurping {} ({}) from {}",
            self.singular(),
            user.user_name,
            ctx.account_number
        );

        let key = ExceptionKey::new(IAM_USER_INDEX, &ctx.account_name, UNIVERSAL_REGION)
            .with_name(&user.user_name);
        record_exception(IAM_USER_SOURCE, key, exceptions, client.get_user(user)).await
    }

    async fn slurp_items(
        &self,
        client: &C::Client,
        ctx: &SlurpContext,
    ) -> (Vec<IamUserItem>, ExceptionMap) {
        let mut exceptions = ExceptionMap::new();
        let mut items = Vec::new();

        for user in self.list_users(client, ctx, &mut exceptions).await {
            if let Some(fetched) = self.process_user(client, &user, ctx, &mut exceptions).await {
                items.push(IamUserItem::from_slurp(fetched, &ctx.account_name));
            }
        }

        (items, exceptions)
    }
}

impl<C: IamConnector> Watcher for IamUserWatcher<C> {
    type Item = IamUserItem;

    fn index(&self) -> &'static str {
        IAM_USER_INDEX
    }

    fn singular(&self) -> &'static str {
        "IAM User"
    }

    fn plural(&self) -> &'static str {
        "IAM Users"
    }

    async fn slurp(&mut self) -> SlurpOutput<IamUserItem> {
        self.base.prep_for_slurp(IAM_USER_INDEX);

        let this = &*self;
        let options = IterOptions {
            index: IAM_USER_INDEX,
            source: IAM_USER_SOURCE,
            exception_region: Some(UNIVERSAL_REGION),
            regional: false,
        };

        let output = iter_account_region(
            &this.connector,
            this.base.accounts(),
            this.base.selection(),
            options,
            move |client, ctx| async move { this.slurp_items(&client, &ctx).await },
        )
        .await;

        info!(
            items = output.items.len(),
            exceptions = output.exceptions.len(),
            "Slurped {}",
            self.plural()
        );
        output
    }
}
