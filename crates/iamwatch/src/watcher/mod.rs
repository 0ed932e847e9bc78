//! Watchers: periodic collectors of one resource type
//!
//! A watcher's `slurp` runs one collection cycle across the selected
//! accounts and returns change items plus the exceptions recorded on the
//! way. Shared state (accounts, selection, ignore lists) lives in
//! [`WatcherBase`].

pub mod iam_user;
pub mod iter;
pub mod record;

pub use iam_user::IamUserWatcher;
pub use iter::{IterOptions, SlurpOutput, iter_account_region};
pub use record::record_exception;

use iamwatch_common::{AccountRegistry, IgnoreList, IgnoreRegistry};
use serde::Serialize;
use tracing::{debug, warn};

/// A collector for one technology
#[allow(async_fn_in_trait)]
pub trait Watcher {
    type Item: Serialize;

    /// Technology index recorded on change items (e.g. "iamuser")
    fn index(&self) -> &'static str;

    /// Human-readable name of one resource
    fn singular(&self) -> &'static str;

    /// Human-readable name of several resources
    fn plural(&self) -> &'static str;

    /// Run one collection cycle
    async fn slurp(&mut self) -> SlurpOutput<Self::Item>;
}

/// State shared by every watcher
#[derive(Debug, Clone)]
pub struct WatcherBase {
    accounts: AccountRegistry,
    selection: Vec<String>,
    ignore: IgnoreRegistry,
    ignore_list: IgnoreList,
}

impl WatcherBase {
    /// Watch `selection`, or every active account when no selection is given
    pub fn new(
        accounts: AccountRegistry,
        selection: Option<Vec<String>>,
        ignore: IgnoreRegistry,
    ) -> Self {
        let selection = selection.unwrap_or_else(|| accounts.active_names());
        Self {
            accounts,
            selection,
            ignore,
            ignore_list: IgnoreList::default(),
        }
    }

    /// Load this technology's ignore list before a cycle
    pub fn prep_for_slurp(&mut self, index: &str) {
        self.ignore_list = self.ignore.for_index(index);
        debug!(
            index,
            accounts = self.selection.len(),
            ignored_prefixes = self.ignore_list.len(),
            "Prepared for slurp"
        );
    }

    /// Whether `name` is excluded by the loaded ignore list
    pub fn check_ignore_list(&self, index: &str, name: &str) -> bool {
        match self.ignore_list.matching_prefix(name) {
            Some(prefix) => {
                warn!(index, name, prefix, "Ignoring resource because of ignore list prefix");
                true
            }
            None => false,
        }
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }
}
