//! Application settings persisted next to the trading collections.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::id::WalletAddress;

/// Operator settings. Independent of the trading invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Enables administrative actions in the calling layer.
    pub admin_mode: bool,
    /// Addresses allowed to perform administrative actions.
    pub allowlist: BTreeSet<WalletAddress>,
    /// External price-source lookup table, keyed by market or symbol.
    pub mappings: BTreeMap<String, String>,
}

impl Settings {
    /// Whether `address` may administer markets under these settings.
    #[must_use]
    pub fn can_administer(&self, address: &WalletAddress) -> bool {
        self.admin_mode && self.allowlist.contains(address)
    }

    /// Price source mapped to `key`, if any.
    #[must_use]
    pub fn price_source(&self, key: &str) -> Option<&str> {
        self.mappings.get(key).map(String::as_str)
    }
}
