use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Sentinel domain bucket for URLs that do not parse.
pub const INVALID_DOMAIN: &str = "invalid";

/// Aggregate counts derived from the bookmark collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookmarkStats {
    pub total: usize,
    pub domains: BTreeSet<String>,
    pub today: usize,
}

impl BookmarkStats {
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }
}

/// Whether the session has recently applied a remote change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synced,
    Syncing,
}
