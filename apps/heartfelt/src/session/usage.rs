//! Usage ceiling: a persisted count of successful refinements.
//!
//! The count lives in memory inside the session and is mirrored to the
//! injected `KeyValueStore` after each success. It only ever goes up.

use serde::Serialize;
use tracing::{info, warn};

use crate::store::KeyValueStore;

/// Maximum successful refinements before submits are blocked.
pub const USAGE_CEILING: u64 = 5;

/// Fixed key the count is stored under.
pub const USAGE_KEY: &str = "heartfelt_usage_count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub used: u64,
    pub ceiling: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCounter {
    count: u64,
}

impl UsageCounter {
    pub fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= USAGE_CEILING
    }

    /// Records one success and returns the new count.
    pub fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            used: self.count,
            ceiling: USAGE_CEILING,
            remaining: USAGE_CEILING.saturating_sub(self.count),
        }
    }
}

/// Reads the persisted count. Absent or unreadable means 0.
pub async fn load_usage(store: &dyn KeyValueStore) -> u64 {
    match store.get(USAGE_KEY).await {
        Ok(count) => {
            let count = count.unwrap_or(0);
            info!(
                "Usage loaded from {} store: {count}/{USAGE_CEILING}",
                store.backend()
            );
            count
        }
        Err(e) => {
            warn!(
                "Failed to read usage from {} store, starting at 0: {e}",
                store.backend()
            );
            0
        }
    }
}

/// Writes the count. Failures are logged; the in-memory count stands.
pub async fn persist_usage(store: &dyn KeyValueStore, count: u64) {
    if let Err(e) = store.set(USAGE_KEY, count).await {
        warn!(
            "Failed to persist usage {count} to {} store: {e}",
            store.backend()
        );
    }
}
