//! Shared cooldown state for exhausted tokens
//!
//! The store maps `(group, token)` to the earliest time the token may be
//! retried. It is a value the caller owns: cloning shares the underlying map,
//! so one store can serve several stats computations (and the same token used
//! against the same group cools down for all of them). Entries expire once
//! their timestamp passes and are evicted on lookup; no explicit removal is
//! needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Cooldown state for one token within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    /// Epoch milliseconds of the earliest retry.
    pub until_ms: u64,
    /// Whether a quota-exceeded response confirmed the limit, as opposed to
    /// the remaining-requests header merely reaching zero.
    pub rate_limited: bool,
}

/// Concurrency-safe store of token cooldowns, keyed by `(group, token)`.
///
/// Updates are atomic and last-writer-wins on the retry timestamp; concurrent
/// tasks reporting exhaustion of the same token carry the same reset
/// information, so either write is correct.
#[derive(Debug, Clone, Default)]
pub struct CooldownStore {
    inner: Arc<Mutex<HashMap<(String, String), Cooldown>>>,
}

impl CooldownStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cooldown for `token` until `until_ms`.
    pub fn exhaust(&self, group: &str, token: &str, until_ms: u64, rate_limited: bool) {
        let entry = Cooldown {
            until_ms,
            rate_limited,
        };
        self.lock()
            .insert((group.to_owned(), token.to_owned()), entry);
    }

    /// Active cooldown for `token`, if any. Expired entries are evicted here.
    pub fn active(&self, group: &str, token: &str, now_ms: u64) -> Option<Cooldown> {
        let key = (group.to_owned(), token.to_owned());
        let mut map = self.lock();
        match map.get(&key) {
            Some(entry) if entry.until_ms > now_ms => Some(*entry),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Current time in epoch milliseconds.
    #[must_use]
    pub fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), Cooldown>> {
        // Aggregation never panics while holding the lock, but recover from
        // poisoning anyway rather than propagating a panic across tasks.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
