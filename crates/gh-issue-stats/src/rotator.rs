//! Round-robin token selection with cooldown avoidance
//!
//! The rotator hands out one token per outgoing request from a fixed pool. An
//! empty pool means every request goes out anonymously. Tokens in cooldown
//! are skipped; expired cooldowns are dropped automatically on lookup.
//!
//! When every token is cooling, the rotator distinguishes two cases. A token
//! whose cooldown was not confirmed by a quota-exceeded response may be
//! probed early — the remaining-requests header hitting zero only means its
//! last permitted call was spent, and the window may already have reset. A
//! token confirmed rate-limited is not offered again until its advertised
//! reset passes; if all tokens are in that state the rotator sleeps until the
//! earliest reset.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::RotatorOptions;
use crate::cooldown::{Cooldown, CooldownStore};

/// Hands out API tokens for outgoing requests, avoiding exhausted ones.
pub struct TokenRotator {
    tokens: Vec<String>,
    group: String,
    cooldowns: CooldownStore,
    next_index: AtomicUsize,
}

impl TokenRotator {
    /// Create a rotator over `tokens`, backed by the store in `options`.
    #[must_use]
    pub fn new(tokens: Vec<String>, options: RotatorOptions) -> Self {
        Self {
            tokens,
            group: options.group,
            cooldowns: options.cooldowns,
            next_index: AtomicUsize::new(0),
        }
    }

    /// Select a token for the next request.
    ///
    /// Returns `None` when the pool is empty (anonymous mode). Selection is
    /// round-robin among tokens without an active cooldown; when none
    /// qualify, an unconfirmed cooldown is probed early, and when every
    /// cooldown is confirmed rate-limited this call sleeps until the earliest
    /// reset passes.
    pub async fn select(&self) -> Option<String> {
        if self.tokens.is_empty() {
            return None;
        }

        loop {
            let now_ms = CooldownStore::now_ms();
            let start = self.next_index.fetch_add(1, Ordering::Relaxed) % self.tokens.len();

            let mut probe: Option<usize> = None;
            let mut earliest: Option<(usize, Cooldown)> = None;

            for offset in 0..self.tokens.len() {
                let idx = (start + offset) % self.tokens.len();
                match self.cooldowns.active(&self.group, &self.tokens[idx], now_ms) {
                    None => return Some(self.tokens[idx].clone()),
                    Some(entry) => {
                        if !entry.rate_limited && probe.is_none() {
                            probe = Some(idx);
                        }
                        if earliest.is_none_or(|(_, e)| entry.until_ms < e.until_ms) {
                            earliest = Some((idx, entry));
                        }
                    }
                }
            }

            if let Some(idx) = probe {
                debug!(
                    token_index = idx,
                    "all tokens cooling, probing unconfirmed token"
                );
                return Some(self.tokens[idx].clone());
            }

            // Every token is confirmed rate-limited; wait out the earliest
            // reset and rescan.
            if let Some((idx, entry)) = earliest {
                let wait_ms = entry.until_ms.saturating_sub(now_ms);
                info!(
                    token_index = idx,
                    wait_ms, "all tokens rate limited, waiting for earliest reset"
                );
                tokio::time::sleep(Duration::from_millis(wait_ms.saturating_add(1))).await;
            }
        }
    }

    /// Place `token` in cooldown until `until_ms`.
    ///
    /// `rate_limited` marks whether a quota-exceeded response confirmed the
    /// limit; confirmed tokens are never probed before their reset.
    pub fn exhaust(&self, token: &str, until_ms: u64, rate_limited: bool) {
        metrics::counter!("issue_stats_tokens_exhausted_total").increment(1);
        debug!(until_ms, rate_limited, "token exhausted, entering cooldown");
        self.cooldowns
            .exhaust(&self.group, token, until_ms, rate_limited);
    }
}
