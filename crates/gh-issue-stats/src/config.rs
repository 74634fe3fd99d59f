//! Options for a stats computation
//!
//! A flat struct with named fields, each carrying a documented default.
//! Callers override only what they need and leave the rest to `Default`.

use std::time::Duration;

use crate::cooldown::CooldownStore;
use crate::error::{Error, Result};

/// Default API host for the issue listing.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default cooldown group key, isolating this API's exhaustion state from any
/// other service a shared [`CooldownStore`] might track.
pub const DEFAULT_GROUP: &str = "github";

/// Options for [`compute_issue_stats`](crate::compute_issue_stats).
#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Base URL of the issue-tracking API. Default: `https://api.github.com`.
    /// Point at an enterprise instance to query one.
    pub api_url: String,
    /// API tokens to rotate through. Default: empty, meaning every request is
    /// made anonymously.
    pub tokens: Vec<String>,
    /// How many page fetches may be in flight at once. Default: 5.
    pub concurrency: usize,
    /// Per-request timeout for the default HTTP client. Default: 15 seconds.
    /// Ignored when `http_client` is supplied.
    pub request_timeout: Duration,
    /// Caller-configured HTTP client, passed through to the transport
    /// unmodified (timeouts, proxies, extra headers). Default: a fresh client
    /// with `request_timeout` applied.
    pub http_client: Option<reqwest::Client>,
    /// Token rotator settings.
    pub rotator: RotatorOptions,
}

/// Settings handed to the token rotator.
#[derive(Debug, Clone)]
pub struct RotatorOptions {
    /// Group key scoping cooldown entries. Default: `"github"`.
    pub group: String,
    /// Cooldown store. Supplying the same store and group across calls shares
    /// token exhaustion state between them. Default: a fresh store.
    pub cooldowns: CooldownStore,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            tokens: Vec::new(),
            concurrency: 5,
            request_timeout: Duration::from_secs(15),
            http_client: None,
            rotator: RotatorOptions::default(),
        }
    }
}

impl Default for RotatorOptions {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.into(),
            cooldowns: CooldownStore::new(),
        }
    }
}

impl StatsOptions {
    /// Check the options before any request goes out.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be greater than 0".into()));
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "api_url must start with http:// or https://, got: {}",
                self.api_url
            )));
        }

        Ok(())
    }
}
