//! Aggregate issue and pull-request statistics for a repository
//!
//! Computes counts, open counts, and age-distribution histograms for the
//! issues and pull requests of a repository by paginating its issue-listing
//! API. The first page reveals the total page count through the `link`
//! header; the remaining pages are fetched with bounded concurrency. Requests
//! rotate through a pool of API tokens to dodge per-token rate limits:
//! exhausted tokens cool down until the reset time the API advertises, and
//! with no usable token the computation falls back to anonymous access.
//!
//! State lives only for the duration of one computation, except the
//! [`CooldownStore`], which a caller may share across calls so token
//! exhaustion learned by one computation benefits the next.
//!
//! ```no_run
//! # async fn run() -> gh_issue_stats::Result<()> {
//! let report = gh_issue_stats::compute_issue_stats(
//!     "rust-lang/rust",
//!     gh_issue_stats::StatsOptions::default(),
//! )
//! .await?;
//! println!(
//!     "{} issues ({} open), {} pull requests",
//!     report.issues.count, report.issues.open_count, report.pull_requests.count
//! );
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod rotator;
pub mod stats;

pub use aggregate::{
    aggregate_page, Distribution, IssueRecord, IssueStats, StatsReport, DISTRIBUTION_THRESHOLDS,
};
pub use config::{RotatorOptions, StatsOptions, DEFAULT_API_URL, DEFAULT_GROUP};
pub use cooldown::{Cooldown, CooldownStore};
pub use error::{Error, Result};
pub use rotator::TokenRotator;
pub use stats::compute_issue_stats;
