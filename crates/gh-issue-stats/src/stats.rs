//! Entry point: paginated fetch and fan-out
//!
//! Page 1 is fetched and aggregated first so the `link` header can reveal the
//! total page count; the remaining pages fan out as tokio tasks gated by a
//! semaphore of `concurrency` permits. The join is fail-fast: the first
//! terminal page failure aborts the rest of the batch and no partial report
//! is ever returned.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::aggregate::{aggregate_page, IssueRecord, StatsReport};
use crate::config::StatsOptions;
use crate::error::{Error, Result};
use crate::pagination;
use crate::rate_limit;
use crate::rotator::TokenRotator;

const USER_AGENT_VALUE: &str = concat!("gh-issue-stats/", env!("CARGO_PKG_VERSION"));

/// Compute issue and pull-request statistics for `repo` (`"owner/name"`).
///
/// Pages through the repository's combined issue listing (`state=all`, 100
/// records per page), rotating through `options.tokens` to dodge per-token
/// rate limits, and folds every record into the report. Issues and pull
/// requests are aggregated separately.
///
/// # Errors
///
/// Fails on invalid options, on transport errors, and on any non-success
/// response other than a recoverable quota-exceeded 403. There is no
/// partial-success mode: a single failing page fails the whole computation.
pub async fn compute_issue_stats(repo: &str, options: StatsOptions) -> Result<StatsReport> {
    options.validate()?;

    let client = match options.http_client.clone() {
        Some(client) => client,
        None => Client::builder().timeout(options.request_timeout).build()?,
    };
    let rotator = Arc::new(TokenRotator::new(
        options.tokens.clone(),
        options.rotator.clone(),
    ));

    let listing_url = format!(
        "{}/repos/{repo}/issues?state=all&per_page=100",
        options.api_url.trim_end_matches('/'),
    );

    let report = Arc::new(Mutex::new(StatsReport::default()));

    // Page 1 discovers the total page count; it is always aggregated before
    // any other page is scheduled.
    let first = fetch_page(&client, &rotator, &listing_url).await?;
    let total_pages = pagination::last_page(first.link.as_deref());
    fold(&report, &first.records);
    debug!(repo, total_pages, "first page aggregated");

    if total_pages > 1 {
        let semaphore = Arc::new(Semaphore::new(options.concurrency));
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        for page in 2..=total_pages {
            let client = client.clone();
            let rotator = Arc::clone(&rotator);
            let semaphore = Arc::clone(&semaphore);
            let report = Arc::clone(&report);
            let url = format!("{listing_url}&page={page}");

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::Task("scheduler shut down".into()))?;
                let body = fetch_page(&client, &rotator, &url).await?;
                fold(&report, &body.records);
                Ok(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    // Abandon the in-flight pages; their results are discarded.
                    tasks.abort_all();
                    return Err(err);
                }
                Err(err) => {
                    tasks.abort_all();
                    return Err(Error::Task(err.to_string()));
                }
            }
        }
    }

    let report = lock_report(&report).clone();
    Ok(report)
}

/// One listing page: its records plus the pagination link header.
struct PageBody {
    records: Vec<IssueRecord>,
    link: Option<String>,
}

/// Fetch one listing page through the token rotator.
///
/// Every response is inspected for quota exhaustion, which cools down the
/// token that served the request. A confirmed quota-exceeded 403 is retried
/// transparently with another token; anonymous requests have nothing to
/// rotate to, so for them (and for every other failure) the error is
/// terminal.
async fn fetch_page(client: &Client, rotator: &TokenRotator, url: &str) -> Result<PageBody> {
    loop {
        let token = rotator.select().await;
        metrics::counter!(
            "issue_stats_requests_total",
            "auth" => if token.is_some() { "token" } else { "anonymous" }
        )
        .increment(1);

        let mut request = client.get(url).header(USER_AGENT, USER_AGENT_VALUE);
        if let Some(token) = token.as_deref() {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let link = headers
            .get("link")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        let exhaustion = rate_limit::inspect(status, &headers, &body);
        if let Some(signal) = exhaustion {
            if let Some(token) = token.as_deref() {
                rotator.exhaust(token, signal.reset_at_ms, signal.rate_limited);
            }
        }

        if status.is_success() {
            let records: Vec<IssueRecord> = serde_json::from_str(&body)?;
            return Ok(PageBody { records, link });
        }

        let confirmed = exhaustion.is_some_and(|signal| signal.rate_limited);
        if confirmed && token.is_some() {
            warn!(url, "token rate limited, retrying with another token");
            continue;
        }

        return Err(Error::Http {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
}

/// Fold a page into the shared accumulator.
fn fold(report: &Arc<Mutex<StatsReport>>, records: &[IssueRecord]) {
    let now = Utc::now();
    let mut guard = report.lock().unwrap_or_else(PoisonError::into_inner);
    aggregate_page(records, &mut guard, now);
}

fn lock_report(report: &Arc<Mutex<StatsReport>>) -> std::sync::MutexGuard<'_, StatsReport> {
    report.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The API's JSON `message` for an error body, or a truncated raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
