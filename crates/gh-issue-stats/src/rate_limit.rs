//! Quota-exhaustion detection from API responses
//!
//! The API advertises quota state through `x-ratelimit-remaining` and
//! `x-ratelimit-reset` headers on every response. A zero remaining count on a
//! successful response means the token just spent its last permitted call; a
//! 403 whose body message names the rate limit means the request was actually
//! blocked. Both cool the token down, but only the latter warrants a
//! transparent retry on another token — any other 403 is some unrelated
//! forbidden condition and stays terminal.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Header carrying the number of requests left in the current window.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header carrying the epoch-seconds timestamp of the window reset.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Exhaustion signal for the token that served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhaustion {
    /// Epoch milliseconds at which the quota window resets.
    pub reset_at_ms: u64,
    /// True when a quota-exceeded 403 confirmed the limit.
    pub rate_limited: bool,
}

/// Inspect a response for quota exhaustion.
///
/// Returns a signal only when the remaining-requests header reads zero. The
/// reset header is scaled from seconds to milliseconds; missing or
/// unparseable, the reset is treated as already passed.
pub fn inspect(status: StatusCode, headers: &HeaderMap, body: &str) -> Option<Exhaustion> {
    if header_str(headers, REMAINING_HEADER)? != "0" {
        return None;
    }

    let reset_at_ms = header_str(headers, RESET_HEADER)
        .and_then(|raw| raw.parse::<u64>().ok())
        .map_or(0, |secs| secs.saturating_mul(1000));

    Some(Exhaustion {
        reset_at_ms,
        rate_limited: status == StatusCode::FORBIDDEN && is_rate_limit_message(body),
    })
}

/// Whether a response body's `message` field names the rate limit.
fn is_rate_limit_message(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_lowercase)
        })
        .is_some_and(|message| message.contains("rate limit"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
