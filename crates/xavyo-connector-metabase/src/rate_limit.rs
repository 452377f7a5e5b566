//! Rate-limit header parsing.
//!
//! Metabase itself rarely throttles, but instances commonly sit behind a
//! gateway that does. Whatever the gateway reports is turned into a
//! [`RateLimitDescription`] and travels with the call outcome.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;
use xavyo_connector::annotations::{RateLimitDescription, RateLimitStatus};

pub const LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const RESET_HEADER: &str = "X-RateLimit-Reset";
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Parse a `Retry-After` value: delta seconds or an HTTP date.
///
/// Dates in the past yield a zero duration.
#[must_use]
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Build a rate-limit description from response headers.
///
/// Returns `None` when the response carries no rate-limit information and is
/// not a 429.
#[must_use]
pub fn describe_rate_limit(
    status: StatusCode,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Option<RateLimitDescription> {
    let limit = header_u64(headers, LIMIT_HEADER);
    let remaining = header_u64(headers, REMAINING_HEADER);
    let reset_epoch = header_u64(headers, RESET_HEADER)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    let retry_at = headers
        .get(RETRY_AFTER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, now))
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| now + d);

    if status == StatusCode::TOO_MANY_REQUESTS {
        let mut description = RateLimitDescription::overlimit(retry_at.or(reset_epoch));
        description.limit = limit;
        return Some(description);
    }

    if limit.is_none() && remaining.is_none() && reset_epoch.is_none() {
        return None;
    }

    let status = match remaining {
        Some(0) => RateLimitStatus::Overlimit,
        Some(_) => RateLimitStatus::Ok,
        None => RateLimitStatus::Unspecified,
    };
    Some(RateLimitDescription {
        status,
        limit,
        remaining,
        reset_at: reset_epoch,
    })
}

/// Seconds until the caller may retry, from `Retry-After`.
pub(crate) fn retry_after_secs(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    headers
        .get(RETRY_AFTER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, now))
        .map(|d| d.as_secs())
}
