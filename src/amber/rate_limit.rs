//! Wait-time extraction for HTTP 429 answers
//!
//! `Retry-After` wins when present: either delta seconds or an HTTP date.
//! Otherwise `X-RateLimit-Reset` is read as a Unix timestamp. Anything
//! unusable falls back to [`DEFAULT_WAIT_SECONDS`].

use chrono::{DateTime, Utc};

/// Wait used when the server gives no usable hint
pub const DEFAULT_WAIT_SECONDS: u64 = 60;

/// Header carrying an absolute reset time as Unix seconds
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Seconds to wait before retrying, never less than one
pub fn wait_seconds(retry_after: Option<&str>, reset: Option<&str>, now: DateTime<Utc>) -> u64 {
    let retry_after = retry_after.map(str::trim).filter(|v| !v.is_empty());
    let reset = reset.map(str::trim).filter(|v| !v.is_empty());

    let seconds = if let Some(value) = retry_after {
        parse_delta(value).or_else(|| parse_http_date(value).map(|at| seconds_until(at, now)))
    } else if let Some(value) = reset {
        parse_delta(value)
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .map(|at| seconds_until(at, now))
    } else {
        None
    };

    match seconds {
        Some(s) if s >= 1 => s.unsigned_abs(),
        Some(_) => 1,
        None => DEFAULT_WAIT_SECONDS,
    }
}

/// Whole seconds, rounding fractional values up
fn parse_delta(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.ceil() as i64)
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn seconds_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (at - now).num_milliseconds();
    millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(wait_seconds(Some("42"), None, now()), 42);
        assert_eq!(wait_seconds(Some(" 7 "), Some("99999999999"), now()), 7);
        assert_eq!(wait_seconds(Some("2.5"), None, now()), 3);
    }

    #[test]
    fn retry_after_http_date() {
        let wait = wait_seconds(Some("Mon, 10 Jun 2024 12:01:30 GMT"), None, now());
        assert_eq!(wait, 90);
    }

    #[test]
    fn reset_timestamp_used_without_retry_after() {
        let reset = (now().timestamp() + 25).to_string();
        assert_eq!(wait_seconds(None, Some(&reset), now()), 25);
    }

    #[test]
    fn partial_seconds_round_up() {
        let at = now() + chrono::Duration::milliseconds(10_200);
        assert_eq!(seconds_until(at, now()), 11);
    }

    #[test]
    fn past_times_clamp_to_one_second() {
        let reset = (now().timestamp() - 30).to_string();
        assert_eq!(wait_seconds(None, Some(&reset), now()), 1);
        assert_eq!(wait_seconds(Some("0"), None, now()), 1);
    }

    #[test]
    fn defaults_to_sixty_seconds() {
        assert_eq!(wait_seconds(None, None, now()), DEFAULT_WAIT_SECONDS);
        assert_eq!(wait_seconds(Some("soon"), None, now()), DEFAULT_WAIT_SECONDS);
        assert_eq!(wait_seconds(Some(""), Some("later"), now()), DEFAULT_WAIT_SECONDS);
    }
}
