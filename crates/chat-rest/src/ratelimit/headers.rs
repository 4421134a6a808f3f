//! Rate limit response headers

use std::time::Duration;

use reqwest::header::HeaderMap;

pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET_AFTER: &str = "x-ratelimit-reset-after";
pub const HEADER_GLOBAL: &str = "x-ratelimit-global";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Rate limit information carried by a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    pub remaining: Option<u32>,
    pub reset_after: Option<Duration>,
    pub global: bool,
    pub retry_after: Option<Duration>,
}

impl RateLimitHeaders {
    /// Parse from a header map; malformed values are ignored
    #[must_use]
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        Self {
            remaining: get(HEADER_REMAINING).and_then(|v| v.trim().parse().ok()),
            reset_after: get(HEADER_RESET_AFTER).and_then(parse_seconds),
            global: get(HEADER_GLOBAL).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            retry_after: get(HEADER_RETRY_AFTER).and_then(parse_seconds),
        }
    }

    /// Delay before the next attempt after a 429
    ///
    /// Falls back to `retry_after` from the JSON body, then to `reset_after`.
    #[must_use]
    pub fn retry_delay(&self, body: &serde_json::Value) -> Duration {
        self.retry_after
            .or_else(|| {
                body.get("retry_after")
                    .and_then(serde_json::Value::as_f64)
                    .and_then(seconds)
            })
            .or(self.reset_after)
            .unwrap_or(Duration::from_secs(1))
    }
}

/// Fractional seconds, e.g. `"1.250"`
fn parse_seconds(value: &str) -> Option<Duration> {
    value.trim().parse::<f64>().ok().and_then(seconds)
}

fn seconds(value: f64) -> Option<Duration> {
    (value.is_finite() && value >= 0.0).then(|| Duration::from_secs_f64(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_parse_headers() {
        let mut map = HeaderMap::new();
        map.insert(HEADER_REMAINING, HeaderValue::from_static("4"));
        map.insert(HEADER_RESET_AFTER, HeaderValue::from_static("1.250"));
        map.insert(HEADER_GLOBAL, HeaderValue::from_static("true"));
        map.insert(HEADER_RETRY_AFTER, HeaderValue::from_static("3"));

        let headers = RateLimitHeaders::from_header_map(&map);
        assert_eq!(headers.remaining, Some(4));
        assert_eq!(headers.reset_after, Some(Duration::from_millis(1250)));
        assert!(headers.global);
        assert_eq!(headers.retry_after, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_malformed_headers_ignored() {
        let mut map = HeaderMap::new();
        map.insert(HEADER_REMAINING, HeaderValue::from_static("lots"));
        map.insert(HEADER_RESET_AFTER, HeaderValue::from_static("-1"));

        let headers = RateLimitHeaders::from_header_map(&map);
        assert_eq!(headers, RateLimitHeaders::default());
    }

    #[test]
    fn test_retry_delay_fallbacks() {
        let headers = RateLimitHeaders::default();
        assert_eq!(
            headers.retry_delay(&json!({"retry_after": 0.5, "global": false})),
            Duration::from_millis(500)
        );
        assert_eq!(headers.retry_delay(&json!(null)), Duration::from_secs(1));

        let headers = RateLimitHeaders {
            reset_after: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        assert_eq!(headers.retry_delay(&json!(null)), Duration::from_secs(2));
    }
}
