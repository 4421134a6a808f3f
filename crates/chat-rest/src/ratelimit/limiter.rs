//! Per-bucket and global rate limit tracking
//!
//! A call reserves a slot in its bucket before it is sent and the response headers
//! update the bucket afterwards. Buckets without a known limit let calls through.

use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::RateLimitHeaders;
use crate::route::BucketKey;

/// State of one bucket
#[derive(Debug, Clone, Default)]
pub struct RateLimitBucket {
    /// `None` until a response told us the limit
    pub remaining: Option<u32>,
    pub reset_at: Option<Instant>,
}

impl RateLimitBucket {
    /// Time until the bucket has space, if it is currently exhausted
    fn wait_time(&self, now: Instant) -> Option<Duration> {
        match (self.remaining, self.reset_at) {
            (Some(0), Some(reset_at)) if reset_at > now => Some(reset_at - now),
            _ => None,
        }
    }
}

/// Rate limit state shared by all requests of one client
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: DashMap<BucketKey, RateLimitBucket>,
    global_until: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` may send, then reserve a slot
    pub async fn acquire(&self, key: &BucketKey) {
        while let Some(delay) = self.try_reserve(key) {
            tracing::debug!(
                bucket = ?key,
                delay_ms = delay.as_millis() as u64,
                "Delaying request to respect rate limit"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Reserve a slot now, or return how long to wait
    pub fn try_reserve(&self, key: &BucketKey) -> Option<Duration> {
        let now = Instant::now();

        if let Some(until) = *self.global_until.lock() {
            if until > now {
                return Some(until - now);
            }
        }

        let mut bucket = self.buckets.entry(*key).or_default();
        if let Some(wait) = bucket.wait_time(now) {
            return Some(wait);
        }

        bucket.remaining = match bucket.remaining {
            // Window elapsed: the next response tells us the new limit
            Some(0) => None,
            Some(n) => Some(n - 1),
            None => None,
        };
        if bucket.remaining.is_none() {
            bucket.reset_at = None;
        }
        None
    }

    /// Apply a response's headers to the bucket (and the global lock-out)
    pub fn update(
        &self,
        key: &BucketKey,
        status: u16,
        headers: &RateLimitHeaders,
        body: &serde_json::Value,
    ) {
        let now = Instant::now();

        if status == 429 {
            let delay = headers.retry_delay(body);
            if headers.global {
                tracing::warn!(delay_ms = delay.as_millis() as u64, "Hit global rate limit");
                *self.global_until.lock() = Some(now + delay);
            } else {
                tracing::debug!(
                    bucket = ?key,
                    delay_ms = delay.as_millis() as u64,
                    "Hit route rate limit"
                );
                let mut bucket = self.buckets.entry(*key).or_default();
                bucket.remaining = Some(0);
                bucket.reset_at = Some(now + delay);
            }
            return;
        }

        if headers.remaining.is_none() && headers.reset_after.is_none() {
            return;
        }

        let mut bucket = self.buckets.entry(*key).or_default();
        if let Some(remaining) = headers.remaining {
            bucket.remaining = Some(remaining);
        }
        if let Some(reset_after) = headers.reset_after {
            bucket.reset_at = Some(now + reset_after);
        }
    }

    /// Snapshot of a bucket
    pub fn bucket(&self, key: &BucketKey) -> Option<RateLimitBucket> {
        self.buckets.get(key).map(|b| b.value().clone())
    }

    pub fn is_globally_limited(&self) -> bool {
        self.global_until
            .lock()
            .is_some_and(|until| until > Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Route;
    use chat_core::Snowflake;
    use serde_json::json;

    fn key() -> BucketKey {
        Route::channel(Snowflake::new(1)).bucket_key()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_bucket_delays_until_reset() {
        let limiter = RateLimiter::new();
        let headers = RateLimitHeaders {
            remaining: Some(0),
            reset_after: Some(Duration::from_secs(2)),
            ..Default::default()
        };
        limiter.update(&key(), 200, &headers, &json!(null));

        let wait = limiter.try_reserve(&key()).unwrap();
        assert_eq!(wait, Duration::from_secs(2));

        let started = Instant::now();
        limiter.acquire(&key()).await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_down() {
        let limiter = RateLimiter::new();
        let headers = RateLimitHeaders {
            remaining: Some(2),
            reset_after: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        limiter.update(&key(), 200, &headers, &json!(null));

        assert!(limiter.try_reserve(&key()).is_none());
        assert!(limiter.try_reserve(&key()).is_none());
        assert!(limiter.try_reserve(&key()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_buckets_unaffected() {
        let limiter = RateLimiter::new();
        limiter.update(
            &key(),
            429,
            &RateLimitHeaders {
                retry_after: Some(Duration::from_secs(3)),
                ..Default::default()
            },
            &json!(null),
        );

        assert!(limiter.try_reserve(&key()).is_some());
        let other = Route::channel(Snowflake::new(2)).bucket_key();
        assert!(limiter.try_reserve(&other).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_limit_blocks_every_bucket() {
        let limiter = RateLimiter::new();
        limiter.update(
            &key(),
            429,
            &RateLimitHeaders {
                global: true,
                ..Default::default()
            },
            &json!({"retry_after": 1.5, "global": true}),
        );

        assert!(limiter.is_globally_limited());
        let other = Route::user(Snowflake::new(9)).bucket_key();
        assert_eq!(
            limiter.try_reserve(&other),
            Some(Duration::from_millis(1500))
        );

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!limiter.is_globally_limited());
        assert!(limiter.try_reserve(&other).is_none());
    }
}
