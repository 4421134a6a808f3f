//! Reconnect delays
//!
//! Exponential backoff with full jitter: attempt `n` sleeps a uniformly random time in
//! `[0, min(max_delay, initial_delay * 2^n)]`.

use std::time::Duration;

use chat_common::ReconnectConfig;
use rand::Rng;

/// Reconnect backoff state
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl ReconnectBackoff {
    #[must_use]
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            attempt: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(config.initial_delay, config.max_delay, config.max_attempts)
    }

    /// Attempts made since the last reset
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Upper bound of the delay for the current attempt
    pub fn ceiling(&self) -> Duration {
        let initial_ms = self.initial_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let scaled = 1u64
            .checked_shl(self.attempt)
            .map_or(u64::MAX, |factor| initial_ms.saturating_mul(factor));
        Duration::from_millis(scaled.min(max_ms))
    }

    /// Delay before the next attempt, or `None` once the attempt budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            return None;
        }

        let ceiling_ms = self.ceiling().as_millis() as u64;
        let delay = Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms));
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    /// Start over after a successful handshake
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Random wait before re-identifying after INVALID_SESSION
pub fn invalid_session_delay(config: &ReconnectConfig) -> Duration {
    let low = config.invalid_session_delay_min.as_millis() as u64;
    let high = config.invalid_session_delay_max.as_millis() as u64;
    let (low, high) = (low.min(high), low.max(high));
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(max_attempts: Option<u32>) -> ReconnectBackoff {
        ReconnectBackoff::new(Duration::from_millis(100), Duration::from_secs(5), max_attempts)
    }

    #[test]
    fn test_delays_stay_within_ceiling() {
        let mut backoff = backoff(None);
        for attempt in 0..10u32 {
            let ceiling = backoff.ceiling();
            let expected = Duration::from_millis((100u64 << attempt).min(5000));
            assert_eq!(ceiling, expected, "attempt {attempt}");

            let delay = backoff.next_delay().unwrap();
            assert!(delay <= ceiling);
        }
    }

    #[test]
    fn test_ceiling_is_capped() {
        let mut backoff = backoff(None);
        for _ in 0..200 {
            backoff.next_delay();
        }
        assert_eq!(backoff.ceiling(), Duration::from_secs(5));
        assert!(backoff.next_delay().unwrap() <= Duration::from_secs(5));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = backoff(None);
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempts(), 2);

        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.ceiling(), Duration::from_millis(100));
    }

    #[test]
    fn test_attempt_budget() {
        let mut backoff = backoff(Some(2));
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
        assert_eq!(backoff.attempts(), 2);

        backoff.reset();
        assert!(backoff.next_delay().is_some());
    }

    #[test]
    fn test_zero_initial_delay() {
        let mut backoff = ReconnectBackoff::new(Duration::ZERO, Duration::from_secs(1), None);
        for _ in 0..5 {
            assert_eq!(backoff.next_delay(), Some(Duration::ZERO));
        }
    }

    #[test]
    fn test_invalid_session_delay_window() {
        let config = ReconnectConfig::default();
        for _ in 0..50 {
            let delay = invalid_session_delay(&config);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(5));
        }

        let swapped = ReconnectConfig {
            invalid_session_delay_min: Duration::from_millis(30),
            invalid_session_delay_max: Duration::from_millis(10),
            ..ReconnectConfig::default()
        };
        let delay = invalid_session_delay(&swapped);
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(30));
    }
}
