//! Outbound frame limiter
//!
//! The gateway allows `limit` frames per `window`. Lifecycle frames (heartbeat, identify,
//! resume) bypass the limiter. Application commands get the budget minus a reserve of one
//! frame plus one per heartbeat due within a window, so a burst of commands can never
//! starve the heartbeat.
//!
//! The command budget is a GCRA quota whose burst plus refill within one window never
//! exceeds the command limit.

use std::num::NonZeroU32;
use std::time::Duration;

use chat_common::GatewayConfig;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

pub struct FrameLimiter {
    limit: u32,
    window: Duration,
    command_limit: u32,
    /// `None` when the reserve leaves no room for commands
    commands: Option<DefaultDirectRateLimiter>,
    clock: DefaultClock,
}

impl FrameLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        let mut limiter = Self {
            limit,
            window,
            command_limit: 0,
            commands: None,
            clock: DefaultClock::default(),
        };
        limiter.set_command_limit(limit.saturating_sub(1));
        limiter
    }

    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.frame_limit, config.frame_window)
    }

    /// Recompute the command budget for a heartbeat interval
    pub fn set_heartbeat_interval(&mut self, interval: Duration) {
        let interval_ms = interval.as_millis().max(1);
        let beats = u32::try_from(self.window.as_millis() / interval_ms).unwrap_or(u32::MAX);
        self.set_command_limit(self.limit.saturating_sub(beats.saturating_add(1)));
    }

    #[inline]
    pub fn command_limit(&self) -> u32 {
        self.command_limit
    }

    /// Take a slot for one application command
    ///
    /// Returns `None` if the command may go now, otherwise how long to wait before asking
    /// again.
    pub fn try_command(&self) -> Option<Duration> {
        let Some(commands) = &self.commands else {
            return Some(self.window);
        };
        match commands.check() {
            Ok(()) => None,
            Err(not_until) => Some(not_until.wait_time_from(self.clock.now())),
        }
    }

    fn set_command_limit(&mut self, command_limit: u32) {
        if command_limit == self.command_limit && self.commands.is_some() {
            return;
        }
        self.command_limit = command_limit;
        self.commands = command_quota(command_limit, self.window).map(RateLimiter::direct);
    }
}

/// Half the budget as burst, the other half refilled evenly over the window
fn command_quota(command_limit: u32, window: Duration) -> Option<Quota> {
    let burst = NonZeroU32::new(command_limit.div_ceil(2))?;
    let refills = (command_limit - burst.get()).max(1);
    Quota::with_period(window / refills).map(|quota| quota.allow_burst(burst))
}

impl std::fmt::Debug for FrameLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("command_limit", &self.command_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_heartbeat_reserve() {
        let mut limiter = FrameLimiter::new(120, WINDOW);
        assert_eq!(limiter.command_limit(), 119);

        limiter.set_heartbeat_interval(Duration::from_millis(41_250));
        assert_eq!(limiter.command_limit(), 118);

        limiter.set_heartbeat_interval(Duration::from_secs(10));
        assert_eq!(limiter.command_limit(), 113);
    }

    #[test]
    fn test_burst_then_deferred() {
        let mut limiter = FrameLimiter::new(120, WINDOW);
        limiter.set_heartbeat_interval(Duration::from_millis(41_250));

        // Burst of half the command budget
        for _ in 0..59 {
            assert!(limiter.try_command().is_none());
        }
        let wait = limiter.try_command().unwrap();
        assert!(wait > Duration::ZERO);
        assert!(wait <= WINDOW / 59);
    }

    #[test]
    fn test_quota_stays_within_budget() {
        // Burst plus one window of refill never exceeds the command limit
        for limit in [2u32, 3, 59, 118] {
            let quota = command_quota(limit, WINDOW).unwrap();
            let refilled = WINDOW.as_millis() / quota.replenish_interval().as_millis();
            let total = u128::from(quota.burst_size().get()) + refilled;
            assert!(total <= u128::from(limit), "limit {limit}: {total}");
        }
    }

    #[test]
    fn test_zero_budget_always_defers() {
        let mut limiter = FrameLimiter::new(2, WINDOW);
        limiter.set_heartbeat_interval(Duration::from_secs(1));
        assert_eq!(limiter.command_limit(), 0);
        assert_eq!(limiter.try_command(), Some(WINDOW));
    }

    #[test]
    fn test_budget_rebuilt_on_new_interval() {
        let mut limiter = FrameLimiter::new(4, WINDOW);
        assert_eq!(limiter.command_limit(), 3);
        for _ in 0..2 {
            assert!(limiter.try_command().is_none());
        }
        assert!(limiter.try_command().is_some());

        // A new HELLO starts a fresh quota
        limiter.set_heartbeat_interval(Duration::from_secs(30));
        assert_eq!(limiter.command_limit(), 1);
        assert!(limiter.try_command().is_none());
        assert!(limiter.try_command().is_some());
    }
}
