//! Heartbeat ticker
//!
//! A task that signals when a heartbeat is due. It does not send anything itself; the
//! runner asks the [`Session`](super::Session) what to do on each tick.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Running heartbeat timer; stops when dropped
#[derive(Debug)]
pub struct HeartbeatTicker {
    task: JoinHandle<()>,
}

impl HeartbeatTicker {
    /// Tick first after `interval * jitter`, then every `interval`
    pub fn spawn(interval: Duration, jitter: f64, ticks: mpsc::UnboundedSender<()>) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let first = first_beat_delay(interval, jitter);

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + first, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if ticks.send(()).is_err() {
                    break;
                }
            }
        });

        Self { task }
    }
}

impl Drop for HeartbeatTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Delay before the first heartbeat on a new socket
pub fn first_beat_delay(interval: Duration, jitter: f64) -> Duration {
    let jitter = if jitter.is_finite() {
        jitter.clamp(0.0, 1.0)
    } else {
        0.0
    };
    interval.mul_f64(jitter)
}
