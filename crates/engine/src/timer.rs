//! Gravity timer.
//!
//! A periodic deadline on tokio's clock. Missed periods collapse into a
//! single expiry so a stalled game never sees a burst of ticks.

use std::future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone)]
pub struct GravityTimer {
    interval: Duration,
    deadline: Option<Instant>,
    /// Time left when suspended.
    suspended: Option<Duration>,
}

impl GravityTimer {
    /// A disarmed timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            suspended: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start a fresh period of `interval`.
    pub fn arm(&mut self, interval: Duration) {
        self.interval = interval;
        self.suspended = None;
        self.deadline = Some(Instant::now() + interval);
    }

    /// Start a fresh period at the current interval. A suspended timer
    /// stays suspended with a full period pending.
    pub fn restart(&mut self) {
        if self.suspended.is_some() {
            self.suspended = Some(self.interval);
        } else {
            self.deadline = Some(Instant::now() + self.interval);
        }
    }

    /// Change the period. The current deadline is kept.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Stop ticking and return the time left in the current period.
    pub fn suspend(&mut self) -> Duration {
        if let Some(left) = self.suspended {
            return left;
        }
        let left = self.remaining();
        if self.deadline.take().is_some() {
            self.suspended = Some(left);
        }
        left
    }

    /// Continue after `suspend` with the preserved remaining time.
    pub fn resume(&mut self) {
        if let Some(left) = self.suspended.take() {
            self.deadline = Some(Instant::now() + left);
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
        self.suspended = None;
    }

    /// True while a deadline is pending (not disarmed, not suspended).
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn remaining(&self) -> Duration {
        match (self.deadline, self.suspended) {
            (Some(deadline), _) => deadline.saturating_duration_since(Instant::now()),
            (None, Some(left)) => left,
            (None, None) => Duration::ZERO,
        }
    }

    /// Wait for the deadline, then schedule the next one. Never completes
    /// while disarmed or suspended.
    ///
    /// Cancel safe: the next deadline is only computed once the wait has
    /// completed.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            return future::pending().await;
        };
        // A passed deadline must win the next select without waiting on the
        // timer driver.
        if Instant::now() < deadline {
            sleep_until(deadline).await;
        }

        let now = Instant::now();
        let mut next = deadline + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.deadline = Some(next);
    }
}
