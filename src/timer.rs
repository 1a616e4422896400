//! Time-injected timers for the session's event loop.
//!
//! Nothing here reads the clock: the host passes `now` in, which keeps the
//! session deterministic under test.

use std::time::{Duration, Instant};

/// Single-slot idle timer.
///
/// Every [`IdleTimer::mark_busy`] cancels the pending deadline and schedules a
/// new one, so a burst of events collapses into one firing after the burst.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Restart the idle window from `now`.
    pub fn mark_busy(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Fire at most once per scheduled deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// One-shot timer armed at construction.
#[derive(Debug, Clone)]
pub struct Delay {
    at: Option<Instant>,
}

impl Delay {
    #[must_use]
    pub fn after(start: Instant, delay: Duration) -> Self {
        Self {
            at: Some(start + delay),
        }
    }

    /// Fire once when `now` reaches the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.at.is_some()
    }
}

/// Fixed-period timer.
///
/// Late ticks fire once and re-anchor on `now`; missed periods are not replayed.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next: Instant,
}

impl Interval {
    #[must_use]
    pub fn starting_at(start: Instant, period: Duration) -> Self {
        Self {
            period,
            next: start + period,
        }
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_idle_timer_coalesces_bursts() {
        let t0 = Instant::now();
        let mut timer = IdleTimer::new(600 * MS);

        timer.mark_busy(t0);
        timer.mark_busy(t0 + 200 * MS);
        timer.mark_busy(t0 + 400 * MS);

        assert!(!timer.fire_if_due(t0 + 900 * MS));
        assert!(timer.fire_if_due(t0 + 1000 * MS));
        assert!(!timer.fire_if_due(t0 + 2000 * MS));
    }

    #[test]
    fn test_idle_timer_idle_without_events() {
        let t0 = Instant::now();
        let mut timer = IdleTimer::new(600 * MS);
        assert!(!timer.fire_if_due(t0 + 10_000 * MS));
        assert!(timer.deadline().is_none());
    }

    #[test]
    fn test_delay_fires_once() {
        let t0 = Instant::now();
        let mut delay = Delay::after(t0, 800 * MS);

        assert!(!delay.fire_if_due(t0 + 799 * MS));
        assert!(delay.fire_if_due(t0 + 800 * MS));
        assert!(!delay.is_pending());
        assert!(!delay.fire_if_due(t0 + 5000 * MS));
    }

    #[test]
    fn test_interval_reanchors() {
        let t0 = Instant::now();
        let mut interval = Interval::starting_at(t0, 1000 * MS);

        assert!(!interval.fire_if_due(t0 + 500 * MS));
        assert!(interval.fire_if_due(t0 + 3500 * MS));
        assert!(!interval.fire_if_due(t0 + 4000 * MS));
        assert!(interval.fire_if_due(t0 + 4500 * MS));
    }
}
