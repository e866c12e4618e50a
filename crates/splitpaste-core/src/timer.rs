//! Fixed-interval poll timers driven by the scheduler.

use std::time::Duration;
use tokio::time::Instant;

/// A stoppable fixed-period timer. Holds no thread or task; the scheduler
/// asks it whether it is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PollTimer {
    /// A zero period is raised to one millisecond, so an armed timer is
    /// never due again at the instant it fired.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    /// Arm the timer; the first tick fires one period from `now`.
    /// Restarting an armed timer resets its phase.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Schedule the next tick after one fired at `now`. Missed ticks are
    /// coalesced rather than replayed.
    pub fn advance(&mut self, now: Instant) {
        if let Some(due) = self.next_due {
            let mut next = due + self.period;
            if next <= now {
                next = now + self.period;
            }
            self.next_due = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarmed_is_never_due() {
        let timer = PollTimer::new(Duration::from_secs(1));
        assert!(!timer.is_armed());
        assert!(!timer.is_due(Instant::now() + Duration::from_secs(60)));
    }

    #[test]
    fn test_due_after_period() {
        let t0 = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(1));
        timer.start(t0);
        assert!(!timer.is_due(t0));
        assert!(!timer.is_due(t0 + Duration::from_millis(999)));
        assert!(timer.is_due(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_advance_keeps_cadence() {
        let t0 = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(1));
        timer.start(t0);
        timer.advance(t0 + Duration::from_millis(1010));
        assert_eq!(timer.next_due(), Some(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_advance_coalesces_missed_ticks() {
        let t0 = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(1));
        timer.start(t0);
        let late = t0 + Duration::from_secs(5);
        timer.advance(late);
        assert_eq!(timer.next_due(), Some(late + Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_period_still_moves_forward() {
        let t0 = Instant::now();
        let mut timer = PollTimer::new(Duration::ZERO);
        timer.start(t0);
        timer.advance(t0);
        timer.advance(t0);
        assert!(!timer.is_due(t0));
        assert!(timer.next_due().is_some_and(|due| due > t0));
    }

    #[test]
    fn test_stop_disarms() {
        let t0 = Instant::now();
        let mut timer = PollTimer::new(Duration::from_secs(10));
        timer.start(t0);
        timer.stop();
        assert!(!timer.is_armed());
        assert!(!timer.is_due(t0 + Duration::from_secs(20)));
    }
}
