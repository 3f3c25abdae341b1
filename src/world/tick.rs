use crate::world::tuning::AP_GRANULARITY_MS;

/// Rate governor for the world turn: converts wall-clock drift since
/// world start into an action-point budget. Not a state machine; only the
/// consumed counter persists between cycles.
#[derive(Debug, Clone)]
pub struct WorldClock {
    start_ms: u64,
    consumed: i64,
}

impl WorldClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            start_ms,
            consumed: 0,
        }
    }

    /// Action points available this cycle:
    /// `floor(elapsed / granularity) - consumed`. May be negative when
    /// the caller's clock stalls; negative budgets are never applied.
    pub fn available(&self, now_ms: u64) -> i64 {
        (now_ms / AP_GRANULARITY_MS) as i64
            - (self.start_ms / AP_GRANULARITY_MS) as i64
            - self.consumed
    }

    pub fn consume(&mut self, ap: i64) {
        self.consumed += ap;
    }

    pub fn consumed(&self) -> i64 {
        self.consumed
    }
}

/// Coarse periodic gate used for slow housekeeping (spawn checks).
#[derive(Debug, Clone)]
pub struct CadenceTimer {
    interval_ms: u64,
    next_due_ms: u64,
}

impl CadenceTimer {
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: now_ms + interval_ms.max(1),
        }
    }

    /// True at most once per interval; re-arms from the due time so slow
    /// callers do not accumulate a backlog of fires.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        let intervals = (now_ms - self.next_due_ms) / self.interval_ms + 1;
        self.next_due_ms += intervals * self.interval_ms;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_matches_elapsed_over_granularity() {
        let clock = WorldClock::new(10_000);
        assert_eq!(clock.available(10_000), 0);
        assert_eq!(clock.available(10_000 + AP_GRANULARITY_MS), 1);
        assert_eq!(clock.available(10_000 + 25 * AP_GRANULARITY_MS), 25);
    }

    #[test]
    fn consumed_points_reduce_the_budget() {
        let mut clock = WorldClock::new(0);
        let now = 10 * AP_GRANULARITY_MS;
        assert_eq!(clock.available(now), 10);
        clock.consume(10);
        assert_eq!(clock.available(now), 0);
        assert_eq!(clock.available(now + 3 * AP_GRANULARITY_MS), 3);
    }

    #[test]
    fn stalled_clock_yields_non_positive_budget() {
        let mut clock = WorldClock::new(0);
        clock.consume(5);
        assert_eq!(clock.available(2 * AP_GRANULARITY_MS), -3);
    }

    #[test]
    fn cadence_timer_fires_once_per_interval() {
        let mut timer = CadenceTimer::new(1_000, 0);
        assert!(!timer.due(500));
        assert!(timer.due(1_000));
        assert!(!timer.due(1_500));
        assert!(timer.due(2_400));
        assert!(!timer.due(2_900));
    }

    #[test]
    fn cadence_timer_skips_missed_intervals_without_backlog() {
        let mut timer = CadenceTimer::new(1_000, 0);
        assert!(timer.due(5_500));
        assert!(!timer.due(5_900));
        assert!(timer.due(6_000));
    }
}
