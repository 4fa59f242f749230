use std::time::Instant;

/// Millisecond clock shared by the controller and its timers.
///
/// The clock only moves when it is told to, which keeps every timing
/// property reproducible. Hosts that run in real time sample it from an
/// [`Instant`] via [`PlaybackClock::sync_to`].
#[derive(Debug, Default, Clone)]
pub struct PlaybackClock {
    now_ms: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        self.now_ms += delta_ms.max(0.0);
        self.now_ms
    }

    /// Moves the clock to the wall time elapsed since `origin`. Never goes
    /// backwards.
    pub fn sync_to(&mut self, origin: Instant) -> f64 {
        let elapsed = origin.elapsed().as_secs_f64() * 1000.0;
        self.now_ms = self.now_ms.max(elapsed);
        self.now_ms
    }
}

/// A pending deadline, either one-shot or repeating.
///
/// Cancelling is dropping the timer; owners keep it in an `Option` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    due_ms: f64,
    period_ms: Option<f64>,
}

impl Timer {
    /// Fires once, `delay_ms` after `now_ms`.
    pub fn once(now_ms: f64, delay_ms: f64) -> Self {
        Self {
            due_ms: now_ms + delay_ms.max(0.0),
            period_ms: None,
        }
    }

    /// Fires every `period_ms`, first one period after `now_ms`.
    pub fn repeating(now_ms: f64, period_ms: f64) -> Self {
        Self {
            due_ms: now_ms + period_ms,
            period_ms: Some(period_ms),
        }
    }

    pub fn due_ms(&self) -> f64 {
        self.due_ms
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.due_ms <= now_ms
    }

    /// Consumes one expiry if the timer is due and returns the deadline that
    /// fired. Repeating timers re-arm from that deadline, not from `now_ms`,
    /// so their cadence does not drift when polled late.
    pub fn poll(&mut self, now_ms: f64) -> Option<f64> {
        if !self.is_due(now_ms) {
            return None;
        }
        let fired = self.due_ms;
        if let Some(period) = self.period_ms {
            self.due_ms += period;
        }
        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_never_runs_backwards() {
        let mut clock = PlaybackClock::new();
        clock.advance(10.0);
        clock.advance(-5.0);
        assert_eq!(clock.now_ms(), 10.0);
    }

    #[test]
    fn one_shot_timer_fires_at_deadline() {
        let mut timer = Timer::once(100.0, 25.0);
        assert_eq!(timer.poll(124.9), None);
        assert_eq!(timer.poll(125.0), Some(125.0));
    }

    #[test]
    fn repeating_timer_catches_up_without_drift() {
        let mut timer = Timer::repeating(0.0, 150.0);
        let mut fired = Vec::new();
        while let Some(at) = timer.poll(500.0) {
            fired.push(at);
        }
        assert_eq!(fired, vec![150.0, 300.0, 450.0]);
        assert_eq!(timer.due_ms(), 600.0);
    }
}
