//! Frame clock and timer lease
//!
//! The frame clock turns host timestamps into a bounded dt. The lease ties
//! host timers (frame loop, wall-clock counter) to one PLAYING period: every
//! entry into PLAYING mints a new generation, every exit releases it, and
//! wall-clock ticks from an older generation are ignored.

/// Converts frame timestamps into dt (1.0 = one nominal frame)
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_budget_ms: f64,
    max_dt: f64,
    last_frame_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(frame_budget_ms: f64, max_dt: f64) -> Self {
        Self {
            frame_budget_ms,
            max_dt,
            last_frame_ms: None,
        }
    }

    /// Forget the previous timestamp; the next sample yields dt = 0
    pub fn rearm(&mut self) {
        self.last_frame_ms = None;
    }

    /// dt for a frame callback at `now_ms`; always records `now_ms`
    pub fn sample(&mut self, now_ms: f64) -> f64 {
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / self.frame_budget_ms).clamp(0.0, self.max_dt),
            None => 0.0,
        };
        self.last_frame_ms = Some(now_ms);
        dt
    }

    /// Simulated milliseconds represented by `dt`
    #[inline]
    pub fn dt_to_ms(&self, dt: f64) -> f64 {
        dt * self.frame_budget_ms
    }
}

/// Identifies one PLAYING period's timers
pub type Generation = u64;

/// Ownership of the host timers for the current PLAYING period
#[derive(Debug, Clone, Default)]
pub struct TimerLease {
    current: Option<Generation>,
    issued: Generation,
}

impl TimerLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release any previous lease and mint a new generation
    pub fn acquire(&mut self) -> Generation {
        self.issued += 1;
        self.current = Some(self.issued);
        self.issued
    }

    /// Drop the lease; returns the released generation if one was held
    pub fn release(&mut self) -> Option<Generation> {
        self.current.take()
    }

    pub fn current(&self) -> Option<Generation> {
        self.current
    }

    /// True if a timer callback tagged `generation` belongs to the live lease
    pub fn is_live(&self, generation: Generation) -> bool {
        self.current == Some(generation)
    }

    /// Generations minted so far
    pub fn issued(&self) -> Generation {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FRAME_BUDGET_MS, MAX_DT};

    #[test]
    fn test_first_sample_is_zero() {
        let mut clock = FrameClock::new(FRAME_BUDGET_MS, MAX_DT);
        assert_eq!(clock.sample(12_345.0), 0.0);
        let dt = clock.sample(12_345.0 + FRAME_BUDGET_MS);
        assert!((dt - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = FrameClock::new(FRAME_BUDGET_MS, MAX_DT);
        clock.sample(0.0);
        // Tab backgrounded for 30 seconds
        assert_eq!(clock.sample(30_000.0), MAX_DT);
        // Timestamp going backwards never yields negative dt
        assert_eq!(clock.sample(29_000.0), 0.0);
        // ... and the backwards timestamp was still recorded
        let dt = clock.sample(29_000.0 + FRAME_BUDGET_MS / 2.0);
        assert!((dt - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rearm_resets_baseline() {
        let mut clock = FrameClock::new(FRAME_BUDGET_MS, MAX_DT);
        clock.sample(0.0);
        clock.rearm();
        assert_eq!(clock.sample(50_000.0), 0.0);
    }

    #[test]
    fn test_lease_generations() {
        let mut lease = TimerLease::new();
        assert_eq!(lease.current(), None);
        let first = lease.acquire();
        assert!(lease.is_live(first));
        let second = lease.acquire();
        assert!(!lease.is_live(first));
        assert!(lease.is_live(second));
        assert_eq!(lease.release(), Some(second));
        assert!(!lease.is_live(second));
        assert_eq!(lease.release(), None);
        assert_eq!(lease.issued(), 2);
    }
}
