//! Tick counter and elapsed simulated time.
//!
//! The tick number is the source of truth; elapsed time is the sum of the
//! (sanitized) deltas handed to each tick.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Simulation clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimClock {
    tick: u64,
    elapsed_seconds: f64,
}

impl SimClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            elapsed_seconds: 0.0,
        }
    }

    /// Number of ticks run so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    pub const fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Advance by one tick of `delta_time` seconds, returning the new tick
    /// number. Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, delta_time: f32) -> Result<u64, ClockError> {
        let next = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.tick = next;
        self.elapsed_seconds += f64::from(sanitize_delta(delta_time));
        Ok(next)
    }
}

/// Clamp a frame delta to a finite, non-negative value.
pub fn sanitize_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() {
        delta_time.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_counts_ticks_and_time() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(0.5).ok(), Some(1));
        assert_eq!(clock.advance(0.25).ok(), Some(2));
        assert!((clock.elapsed_seconds() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn bad_deltas_do_not_move_time() {
        let mut clock = SimClock::new();
        let _ = clock.advance(-1.0);
        let _ = clock.advance(f32::NAN);
        assert_eq!(clock.tick(), 2);
        assert!(clock.elapsed_seconds().abs() < f64::EPSILON);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = SimClock {
            tick: u64::MAX,
            elapsed_seconds: 0.0,
        };
        assert!(matches!(clock.advance(1.0), Err(ClockError::TickOverflow)));
    }
}
