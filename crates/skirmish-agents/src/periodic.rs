//! Fixed-interval accumulators.
//!
//! Behaviors use a [`PeriodicTimer`] per recurring action (re-evaluate,
//! repath, strike). Two firing styles exist:
//!
//! - [`PeriodicTimer::advance`] subtracts the interval on firing, so
//!   overshoot carries into the next period.
//! - [`PeriodicTimer::advance_resetting`] drops overshoot and restarts
//!   from zero.
//!
//! Both fire at most once per call. [`PeriodicTimer::drain`] catches up
//! every whole interval for loops that must not fall behind on long
//! frames.

/// Elapsed-time accumulator with a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTimer {
    interval: f32,
    elapsed: f32,
}

impl PeriodicTimer {
    /// Create a timer. Negative or NaN intervals clamp to zero.
    pub fn new(interval: f32) -> Self {
        Self {
            interval: clamp_interval(interval),
            elapsed: 0.0,
        }
    }

    /// The firing interval in seconds.
    pub const fn interval(&self) -> f32 {
        self.interval
    }

    /// Time accumulated toward the next firing.
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Change the interval. A changed interval restarts the accumulator.
    pub fn set_interval(&mut self, interval: f32) {
        let interval = clamp_interval(interval);
        if (interval - self.interval).abs() > 0.0 {
            self.interval = interval;
            self.elapsed = 0.0;
        }
    }

    /// Restart the accumulator.
    pub const fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Accumulate `delta_time`; fire (subtracting one interval) once the
    /// accumulated time exceeds the interval.
    pub fn advance(&mut self, delta_time: f32) -> bool {
        self.elapsed += clamp_interval(delta_time);
        if self.elapsed > self.interval {
            self.elapsed -= self.interval;
            true
        } else {
            false
        }
    }

    /// Accumulate `delta_time`; fire (restarting from zero) once the
    /// accumulated time exceeds the interval.
    pub fn advance_resetting(&mut self, delta_time: f32) -> bool {
        self.elapsed += clamp_interval(delta_time);
        if self.elapsed > self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Accumulate `delta_time` and return how many whole intervals elapsed.
    ///
    /// A zero interval would never drain; it fires once per call instead.
    pub fn drain(&mut self, delta_time: f32) -> u32 {
        self.elapsed += clamp_interval(delta_time);
        if self.interval <= 0.0 {
            let fired = self.elapsed > 0.0;
            self.elapsed = 0.0;
            return u32::from(fired);
        }
        let mut fired = 0_u32;
        while self.elapsed > self.interval {
            self.elapsed -= self.interval;
            fired = fired.saturating_add(1);
        }
        fired
    }
}

fn clamp_interval(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
