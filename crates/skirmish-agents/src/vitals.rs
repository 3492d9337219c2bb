//! Clamped agent vitals.
//!
//! Invariants held after every setter:
//!
//! - `0 <= health <= max_health`
//! - `max_health >= 0`
//! - `speed_factor >= f32::EPSILON`
//! - `damage_dealt >= 0`
//!
//! Setters return what changed; they never raise notifications themselves.
//! The simulation turns a returned change into events, meter pushes, and
//! (for a depleted health change) the defeat chain. NaN inputs are ignored.

use crate::config::VitalsConfig;

/// Whether two clamped vital values differ.
fn differs(a: f32, b: f32) -> bool {
    (a - b).abs() > 0.0
}

/// A health value transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthChange {
    /// Health before the change.
    pub previous: f32,
    /// Health after the change.
    pub current: f32,
}

impl HealthChange {
    /// Health reached zero with this change.
    pub fn depleted(self) -> bool {
        self.current <= 0.0 && self.previous > 0.0
    }
}

/// Outcome of [`Vitals::set_max_health`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxHealthChange {
    /// New maximum.
    pub max_health: f32,
    /// Health lowered to fit under the new maximum, if it had to be.
    pub health: Option<HealthChange>,
}

/// Health, max health, speed factor, and cumulative damage dealt.
#[derive(Debug, Clone, PartialEq)]
pub struct Vitals {
    health: f32,
    max_health: f32,
    speed_factor: f32,
    damage_dealt: f32,
}

impl Vitals {
    /// Build vitals, clamping each input into range.
    ///
    /// A fresh agent is alive: starting health and max health are raised to
    /// at least `f32::EPSILON`.
    pub fn new(health: f32, max_health: f32, speed_factor: f32) -> Self {
        let max_health = sanitize(max_health).max(f32::EPSILON);
        let health = sanitize(health).clamp(f32::EPSILON, max_health);
        Self {
            health,
            max_health,
            speed_factor: sanitize(speed_factor).max(f32::EPSILON),
            damage_dealt: 0.0,
        }
    }

    /// Build vitals from configuration.
    pub fn from_config(config: &VitalsConfig) -> Self {
        Self::new(
            config.starting_health,
            config.max_health,
            config.speed_factor,
        )
    }

    /// Current health.
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Navigation speed multiplier.
    pub const fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// Total damage this agent has dealt.
    pub const fn damage_dealt(&self) -> f32 {
        self.damage_dealt
    }

    /// Whether health has reached zero.
    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    /// Set health, clamped to `[0, max_health]`.
    pub fn set_health(&mut self, value: f32) -> Option<HealthChange> {
        if value.is_nan() {
            return None;
        }
        let clamped = value.clamp(0.0, self.max_health);
        if !differs(clamped, self.health) {
            return None;
        }
        let change = HealthChange {
            previous: self.health,
            current: clamped,
        };
        self.health = clamped;
        Some(change)
    }

    /// Set max health, clamped to `>= 0`. Lowers health when it no longer
    /// fits.
    pub fn set_max_health(&mut self, value: f32) -> Option<MaxHealthChange> {
        if value.is_nan() {
            return None;
        }
        let clamped = value.max(0.0);
        if !differs(clamped, self.max_health) {
            return None;
        }
        self.max_health = clamped;
        let health = if self.health > clamped {
            self.set_health(clamped)
        } else {
            None
        };
        Some(MaxHealthChange {
            max_health: clamped,
            health,
        })
    }

    /// Set the speed factor, clamped to `>= f32::EPSILON`. Returns whether
    /// it changed.
    pub fn set_speed_factor(&mut self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        let clamped = value.max(f32::EPSILON);
        if !differs(clamped, self.speed_factor) {
            return false;
        }
        self.speed_factor = clamped;
        true
    }

    /// Set cumulative damage dealt, clamped to `>= 0`. Returns whether it
    /// changed.
    pub fn set_damage_dealt(&mut self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        let clamped = value.max(0.0);
        if !differs(clamped, self.damage_dealt) {
            return false;
        }
        self.damage_dealt = clamped;
        true
    }

    /// Add to cumulative damage dealt. Negative amounts count as zero.
    pub fn add_damage_dealt(&mut self, amount: f32) -> bool {
        self.set_damage_dealt(self.damage_dealt + sanitize(amount))
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn health_is_clamped_to_range() {
        let mut vitals = Vitals::new(50.0, 100.0, 1.0);
        let _ = vitals.set_health(250.0);
        assert!(close(vitals.health(), 100.0));
        let _ = vitals.set_health(-30.0);
        assert!(close(vitals.health(), 0.0));
    }

    #[test]
    fn depletion_is_reported_once() {
        let mut vitals = Vitals::new(10.0, 100.0, 1.0);
        let first = vitals.set_health(-5.0);
        assert!(first.is_some_and(HealthChange::depleted));
        // Already at zero: no change, nothing to report.
        assert!(vitals.set_health(-50.0).is_none());
    }

    #[test]
    fn lowering_max_health_lowers_health() {
        let mut vitals = Vitals::new(80.0, 100.0, 1.0);
        let change = vitals.set_max_health(60.0);
        assert!(change.is_some_and(|c| c.health.is_some_and(|h| close(h.current, 60.0))));
        assert!(close(vitals.health(), 60.0));

        let zeroed = vitals.set_max_health(-1.0);
        assert!(zeroed.is_some_and(|c| c.health.is_some_and(HealthChange::depleted)));
    }

    #[test]
    fn speed_factor_never_reaches_zero() {
        let mut vitals = Vitals::new(1.0, 1.0, 0.0);
        assert!(vitals.speed_factor() >= f32::EPSILON);
        vitals.set_speed_factor(-4.0);
        assert!(vitals.speed_factor() >= f32::EPSILON);
    }

    #[test]
    fn damage_dealt_accumulates_and_ignores_negatives() {
        let mut vitals = Vitals::new(1.0, 1.0, 1.0);
        assert!(vitals.add_damage_dealt(3.0));
        assert!(!vitals.add_damage_dealt(-2.0));
        assert!(close(vitals.damage_dealt(), 3.0));
    }

    #[test]
    fn fresh_vitals_are_alive() {
        let vitals = Vitals::new(0.0, 0.0, 1.0);
        assert!(!vitals.is_depleted());
        assert!(vitals.health() <= vitals.max_health());
    }

    #[test]
    fn nan_inputs_are_ignored() {
        let mut vitals = Vitals::new(5.0, 10.0, 1.0);
        assert!(vitals.set_health(f32::NAN).is_none());
        assert!(close(vitals.health(), 5.0));
    }
}
