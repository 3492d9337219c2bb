//! Attack parameters per unit kind.
//!
//! Every setter clamps into range and writes its own field.

use serde::Deserialize;

use crate::kinds::UnitKind;

/// How an agent strikes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "RawAttackProfile")]
pub struct AttackProfile {
    range: f32,
    attack_delay: f32,
    attack_damage: f32,
    splash_radius: f32,
}

/// Unclamped deserialization shape of [`AttackProfile`].
#[derive(Deserialize)]
struct RawAttackProfile {
    #[serde(default = "default_range")]
    range: f32,
    #[serde(default = "default_delay")]
    attack_delay: f32,
    #[serde(default = "default_damage")]
    attack_damage: f32,
    #[serde(default)]
    splash_radius: f32,
}

const fn default_range() -> f32 {
    1.0
}

const fn default_delay() -> f32 {
    1.0
}

const fn default_damage() -> f32 {
    1.0
}

impl From<RawAttackProfile> for AttackProfile {
    fn from(raw: RawAttackProfile) -> Self {
        Self::new(raw.range, raw.attack_delay, raw.attack_damage, raw.splash_radius)
    }
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self::new(default_range(), default_delay(), default_damage(), 0.0)
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

impl AttackProfile {
    /// Build a profile, clamping every parameter.
    pub fn new(range: f32, attack_delay: f32, attack_damage: f32, splash_radius: f32) -> Self {
        Self {
            range: non_negative(range),
            attack_delay: non_negative(attack_delay).max(f32::EPSILON),
            attack_damage: non_negative(attack_damage),
            splash_radius: non_negative(splash_radius),
        }
    }

    /// Stock profile for a unit kind.
    pub fn for_kind(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Melee => Self::new(1.5, 1.0, 10.0, 0.0),
            UnitKind::Ranged => Self::new(8.0, 1.5, 6.0, 0.0),
            UnitKind::Jousting => Self::new(3.0, 2.0, 18.0, 0.0),
            UnitKind::Aoe => Self::new(4.0, 2.5, 8.0, 2.5),
        }
    }

    /// Maximum strike distance.
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Seconds between strikes (always `>= f32::EPSILON`).
    pub const fn attack_delay(&self) -> f32 {
        self.attack_delay
    }

    /// Damage per strike.
    pub const fn attack_damage(&self) -> f32 {
        self.attack_damage
    }

    /// Radius around the struck agent in which other enemies also take the
    /// strike's damage. Zero disables splash.
    pub const fn splash_radius(&self) -> f32 {
        self.splash_radius
    }

    /// Set the strike range (clamped to `>= 0`).
    pub fn set_range(&mut self, value: f32) {
        self.range = non_negative(value);
    }

    /// Set the delay between strikes (clamped to `>= f32::EPSILON`).
    pub fn set_attack_delay(&mut self, value: f32) {
        self.attack_delay = non_negative(value).max(f32::EPSILON);
    }

    /// Set the damage per strike (clamped to `>= 0`).
    pub fn set_attack_damage(&mut self, value: f32) {
        self.attack_damage = non_negative(value);
    }

    /// Set the splash radius (clamped to `>= 0`).
    pub fn set_splash_radius(&mut self, value: f32) {
        self.splash_radius = non_negative(value);
    }
}
