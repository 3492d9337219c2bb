//! Structures and factories.
//!
//! A [`Structure`] is a static, destructible team asset. Its health obeys
//! the same clamp as an agent's, and destruction happens exactly once:
//! after it, health changes are ignored. A structure may carry a
//! [`Factory`] that spawns units for its team.

use skirmish_types::{Position, StructureId, TeamId};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::instantiator::Instantiator;
use crate::meter::Meter;

/// Outcome of a structure health change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureDamage {
    /// Health before the change.
    pub previous: f32,
    /// Health after the change.
    pub current: f32,
    /// This change destroyed the structure.
    pub destroyed: bool,
}

/// A destructible team structure.
#[derive(Debug)]
pub struct Structure {
    id: StructureId,
    team: TeamId,
    position: Position,
    damage_radius_squared: f32,
    health: f32,
    max_health: f32,
    destroyed: bool,
    meter: Option<Box<dyn Meter>>,
    factory: Option<Factory>,
}

impl Structure {
    /// Build a structure at `position` with full health.
    ///
    /// `damage_radius` widens the reach of attackers: a strike lands when
    /// the attacker is within `range` of the structure's footprint.
    pub fn new(team: TeamId, position: Position, damage_radius: f32, health: f32) -> Self {
        let radius = if damage_radius.is_nan() { 0.0 } else { damage_radius.max(0.0) };
        let health = if health.is_nan() { f32::EPSILON } else { health.max(f32::EPSILON) };
        Self {
            id: StructureId::new(),
            team,
            position,
            damage_radius_squared: radius * radius,
            health,
            max_health: health,
            destroyed: false,
            meter: None,
            factory: None,
        }
    }

    /// Attach a factory.
    #[must_use]
    pub fn with_factory(mut self, factory: Factory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Attach a health display.
    #[must_use]
    pub fn with_meter(mut self, meter: Box<dyn Meter>) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Identity.
    pub const fn id(&self) -> StructureId {
        self.id
    }

    /// Team.
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Location.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Squared footprint radius.
    pub const fn damage_radius_squared(&self) -> f32 {
        self.damage_radius_squared
    }

    /// Current health.
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether the structure has been destroyed.
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The factory, if this structure has one.
    pub const fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// The factory, mutably.
    pub const fn factory_mut(&mut self) -> Option<&mut Factory> {
        self.factory.as_mut()
    }

    /// Set health, clamped to `[0, max_health]`. Ignored once destroyed.
    pub fn set_health(&mut self, value: f32) -> Option<StructureDamage> {
        if self.destroyed || value.is_nan() {
            return None;
        }
        let clamped = value.clamp(0.0, self.max_health);
        if (clamped - self.health).abs() <= 0.0 {
            return None;
        }
        let previous = self.health;
        self.health = clamped;
        self.destroyed = clamped <= 0.0;
        self.push_meter();
        Some(StructureDamage {
            previous,
            current: clamped,
            destroyed: self.destroyed,
        })
    }

    /// Set max health (clamped to `>= 0`), lowering health if needed.
    pub fn set_max_health(&mut self, value: f32) -> Option<StructureDamage> {
        if self.destroyed || value.is_nan() {
            return None;
        }
        self.max_health = value.max(0.0);
        if self.health > self.max_health {
            self.set_health(self.max_health)
        } else {
            self.push_meter();
            None
        }
    }

    /// Push `(health, max_health)` to the meter, if one is attached.
    pub fn push_meter(&mut self) {
        if let Some(meter) = self.meter.as_mut() {
            meter.set_meter(self.health, self.max_health);
        }
    }
}

/// Unit production attached to a structure.
///
/// Charges for `cooldown` seconds after each spawn. Spawned units appear at
/// a random point of the ring between the inner and outer radius.
#[derive(Debug)]
pub struct Factory {
    inner_radius: f32,
    outer_radius: f32,
    cooldown: f32,
    since_spawn: f32,
    instantiator: Box<dyn Instantiator>,
    meter: Option<Box<dyn Meter>>,
}

impl Factory {
    /// Build a factory. Starts fully charged.
    pub fn new(
        inner_radius: f32,
        outer_radius: f32,
        cooldown: f32,
        instantiator: Box<dyn Instantiator>,
    ) -> Self {
        let inner = non_negative(inner_radius);
        let cooldown = non_negative(cooldown);
        Self {
            inner_radius: inner,
            outer_radius: non_negative(outer_radius).max(inner),
            cooldown,
            since_spawn: cooldown,
            instantiator,
            meter: None,
        }
    }

    /// Attach a cooldown display.
    #[must_use]
    pub fn with_meter(mut self, meter: Box<dyn Meter>) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Inner spawn radius.
    pub const fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    /// Outer spawn radius.
    pub const fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    /// Seconds between spawns.
    pub const fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Whether the cooldown has elapsed.
    pub fn is_charged(&self) -> bool {
        self.since_spawn >= self.cooldown
    }

    /// Charge by `delta_time` seconds.
    pub fn advance(&mut self, delta_time: f32) {
        if self.is_charged() {
            return;
        }
        self.since_spawn = (self.since_spawn + non_negative(delta_time)).min(self.cooldown);
        if let Some(meter) = self.meter.as_mut() {
            meter.set_meter(self.since_spawn, self.cooldown);
        }
    }

    /// Build a unit for `team` at `position` and restart the cooldown.
    pub fn produce(&mut self, team: TeamId, position: Position) -> Result<Agent, AgentError> {
        let agent = self.instantiator.instantiate(team, position)?;
        self.since_spawn = 0.0;
        if let Some(meter) = self.meter.as_mut() {
            meter.set_meter(0.0, self.cooldown);
        }
        Ok(agent)
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
