//! Tunable parameters for agent vitals and per-state behavior timings.
//!
//! Both structs deserialize from the `vitals` and `behavior` sections of
//! `skirmish-config.yaml`. Every field has a default, so a partial section
//! (or none at all) yields a working configuration. Out-of-range values are
//! clamped where they are consumed, never rejected.

use serde::Deserialize;

/// Starting vitals for newly built agents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VitalsConfig {
    /// Starting health (default: 100). Clamped to `[ε, max_health]`.
    #[serde(default = "default_health")]
    pub starting_health: f32,

    /// Maximum health (default: 100). Clamped to `>= ε`.
    #[serde(default = "default_health")]
    pub max_health: f32,

    /// Speed factor handed to the navigator (default: 1). Clamped to `>= ε`.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f32,

    /// Navigator speed in world units per second at speed factor 1
    /// (default: 3.5).
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
}

const fn default_health() -> f32 {
    100.0
}

const fn default_speed_factor() -> f32 {
    1.0
}

const fn default_base_speed() -> f32 {
    3.5
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            starting_health: default_health(),
            max_health: default_health(),
            speed_factor: default_speed_factor(),
            base_speed: default_base_speed(),
        }
    }
}

/// Timings and radii for every behavior.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BehaviorConfig {
    /// Traveling state parameters.
    #[serde(default)]
    pub traveling: TravelingConfig,

    /// Attacking-unit state parameters.
    #[serde(default)]
    pub attacking_unit: AttackingUnitConfig,

    /// Attacking-structure state parameters.
    #[serde(default)]
    pub attacking_structure: AttackingStructureConfig,

    /// Defending-structure state parameters.
    #[serde(default)]
    pub defending: DefendingConfig,

    /// Taunting state parameters.
    #[serde(default)]
    pub taunting: TauntingConfig,
}

/// Traveling: long repath interval, frequent re-evaluation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TravelingConfig {
    /// Seconds between route refreshes (default: 20).
    #[serde(default = "default_travel_repath")]
    pub repath_interval: f32,

    /// Seconds between decision runs (default: 1).
    #[serde(default = "default_one_second")]
    pub evaluate_interval: f32,

    /// Arrival tolerance handed to the navigator (default: 1).
    #[serde(default = "default_one_second")]
    pub destination_tolerance: f32,
}

const fn default_travel_repath() -> f32 {
    20.0
}

const fn default_one_second() -> f32 {
    1.0
}

impl Default for TravelingConfig {
    fn default() -> Self {
        Self {
            repath_interval: default_travel_repath(),
            evaluate_interval: default_one_second(),
            destination_tolerance: default_one_second(),
        }
    }
}

/// Attacking a unit: chase the target closely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttackingUnitConfig {
    /// Seconds between re-aiming at the moving target (default: 0.4).
    #[serde(default = "default_chase_repath")]
    pub repath_interval: f32,

    /// Seconds between decision runs (default: 1).
    #[serde(default = "default_one_second")]
    pub evaluate_interval: f32,
}

const fn default_chase_repath() -> f32 {
    0.4
}

impl Default for AttackingUnitConfig {
    fn default() -> Self {
        Self {
            repath_interval: default_chase_repath(),
            evaluate_interval: default_one_second(),
        }
    }
}

/// Attacking a structure: structures do not move, so no repath.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttackingStructureConfig {
    /// Seconds between decision runs (default: 3).
    #[serde(default = "default_three_seconds")]
    pub evaluate_interval: f32,
}

const fn default_three_seconds() -> f32 {
    3.0
}

impl Default for AttackingStructureConfig {
    fn default() -> Self {
        Self {
            evaluate_interval: default_three_seconds(),
        }
    }
}

/// Defending a structure by swarming around it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefendingConfig {
    /// Seconds between picking a new swarm point (default: 4).
    #[serde(default = "default_defend_repath")]
    pub repath_interval: f32,

    /// Seconds between decision runs (default: 2).
    #[serde(default = "default_defend_evaluate")]
    pub evaluate_interval: f32,

    /// Inner radius of the swarm ring (default: 5).
    #[serde(default = "default_swarm_min")]
    pub swarm_min_radius: f32,

    /// Outer radius of the swarm ring (default: 7).
    #[serde(default = "default_swarm_max")]
    pub swarm_max_radius: f32,
}

const fn default_defend_repath() -> f32 {
    4.0
}

const fn default_defend_evaluate() -> f32 {
    2.0
}

const fn default_swarm_min() -> f32 {
    5.0
}

const fn default_swarm_max() -> f32 {
    7.0
}

impl Default for DefendingConfig {
    fn default() -> Self {
        Self {
            repath_interval: default_defend_repath(),
            evaluate_interval: default_defend_evaluate(),
            swarm_min_radius: default_swarm_min(),
            swarm_max_radius: default_swarm_max(),
        }
    }
}

/// Taunting an enemy and running away from the home structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TauntingConfig {
    /// Seconds between flee refreshes (default: 5).
    #[serde(default = "default_taunt_repath")]
    pub repath_interval: f32,

    /// Seconds between decision runs (default: 3).
    #[serde(default = "default_three_seconds")]
    pub evaluate_interval: f32,

    /// How far past the agent, away from the nearest allied structure,
    /// the flee point lies (default: 6).
    #[serde(default = "default_redirection_radius")]
    pub redirection_radius: f32,
}

const fn default_taunt_repath() -> f32 {
    5.0
}

const fn default_redirection_radius() -> f32 {
    6.0
}

impl Default for TauntingConfig {
    fn default() -> Self {
        Self {
            repath_interval: default_taunt_repath(),
            evaluate_interval: default_three_seconds(),
            redirection_radius: default_redirection_radius(),
        }
    }
}
