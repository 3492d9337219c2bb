//! Combat agents, behaviors, structures, and rosters for the Skirmish
//! simulation.
//!
//! This crate is the logic layer for everything that fights: per-agent
//! vitals and state machines, the six combat behaviors, structures with
//! optional factories, and team rosters. It never reaches across entities
//! on its own; behaviors emit [`Command`]s and the simulation context in
//! `skirmish-core` applies them.
//!
//! # Modules
//!
//! - [`agent`] -- The combat agent ([`Agent`]) tying vitals, profile, template, and machine together
//! - [`behavior`] -- Per-state behaviors ([`Behavior`]) and the commands they emit
//! - [`config`] -- Tunable vitals and per-state timings ([`VitalsConfig`], [`BehaviorConfig`])
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`instantiator`] -- Unit construction for factories ([`Instantiator`], [`UnitTemplate`])
//! - [`kinds`] -- State and unit kind enumerations
//! - [`meter`] -- Display collaborator receiving `(current, max)` pushes
//! - [`navigation`] -- Navigation collaborator and a straight-line implementation
//! - [`periodic`] -- Fixed-interval accumulators driving behaviors
//! - [`profile`] -- Attack parameters per unit kind ([`AttackProfile`])
//! - [`roster`] -- A team's agents and structures ([`Roster`])
//! - [`structure`] -- Structures and factories ([`Structure`], [`Factory`])
//! - [`target`] -- Defeat/destruction subscriptions and target slots
//! - [`vitals`] -- Clamped health, max health, speed factor, damage dealt

pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod instantiator;
pub mod kinds;
pub mod meter;
pub mod navigation;
pub mod periodic;
pub mod profile;
pub mod roster;
pub mod structure;
pub mod target;
pub mod vitals;

pub use agent::Agent;
pub use behavior::{Behavior, BehaviorContext, Command};
pub use config::{BehaviorConfig, VitalsConfig};
pub use error::AgentError;
pub use instantiator::{Instantiator, UnitTemplate};
pub use kinds::{StateKind, TargetKind, UnitKind};
pub use meter::Meter;
pub use navigation::{LinearNavigator, NavigationEvent, Navigator};
pub use periodic::PeriodicTimer;
pub use profile::AttackProfile;
pub use roster::{RemovalOutcome, Roster, StructureRemoval};
pub use structure::{Factory, Structure, StructureDamage};
pub use target::{Listener, Subscriptions, TargetSlot};
pub use vitals::{HealthChange, MaxHealthChange, Vitals};
