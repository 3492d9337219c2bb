//! Simulation context, decision procedure, and run loop for the Skirmish
//! simulation.
//!
//! This crate owns the [`Simulation`] value that replaces any global
//! registry: every agent, structure, roster, and defeat subscription lives
//! inside it, and every cross-entity effect (damage, defeat, re-targeting,
//! taunting) runs through it synchronously.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and elapsed simulated time
//! - [`commander`] -- Automatic unit deployment for AI-controlled teams
//! - [`commands`] -- Application of behavior commands against the world
//! - [`config`] -- Configuration loading from `skirmish-config.yaml`
//! - [`decision`] -- The per-agent decision procedure
//! - [`events`] -- Ordered simulation events and per-tick summaries
//! - [`proximity`] -- Ascending-distance queries over rosters
//! - [`runner`] -- Bounded fixed-step run loop
//! - [`simulation`] -- The simulation context and its defeat chain

pub mod clock;
pub mod commander;
pub mod commands;
pub mod config;
pub mod decision;
pub mod events;
pub mod proximity;
pub mod runner;
pub mod simulation;

pub use commander::AutoCommander;
pub use config::SimulationConfig;
pub use decision::Decision;
pub use events::{SimEvent, TickSummary};
pub use proximity::{Nearby, TeamFilter};
pub use runner::{NoOpCallback, SimulationEndReason, SimulationResult, TickCallback, run_simulation};
pub use simulation::{SimError, Simulation};
