//! Shared type definitions for the Skirmish simulation.
//!
//! Every crate in the workspace speaks in terms of the identifiers and
//! geometry defined here. Behavior lives elsewhere; this crate is data only.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers, team identity, entity references
//! - [`geometry`] -- World-space positions and distance helpers

pub mod geometry;
pub mod ids;

pub use geometry::Position;
pub use ids::{AgentId, EntityRef, StructureId, TeamId};
