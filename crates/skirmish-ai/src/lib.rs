//! Decision-making primitives for the Skirmish simulation.
//!
//! Both primitives are generic and know nothing about combat: the agents
//! crate plugs its state kinds and behaviors into them.
//!
//! # Modules
//!
//! - [`machine`] -- Finite-state machine over a dense, exhaustive state table
//! - [`distribution`] -- Weighted sampler with maskable per-entry coefficients

pub mod distribution;
pub mod machine;

pub use distribution::{DistributionError, WeightedEntry, WeightedTable};
pub use machine::{MachineError, State, StateKey, StateMachine, TransitionObserver};
