//! Error types for the skirmish-agents crate.

use skirmish_ai::{DistributionError, MachineError};
use skirmish_types::EntityRef;

use crate::kinds::StateKind;

/// Errors that can occur while building or driving agents.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// An agent was built from a distribution template with no entries.
    #[error("agent distribution template has no entries")]
    EmptyTemplate,

    /// A target of the wrong entity kind was offered to a targeted state.
    #[error("state {state:?} cannot target {target}")]
    TargetMismatch {
        /// The state being bound.
        state: StateKind,
        /// The rejected target.
        target: EntityRef,
    },

    /// State table lookup failed.
    #[error("state machine error: {source}")]
    Machine {
        /// The underlying machine error.
        #[from]
        source: MachineError,
    },

    /// Sampling the decision distribution failed.
    #[error("distribution error: {source}")]
    Distribution {
        /// The underlying sampling error.
        #[from]
        source: DistributionError,
    },
}
