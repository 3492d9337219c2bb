//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agents and structures carry strongly-typed IDs so a unit can never be
//! mistaken for a building at compile time. IDs use UUID v7 (time-ordered),
//! which keeps ordered maps keyed by ID in creation order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a combat agent (unit).
    AgentId
}

define_id! {
    /// Unique identifier for a structure (base, factory).
    StructureId
}

/// Team identity. Agents and structures with equal team IDs are allies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl core::fmt::Display for TeamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

/// A non-owning reference to either kind of targetable entity.
///
/// Used as the key of the defeat/destruction observer registry, so both
/// entity kinds share one notification path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// A combat agent.
    Agent(AgentId),
    /// A structure.
    Structure(StructureId),
}

impl EntityRef {
    /// The agent ID, if this reference points at an agent.
    pub const fn as_agent(self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Structure(_) => None,
        }
    }

    /// The structure ID, if this reference points at a structure.
    pub const fn as_structure(self) -> Option<StructureId> {
        match self {
            Self::Structure(id) => Some(id),
            Self::Agent(_) => None,
        }
    }
}

impl From<AgentId> for EntityRef {
    fn from(id: AgentId) -> Self {
        Self::Agent(id)
    }
}

impl From<StructureId> for EntityRef {
    fn from(id: StructureId) -> Self {
        Self::Structure(id)
    }
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "agent:{id}"),
            Self::Structure(id) => write!(f, "structure:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new();
        let structure = StructureId::new();
        // Different types -- the compiler enforces no mixing.
        assert_ne!(agent.into_inner(), Uuid::nil());
        assert_ne!(structure.into_inner(), Uuid::nil());
    }

    #[test]
    fn ids_are_time_ordered() {
        let first = AgentId::new();
        let second = AgentId::new();
        assert!(first < second);
    }

    #[test]
    fn entity_ref_projects_to_its_kind() {
        let agent = AgentId::new();
        let reference = EntityRef::from(agent);
        assert_eq!(reference.as_agent(), Some(agent));
        assert_eq!(reference.as_structure(), None);
    }

    #[test]
    fn entity_ref_serializes_tagged() {
        let structure = StructureId::new();
        let json = serde_json::to_value(EntityRef::Structure(structure)).ok();
        let kind = json
            .as_ref()
            .and_then(|v| v.get("kind"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(kind, Some("structure"));
    }
}
