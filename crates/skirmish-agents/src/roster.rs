//! A team's agents and structures.
//!
//! The roster keeps registration order (proximity ties resolve by it),
//! tallies deployed units per kind, and latches the "all structures lost"
//! condition the first time its last structure is removed.

use std::collections::BTreeMap;

use skirmish_types::{AgentId, StructureId, TeamId};

use crate::kinds::UnitKind;

/// Result of removing an entity from a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The entity was a member and has been removed.
    Removed,
    /// The entity was not a member. A consistency problem, not fatal.
    NotRegistered,
}

/// Result of removing a structure from a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureRemoval {
    /// Whether the structure was a member.
    pub outcome: RemovalOutcome,
    /// This removal left the roster without structures for the first time.
    pub all_lost: bool,
}

/// The members of one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    team: TeamId,
    max_units: u32,
    agents: Vec<(AgentId, UnitKind)>,
    structures: Vec<StructureId>,
    counts: BTreeMap<UnitKind, u32>,
    all_structures_lost: bool,
}

impl Roster {
    /// Create an empty roster allowing at most `max_units` deployed agents.
    pub const fn new(team: TeamId, max_units: u32) -> Self {
        Self {
            team,
            max_units,
            agents: Vec::new(),
            structures: Vec::new(),
            counts: BTreeMap::new(),
            all_structures_lost: false,
        }
    }

    /// The team this roster belongs to.
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Deployment cap.
    pub const fn max_units(&self) -> u32 {
        self.max_units
    }

    /// Change the deployment cap. Already deployed agents stay.
    pub const fn set_max_units(&mut self, max_units: u32) {
        self.max_units = max_units;
    }

    /// Number of deployed agents.
    pub fn total_units(&self) -> u32 {
        self.counts.values().fold(0_u32, |sum, n| sum.saturating_add(*n))
    }

    /// Number of deployed agents of `kind`.
    pub fn unit_count(&self, kind: UnitKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Whether another agent fits under the cap.
    pub fn can_deploy(&self) -> bool {
        self.total_units() < self.max_units
    }

    /// Deployed agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().map(|(id, _)| *id)
    }

    /// Structures in registration order.
    pub fn structures(&self) -> &[StructureId] {
        &self.structures
    }

    /// Whether `id` is a deployed member.
    pub fn contains_agent(&self, id: AgentId) -> bool {
        self.agents.iter().any(|(member, _)| *member == id)
    }

    /// Whether every structure has been lost at some point.
    pub const fn has_lost_all_structures(&self) -> bool {
        self.all_structures_lost
    }

    /// Add a deployed agent. Returns `false` if it already was a member.
    pub fn register_agent(&mut self, id: AgentId, kind: UnitKind) -> bool {
        if self.contains_agent(id) {
            return false;
        }
        self.agents.push((id, kind));
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
        true
    }

    /// Remove a deployed agent and decrement its kind's tally.
    pub fn remove_agent(&mut self, id: AgentId) -> RemovalOutcome {
        let Some(index) = self.agents.iter().position(|(member, _)| *member == id) else {
            return RemovalOutcome::NotRegistered;
        };
        let (_, kind) = self.agents.remove(index);
        if let Some(count) = self.counts.get_mut(&kind) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&kind);
            }
        }
        RemovalOutcome::Removed
    }

    /// Add a structure. Returns `false` if it already was a member.
    pub fn register_structure(&mut self, id: StructureId) -> bool {
        if self.structures.contains(&id) {
            return false;
        }
        self.structures.push(id);
        true
    }

    /// Remove a structure, latching "all structures lost" when the last one
    /// goes.
    pub fn remove_structure(&mut self, id: StructureId) -> StructureRemoval {
        let Some(index) = self.structures.iter().position(|member| *member == id) else {
            return StructureRemoval {
                outcome: RemovalOutcome::NotRegistered,
                all_lost: false,
            };
        };
        self.structures.remove(index);
        let all_lost = self.structures.is_empty() && !self.all_structures_lost;
        if all_lost {
            self.all_structures_lost = true;
        }
        StructureRemoval {
            outcome: RemovalOutcome::Removed,
            all_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_track_kinds() {
        let mut roster = Roster::new(TeamId(1), 4);
        let melee = AgentId::new();
        assert!(roster.register_agent(melee, UnitKind::Melee));
        assert!(roster.register_agent(AgentId::new(), UnitKind::Ranged));
        assert!(!roster.register_agent(melee, UnitKind::Melee));
        assert_eq!(roster.total_units(), 2);
        assert_eq!(roster.unit_count(UnitKind::Melee), 1);

        assert_eq!(roster.remove_agent(melee), RemovalOutcome::Removed);
        assert_eq!(roster.unit_count(UnitKind::Melee), 0);
        assert_eq!(roster.total_units(), 1);
    }

    #[test]
    fn double_removal_is_reported() {
        let mut roster = Roster::new(TeamId(1), 4);
        let id = AgentId::new();
        roster.register_agent(id, UnitKind::Aoe);
        assert_eq!(roster.remove_agent(id), RemovalOutcome::Removed);
        assert_eq!(roster.remove_agent(id), RemovalOutcome::NotRegistered);
    }

    #[test]
    fn losing_last_structure_latches_once() {
        let mut roster = Roster::new(TeamId(0), 0);
        let first = StructureId::new();
        let second = StructureId::new();
        roster.register_structure(first);
        roster.register_structure(second);

        assert!(!roster.remove_structure(first).all_lost);
        assert!(roster.remove_structure(second).all_lost);
        assert!(roster.has_lost_all_structures());
        let again = roster.remove_structure(second);
        assert_eq!(again.outcome, RemovalOutcome::NotRegistered);
        assert!(!again.all_lost);
    }

    #[test]
    fn cap_limits_deployment() {
        let mut roster = Roster::new(TeamId(0), 1);
        assert!(roster.can_deploy());
        roster.register_agent(AgentId::new(), UnitKind::Melee);
        assert!(!roster.can_deploy());
    }

    #[test]
    fn agents_keep_registration_order() {
        let mut roster = Roster::new(TeamId(0), 9);
        let ids: Vec<_> = (0..3).map(|_| AgentId::new()).collect();
        for id in &ids {
            roster.register_agent(*id, UnitKind::Melee);
        }
        assert_eq!(roster.agents().collect::<Vec<_>>(), ids);
    }
}
