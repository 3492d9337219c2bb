//! Ordered simulation events and per-tick summaries.
//!
//! The [`Simulation`](crate::Simulation) appends a [`SimEvent`] for every
//! observable change, in the order the change happened inside the
//! synchronous call chain. Callers drain them whenever convenient.

use serde::Serialize;
use skirmish_agents::{StateKind, UnitKind};
use skirmish_types::{AgentId, EntityRef, Position, StructureId, TeamId};

/// An observable change in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// An agent joined its team's roster.
    UnitDeployed {
        /// The new agent.
        agent: AgentId,
        /// Its team.
        team: TeamId,
        /// Its unit kind.
        kind: UnitKind,
        /// Where it appeared.
        position: Position,
    },
    /// An agent's state machine switched state.
    StateChanged {
        /// The agent.
        agent: AgentId,
        /// Previous state.
        from: StateKind,
        /// New state.
        to: StateKind,
    },
    /// An agent's health changed.
    HealthChanged {
        /// The agent.
        agent: AgentId,
        /// New health.
        health: f32,
        /// Current maximum.
        max_health: f32,
    },
    /// An agent's maximum health changed.
    MaxHealthChanged {
        /// The agent.
        agent: AgentId,
        /// New maximum.
        max_health: f32,
    },
    /// An agent's speed factor changed.
    SpeedFactorChanged {
        /// The agent.
        agent: AgentId,
        /// New speed factor.
        speed_factor: f32,
    },
    /// An agent's cumulative damage dealt changed.
    DamageDealtChanged {
        /// The agent.
        agent: AgentId,
        /// New total.
        damage_dealt: f32,
    },
    /// An agent's health reached zero. Raised once per agent.
    AgentDefeated {
        /// The agent.
        agent: AgentId,
        /// Its team.
        team: TeamId,
    },
    /// A structure's health changed.
    StructureHealthChanged {
        /// The structure.
        structure: StructureId,
        /// New health.
        health: f32,
        /// Current maximum.
        max_health: f32,
    },
    /// A structure's health reached zero. Raised once per structure.
    StructureDestroyed {
        /// The structure.
        structure: StructureId,
        /// Its team.
        team: TeamId,
    },
    /// A team's last structure was destroyed. Raised once per team.
    AllStructuresLost {
        /// The team.
        team: TeamId,
    },
    /// A targeted behavior lost its target to defeat or destruction.
    TargetLost {
        /// The agent holding the target.
        agent: AgentId,
        /// The state whose behavior held it.
        state: StateKind,
        /// The lost target.
        target: EntityRef,
    },
}

/// What happened during one [`Simulation::tick`](crate::Simulation::tick).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick number that just ran.
    pub tick: u64,
    /// Simulated seconds elapsed after this tick.
    pub elapsed_seconds: f64,
    /// Agents still active (deployed and not disabled) after the tick.
    pub active_agents: usize,
    /// Agents defeated during the tick.
    pub defeated: Vec<AgentId>,
    /// Structures destroyed during the tick.
    pub destroyed: Vec<StructureId>,
    /// Teams that lost their last structure during the tick.
    pub teams_eliminated: Vec<TeamId>,
    /// Number of events recorded during the tick.
    pub event_count: usize,
}

impl TickSummary {
    /// Summarize the events recorded during a tick.
    pub fn from_events(
        tick: u64,
        elapsed_seconds: f64,
        active_agents: usize,
        events: &[SimEvent],
    ) -> Self {
        let mut summary = Self {
            tick,
            elapsed_seconds,
            active_agents,
            defeated: Vec::new(),
            destroyed: Vec::new(),
            teams_eliminated: Vec::new(),
            event_count: events.len(),
        };
        for event in events {
            match event {
                SimEvent::AgentDefeated { agent, .. } => summary.defeated.push(*agent),
                SimEvent::StructureDestroyed { structure, .. } => {
                    summary.destroyed.push(*structure);
                }
                SimEvent::AllStructuresLost { team } => summary.teams_eliminated.push(*team),
                _ => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_collects_terminal_events() {
        let agent = AgentId::new();
        let structure = StructureId::new();
        let events = vec![
            SimEvent::HealthChanged {
                agent,
                health: 0.0,
                max_health: 10.0,
            },
            SimEvent::AgentDefeated {
                agent,
                team: TeamId(1),
            },
            SimEvent::StructureDestroyed {
                structure,
                team: TeamId(2),
            },
            SimEvent::AllStructuresLost { team: TeamId(2) },
        ];
        let summary = TickSummary::from_events(3, 0.3, 5, &events);
        assert_eq!(summary.defeated, vec![agent]);
        assert_eq!(summary.destroyed, vec![structure]);
        assert_eq!(summary.teams_eliminated, vec![TeamId(2)]);
        assert_eq!(summary.event_count, 4);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(SimEvent::AllStructuresLost { team: TeamId(4) }).ok();
        let tag = json
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(tag, Some("all_structures_lost"));
    }
}
