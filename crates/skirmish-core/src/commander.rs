//! Automatic unit deployment for AI-controlled teams.
//!
//! An [`AutoCommander`] thinks on a fixed interval. Each thought spawns one
//! unit from the charged factory closest to the enemy army, as long as the
//! team is under its unit cap. Long frames are caught up with one thought
//! per elapsed interval. Once the team has lost all of its structures the
//! commander stops for good.

use skirmish_agents::{PeriodicTimer, Structure};
use skirmish_types::{AgentId, Position, TeamId};
use tracing::{debug, info};

use crate::proximity::TeamFilter;
use crate::simulation::{SimError, Simulation};

/// Shortest accepted thought interval, in seconds.
pub const MIN_THOUGHT_INTERVAL: f32 = 0.001;

/// Spawns units for one team.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoCommander {
    team: TeamId,
    thought: PeriodicTimer,
    halted: bool,
}

impl AutoCommander {
    /// A commander for `team` thinking every `thought_interval` seconds.
    pub fn new(team: TeamId, thought_interval: f32) -> Self {
        Self {
            team,
            thought: PeriodicTimer::new(thought_interval.max(MIN_THOUGHT_INTERVAL)),
            halted: false,
        }
    }

    /// The team this commander deploys for.
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Whether the commander has stopped after losing every structure.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Let `delta_time` seconds pass. Returns the number of units spawned.
    pub fn think(&mut self, sim: &mut Simulation, delta_time: f32) -> Result<u32, SimError> {
        if self.halted {
            return Ok(0);
        }
        let roster = sim
            .roster(self.team)
            .ok_or(SimError::RosterNotFound(self.team))?;
        if roster.has_lost_all_structures() {
            self.halted = true;
            info!(team = %self.team, "Commander halted: all structures lost");
            return Ok(0);
        }

        let mut spawned = 0_u32;
        for _ in 0..self.thought.drain(delta_time) {
            if self.take_action(sim)?.is_some() {
                spawned = spawned.saturating_add(1);
            }
        }
        Ok(spawned)
    }

    /// One thought: deploy from the charged factory nearest the enemy.
    fn take_action(&self, sim: &mut Simulation) -> Result<Option<AgentId>, SimError> {
        let roster = sim
            .roster(self.team)
            .ok_or(SimError::RosterNotFound(self.team))?;
        if !roster.can_deploy() {
            return Ok(None);
        }

        let rally_point = sim.rally_point();
        let front = Position::centroid(
            sim.agents_near(rally_point, TeamFilter::Enemies(self.team))
                .iter()
                .map(|enemy| enemy.position),
        )
        .unwrap_or(rally_point);

        let site = sim
            .structures_near(front, TeamFilter::Allies(self.team))
            .into_iter()
            .find(|site| {
                sim.structure(site.id)
                    .and_then(Structure::factory)
                    .is_some_and(|factory| factory.is_charged())
            });
        let Some(site) = site else {
            return Ok(None);
        };

        let agent = sim.spawn_from_factory(site.id)?;
        debug!(team = %self.team, agent = %agent, structure = %site.id, "Commander deployed unit");
        Ok(Some(agent))
    }
}
