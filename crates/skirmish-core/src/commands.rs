//! Application of behavior commands against the world.
//!
//! Behaviors only describe what they want. This module carries it out with
//! full access to the [`Simulation`]: moving navigators, resolving strikes,
//! and forcing taunted agents into combat.

use std::f32::consts::TAU;

use rand::Rng;
use skirmish_agents::{Agent, Command, Listener, StateKind};
use skirmish_types::{AgentId, EntityRef, Position};
use tracing::debug;

use crate::proximity::TeamFilter;
use crate::simulation::{SimError, Simulation};

/// States a taunted agent may not choose while the taunt lasts.
const TAUNT_MASK: [StateKind; 4] = [
    StateKind::Traveling,
    StateKind::AttackingStructure,
    StateKind::DefendingStructure,
    StateKind::Taunting,
];

impl Simulation {
    /// Apply one command emitted by agent `id` while `origin` was active.
    pub(crate) fn apply_command(
        &mut self,
        id: AgentId,
        origin: StateKind,
        command: Command,
    ) -> Result<(), SimError> {
        match command {
            Command::Evaluate => {
                self.evaluate(id)?;
            }
            Command::QuitRoute => self.get_agent_mut(id)?.navigator_mut().quit_route(),
            Command::SetPaused(paused) => self.get_agent_mut(id)?.navigator_mut().set_paused(paused),
            Command::MatchSpeedFactor => {
                let agent = self.get_agent_mut(id)?;
                let speed_factor = agent.vitals().speed_factor();
                agent.navigator_mut().set_speed(speed_factor);
            }
            Command::SetDestinationTolerance(tolerance) => self
                .get_agent_mut(id)?
                .navigator_mut()
                .set_destination_tolerance(tolerance),
            Command::Travel(destination) => {
                let destination = destination.unwrap_or(self.rally_point);
                self.get_agent_mut(id)?
                    .navigator_mut()
                    .set_destination(destination);
            }
            Command::ChaseTarget => self.chase_target(id, origin)?,
            Command::SwarmTarget {
                min_radius,
                max_radius,
            } => self.swarm_target(id, origin, min_radius, max_radius)?,
            Command::FleeAlliedStructures { radius } => self.flee_allied_structures(id, radius)?,
            Command::StrikeTarget => self.strike_target(id, origin)?,
            Command::Taunt(victim) => self.taunt(id, victim)?,
            Command::ReleaseTaunt(victim) => self.release_taunt(victim),
        }
        Ok(())
    }

    /// The target held by the `origin` behavior of `id`.
    fn held_target(&self, id: AgentId, origin: StateKind) -> Result<Option<EntityRef>, SimError> {
        Ok(self.get_agent(id)?.machine().state(origin)?.target())
    }

    fn chase_target(&mut self, id: AgentId, origin: StateKind) -> Result<(), SimError> {
        let Some(target) = self.held_target(id, origin)? else {
            return Ok(());
        };
        let Some(destination) = self.entity_position(target) else {
            return Ok(());
        };
        self.get_agent_mut(id)?
            .navigator_mut()
            .set_destination(destination);
        Ok(())
    }

    fn swarm_target(
        &mut self,
        id: AgentId,
        origin: StateKind,
        min_radius: f32,
        max_radius: f32,
    ) -> Result<(), SimError> {
        let Some(target) = self.held_target(id, origin)? else {
            return Ok(());
        };
        let Some(center) = self.entity_position(target) else {
            return Ok(());
        };
        let angle = self.rng.random::<f32>() * TAU;
        let radius = min_radius + (max_radius - min_radius) * self.rng.random::<f32>();
        self.get_agent_mut(id)?
            .navigator_mut()
            .set_destination(center.offset_polar(angle, radius));
        Ok(())
    }

    /// Run `radius` further away from the nearest standing allied
    /// structure. Without one there is nothing to flee from.
    fn flee_allied_structures(&mut self, id: AgentId, radius: f32) -> Result<(), SimError> {
        let agent = self.get_agent(id)?;
        let here = agent.position();
        let team = agent.team();
        let Some(base) = self
            .structures_near(here, TeamFilter::Allies(team))
            .into_iter()
            .next()
        else {
            return Ok(());
        };

        let away = (here - base.position).normalized();
        let destination = if away.length_squared() > 0.0 {
            here + away * radius
        } else {
            here.offset_polar(self.rng.random::<f32>() * TAU, radius)
        };
        self.get_agent_mut(id)?
            .navigator_mut()
            .set_destination(destination);
        Ok(())
    }

    /// Resolve one strike of `id` against its `origin` behavior's target.
    ///
    /// Agents are hit when strictly within `range`; structures when within
    /// `range` of their footprint. Splash damage reaches every other
    /// active enemy within `splash_radius` of the primary victim.
    fn strike_target(&mut self, id: AgentId, origin: StateKind) -> Result<(), SimError> {
        let Some(target) = self.held_target(id, origin)? else {
            return Ok(());
        };
        let attacker = self.get_agent(id)?;
        let profile = *attacker.profile();
        let team = attacker.team();
        let here = attacker.position();
        let reach_squared = profile.range() * profile.range();
        let damage = profile.attack_damage();

        match target {
            EntityRef::Agent(victim) => {
                let Some(primary) = self.agents.get(&victim).filter(|a| !a.is_disabled()) else {
                    return Ok(());
                };
                let impact = primary.position();
                if here.distance_squared(impact) >= reach_squared {
                    return Ok(());
                }

                let mut struck = vec![victim];
                let splash = profile.splash_radius();
                if splash > 0.0 {
                    let splash_squared = splash * splash;
                    struck.extend(
                        self.agents_near(impact, TeamFilter::Enemies(team))
                            .into_iter()
                            .take_while(|hit| hit.distance_squared <= splash_squared)
                            .map(|hit| hit.id)
                            .filter(|hit| *hit != victim),
                    );
                }
                debug!(attacker = %id, victim = %victim, hits = struck.len(), damage, "Strike");
                for hit in struck {
                    if self.agents.get(&hit).is_none_or(Agent::is_disabled) {
                        continue;
                    }
                    self.damage_agent(hit, damage)?;
                    self.add_damage_dealt(id, damage)?;
                }
            }
            EntityRef::Structure(structure) => {
                let Some(building) = self
                    .structures
                    .get(&structure)
                    .filter(|s| !s.is_destroyed())
                else {
                    return Ok(());
                };
                let limit = reach_squared + building.damage_radius_squared();
                if here.distance_squared(building.position()) >= limit {
                    return Ok(());
                }
                debug!(attacker = %id, structure = %structure, damage, "Strike");
                self.damage_structure(structure, damage)?;
                self.add_damage_dealt(id, damage)?;
            }
        }
        Ok(())
    }

    /// Force `victim` to attack `taunter`.
    ///
    /// Every decision except attacking a unit is masked on the victim's
    /// template until the taunter leaves `Taunting`.
    fn taunt(&mut self, taunter: AgentId, victim: AgentId) -> Result<(), SimError> {
        let Some(target) = self.agents.get_mut(&victim).filter(|a| !a.is_disabled()) else {
            return Ok(());
        };
        for state in &TAUNT_MASK {
            target.template_mut().mask(state);
        }
        target
            .machine_mut()
            .state_mut(StateKind::AttackingUnit)?
            .rebind_target(
                Some(EntityRef::Agent(taunter)),
                &mut self.subscriptions,
                Listener::Behavior {
                    agent: victim,
                    state: StateKind::AttackingUnit,
                },
            )?;
        let already_attacking = target.state() == StateKind::AttackingUnit;
        debug!(taunter = %taunter, victim = %victim, "Taunt");

        if already_attacking {
            self.chase_target(victim, StateKind::AttackingUnit)
        } else {
            self.transition(victim, StateKind::AttackingUnit).map(|_| ())
        }
    }

    fn release_taunt(&mut self, victim: AgentId) {
        if let Some(agent) = self.agents.get_mut(&victim) {
            agent.template_mut().reset_coefficients();
            debug!(victim = %victim, "Taunt released");
        }
    }

    /// Where the agent's navigator is heading, if anywhere.
    pub fn destination_of(&self, id: AgentId) -> Option<Position> {
        self.agents.get(&id).and_then(|a| a.navigator().destination())
    }
}
