//! The per-agent decision procedure.
//!
//! An agent decides by reading the world through proximity queries,
//! masking the choices that have no candidate on a clone of its template,
//! drawing the next state, binding the nearest qualifying target and
//! committing the transition. The agent's own template is never touched,
//! so taunts and other coefficient changes survive every decision.

use skirmish_agents::{Listener, StateKind, TargetKind};
use skirmish_ai::DistributionError;
use skirmish_types::{AgentId, EntityRef};
use tracing::{debug, warn};

use crate::proximity::TeamFilter;
use crate::simulation::{SimError, Simulation};

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The agent is disabled and no longer decides.
    Inactive,
    /// Nothing could be drawn; the agent keeps its current state.
    Held,
    /// The agent committed to `state`.
    Committed {
        /// The drawn state.
        state: StateKind,
        /// The bound target, for targeted states.
        target: Option<EntityRef>,
    },
}

impl Simulation {
    /// Run the decision procedure for `id`.
    ///
    /// Drawing the already active targeted state binds the new nearest
    /// candidate through [`retarget_active`](Self::retarget_active).
    ///
    /// Drawing a targeted state with no candidate cannot happen with the
    /// masking above; debug builds assert it, release builds hold the
    /// current state.
    pub fn evaluate(&mut self, id: AgentId) -> Result<Decision, SimError> {
        let agent = self.get_agent(id)?;
        if agent.is_disabled() {
            return Ok(Decision::Inactive);
        }
        let origin = agent.position();
        let team = agent.team();
        let mut choices = agent.template().clone();

        let enemies = self.agents_near(origin, TeamFilter::Enemies(team));
        let enemy_structures = self.structures_near(origin, TeamFilter::Enemies(team));
        let allied_structures = self.structures_near(origin, TeamFilter::Allies(team));

        choices.mask(&StateKind::Disabled);
        if enemies.is_empty() {
            choices.mask(&StateKind::AttackingUnit);
            choices.mask(&StateKind::Taunting);
        }
        if enemy_structures.is_empty() {
            choices.mask(&StateKind::AttackingStructure);
        }
        if allied_structures.is_empty() {
            choices.mask(&StateKind::DefendingStructure);
        }

        let next = match choices.sample(&mut self.rng) {
            Ok(state) => *state,
            Err(DistributionError::ZeroTotalWeight) => {
                warn!(agent = %id, "Every choice is masked; holding current state");
                return Ok(Decision::Held);
            }
            Err(err) => return Err(err.into()),
        };

        let target = match next.target_kind() {
            None => None,
            Some(kind) => {
                let nearest = match kind {
                    TargetKind::EnemyAgent => enemies.first().map(|n| EntityRef::Agent(n.id)),
                    TargetKind::EnemyStructure => {
                        enemy_structures.first().map(|n| EntityRef::Structure(n.id))
                    }
                    TargetKind::AlliedStructure => {
                        allied_structures.first().map(|n| EntityRef::Structure(n.id))
                    }
                };
                debug_assert!(nearest.is_some(), "drew {next:?} without a candidate");
                let Some(target) = nearest else {
                    warn!(agent = %id, state = ?next, "No candidate to bind; holding current state");
                    return Ok(Decision::Held);
                };
                Some(target)
            }
        };

        debug!(agent = %id, state = ?next, target = ?target, "Decided");
        let current = self.get_agent(id)?.state();
        match target {
            Some(target) if next == current => {
                self.retarget_active(id, target)?;
            }
            Some(target) => {
                self.bind_target(id, next, target)?;
                self.transition(id, next)?;
            }
            None => {
                self.transition(id, next)?;
            }
        }
        Ok(Decision::Committed {
            state: next,
            target,
        })
    }

    /// Point the active behavior of `id` at `target`.
    ///
    /// The behavior is exited before the rebind and entered after it, so
    /// whatever it did to its old target is undone (a taunt is released)
    /// and redone for the new one (the new target is taunted or chased).
    /// Returns `Ok(false)` when the behavior already holds `target`.
    pub fn retarget_active(&mut self, id: AgentId, target: EntityRef) -> Result<bool, SimError> {
        let subscriptions = &mut self.subscriptions;
        let agent = self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))?;
        let state = agent.state();
        if agent.machine().state(state)?.target() == Some(target) {
            return Ok(false);
        }

        let mut ctx = agent.behavior_context();
        let listener = Listener::Behavior { agent: id, state };
        agent
            .machine_mut()
            .reenter(&mut ctx, |behavior| {
                behavior.rebind_target(Some(target), subscriptions, listener)
            })??;
        debug!(agent = %id, state = ?state, target = %target, "Retargeted");
        self.apply_commands(id, state, ctx.into_commands())?;
        Ok(true)
    }

    /// Point the `state` behavior of `id` at `target`, moving its defeat
    /// registration along.
    pub fn bind_target(
        &mut self,
        id: AgentId,
        state: StateKind,
        target: EntityRef,
    ) -> Result<bool, SimError> {
        let agent = self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))?;
        let rebound = agent.machine_mut().state_mut(state)?.rebind_target(
            Some(target),
            &mut self.subscriptions,
            Listener::Behavior { agent: id, state },
        )?;
        Ok(rebound)
    }
}

#[cfg(test)]
mod tests {
    use skirmish_agents::{Agent, LinearNavigator, UnitKind};
    use skirmish_ai::WeightedTable;
    use skirmish_types::{Position, TeamId};

    use super::*;

    fn spawn(
        sim: &mut Simulation,
        team: TeamId,
        position: Position,
        weights: &[(StateKind, f32)],
    ) -> Result<AgentId, SimError> {
        let agent = Agent::new(
            team,
            UnitKind::Melee,
            WeightedTable::from_weights(weights.iter().copied()),
            Box::new(LinearNavigator::new(position, 1.0)),
        )?;
        sim.deploy_agent(agent)
    }

    #[test]
    fn masked_template_holds_state() -> Result<(), SimError> {
        let mut sim = Simulation::new(3);
        sim.add_roster(TeamId(0), 4)?;
        let id = spawn(&mut sim, TeamId(0), Position::ZERO, &[(StateKind::AttackingUnit, 1.0)])?;
        assert_eq!(sim.evaluate(id)?, Decision::Held);
        assert_eq!(sim.agent(id).map(Agent::state), Some(StateKind::Traveling));
        Ok(())
    }

    #[test]
    fn nearest_enemy_is_bound() -> Result<(), SimError> {
        let mut sim = Simulation::new(3);
        sim.add_roster(TeamId(0), 4)?;
        sim.add_roster(TeamId(1), 4)?;
        let me = spawn(&mut sim, TeamId(0), Position::ZERO, &[(StateKind::AttackingUnit, 1.0)])?;
        let far = spawn(&mut sim, TeamId(1), Position::new(9.0, 0.0, 0.0), &[(StateKind::Traveling, 1.0)])?;
        let near = spawn(&mut sim, TeamId(1), Position::new(2.0, 0.0, 0.0), &[(StateKind::Traveling, 1.0)])?;

        let decision = sim.evaluate(me)?;
        assert_eq!(
            decision,
            Decision::Committed {
                state: StateKind::AttackingUnit,
                target: Some(EntityRef::Agent(near)),
            }
        );
        assert!(sim.subscriptions().is_subscribed(
            EntityRef::Agent(near),
            Listener::Behavior {
                agent: me,
                state: StateKind::AttackingUnit
            }
        ));
        assert!(sim.subscriptions().listeners(EntityRef::Agent(far)).len() == 1);
        Ok(())
    }

    #[test]
    fn redrawing_the_active_state_chases_the_new_target() -> Result<(), SimError> {
        let mut sim = Simulation::new(3);
        sim.add_roster(TeamId(0), 4)?;
        sim.add_roster(TeamId(1), 4)?;
        let me = spawn(&mut sim, TeamId(0), Position::ZERO, &[(StateKind::AttackingUnit, 1.0)])?;
        let far = spawn(&mut sim, TeamId(1), Position::new(9.0, 0.0, 0.0), &[(StateKind::Traveling, 1.0)])?;
        sim.evaluate(me)?;
        assert_eq!(sim.current_target(me), Some(EntityRef::Agent(far)));
        assert_eq!(sim.destination_of(me), Some(Position::new(9.0, 0.0, 0.0)));

        let near = spawn(&mut sim, TeamId(1), Position::new(2.0, 0.0, 0.0), &[(StateKind::Traveling, 1.0)])?;
        sim.evaluate(me)?;
        assert_eq!(sim.current_target(me), Some(EntityRef::Agent(near)));
        assert_eq!(sim.destination_of(me), Some(Position::new(2.0, 0.0, 0.0)));
        assert!(sim.subscriptions().listeners(EntityRef::Agent(far)).len() == 1);
        assert!(!sim.retarget_active(me, EntityRef::Agent(near))?);
        Ok(())
    }

    #[test]
    fn disabled_agents_do_not_decide() -> Result<(), SimError> {
        let mut sim = Simulation::new(3);
        sim.add_roster(TeamId(0), 4)?;
        let id = spawn(&mut sim, TeamId(0), Position::ZERO, &[(StateKind::Traveling, 1.0)])?;
        sim.set_agent_health(id, 0.0)?;
        assert_eq!(sim.evaluate(id)?, Decision::Inactive);
        Ok(())
    }
}
