//! The simulation context and its defeat chain.
//!
//! A [`Simulation`] owns every agent, structure, roster and defeat
//! subscription of a skirmish. There is no global registry: whoever holds
//! the value drives it.
//!
//! # Re-entrancy
//!
//! Effects run synchronously and in order. A single
//! [`damage_agent`](Simulation::damage_agent) call can defeat the agent,
//! transition it to `Disabled`, remove it from its roster, clear every
//! behavior targeting it and re-run those agents' decision procedures, all
//! before it returns. Listener lists are snapshotted before delivery and the
//! per-tick agent order is collected up front, so nested mutation never
//! invalidates an outer loop.
//!
//! Defeated agents and destroyed structures keep their final record until
//! [`purge_defeated`](Simulation::purge_defeated) drops them; every other
//! internal reference to them is released at the moment of defeat.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skirmish_agents::{
    Agent, AgentError, Command, HealthChange, Listener, RemovalOutcome, Roster, StateKind,
    Structure, Subscriptions,
};
use skirmish_agents::agent::INITIAL_STATE;
use skirmish_ai::{DistributionError, MachineError};
use skirmish_types::{AgentId, EntityRef, Position, StructureId, TeamId};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SimClock, sanitize_delta};
use crate::config::SimulationConfig;
use crate::events::{SimEvent, TickSummary};

/// Errors raised by simulation operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No agent with this id has been deployed.
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    /// No structure with this id has been registered.
    #[error("structure {0} not found")]
    StructureNotFound(StructureId),

    /// No roster exists for this team.
    #[error("no roster for {0}")]
    RosterNotFound(TeamId),

    /// A roster for this team already exists.
    #[error("roster for {0} already exists")]
    DuplicateRoster(TeamId),

    /// The agent has already been deployed.
    #[error("agent {0} already deployed")]
    DuplicateAgent(AgentId),

    /// The structure has already been registered.
    #[error("structure {0} already registered")]
    DuplicateStructure(StructureId),

    /// The team has reached its unit cap.
    #[error("{team} is at its unit cap of {max_units}")]
    RosterFull {
        /// The team.
        team: TeamId,
        /// Its cap.
        max_units: u32,
    },

    /// The structure has no factory.
    #[error("structure {0} has no factory")]
    NoFactory(StructureId),

    /// The factory cannot produce right now.
    #[error("factory of structure {structure} unavailable: {reason}")]
    FactoryUnavailable {
        /// The structure carrying the factory.
        structure: StructureId,
        /// Why it cannot produce.
        reason: &'static str,
    },

    /// An agent-level operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// A state lookup failed.
    #[error("state machine error: {source}")]
    Machine {
        /// The underlying machine error.
        #[from]
        source: MachineError,
    },

    /// A decision template could not be sampled.
    #[error("distribution error: {source}")]
    Distribution {
        /// The underlying distribution error.
        #[from]
        source: DistributionError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// The world of one skirmish.
#[derive(Debug)]
pub struct Simulation {
    pub(crate) agents: BTreeMap<AgentId, Agent>,
    pub(crate) structures: BTreeMap<StructureId, Structure>,
    pub(crate) rosters: Vec<Roster>,
    pub(crate) subscriptions: Subscriptions,
    pub(crate) rng: StdRng,
    pub(crate) clock: SimClock,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) rally_point: Position,
}

impl Simulation {
    /// An empty world whose random draws are seeded by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            agents: BTreeMap::new(),
            structures: BTreeMap::new(),
            rosters: Vec::new(),
            subscriptions: Subscriptions::new(),
            rng: StdRng::seed_from_u64(seed),
            clock: SimClock::new(),
            events: Vec::new(),
            rally_point: Position::ZERO,
        }
    }

    /// An empty world seeded and rallied from `config.world`.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut sim = Self::new(config.world.seed);
        sim.rally_point = config.world.rally_point;
        sim
    }

    // --- Rosters ---

    /// Create the roster of `team`. Rosters enumerate in creation order.
    pub fn add_roster(&mut self, team: TeamId, max_units: u32) -> Result<(), SimError> {
        if self.roster(team).is_some() {
            return Err(SimError::DuplicateRoster(team));
        }
        self.rosters.push(Roster::new(team, max_units));
        info!(team = %team, max_units, "Roster created");
        Ok(())
    }

    /// The roster of `team`.
    pub fn roster(&self, team: TeamId) -> Option<&Roster> {
        self.rosters.iter().find(|roster| roster.team() == team)
    }

    /// Every roster in creation order.
    pub fn rosters(&self) -> &[Roster] {
        &self.rosters
    }

    /// Change the unit cap of `team`.
    pub fn set_max_units(&mut self, team: TeamId, max_units: u32) -> Result<(), SimError> {
        self.roster_mut(team)?.set_max_units(max_units);
        Ok(())
    }

    fn roster_mut(&mut self, team: TeamId) -> Result<&mut Roster, SimError> {
        self.rosters
            .iter_mut()
            .find(|roster| roster.team() == team)
            .ok_or(SimError::RosterNotFound(team))
    }

    /// Remove `entity` from the roster of `team`.
    ///
    /// Defeat and destruction already do this. A second removal is a
    /// consistency problem: it is logged and reported, never fatal.
    pub fn remove_from_roster(&mut self, team: TeamId, entity: EntityRef) -> RemovalOutcome {
        let Some(roster) = self.rosters.iter_mut().find(|roster| roster.team() == team) else {
            warn!(team = %team, entity = %entity, "Removal from a team without roster");
            return RemovalOutcome::NotRegistered;
        };
        let outcome = match entity {
            EntityRef::Agent(id) => roster.remove_agent(id),
            EntityRef::Structure(id) => {
                let removal = roster.remove_structure(id);
                if removal.all_lost {
                    info!(team = %team, "All structures lost");
                    self.events.push(SimEvent::AllStructuresLost { team });
                }
                removal.outcome
            }
        };
        if outcome == RemovalOutcome::NotRegistered {
            warn!(team = %team, entity = %entity, "Entity was not registered with its roster");
        }
        outcome
    }

    // --- Lookup ---

    /// The agent `id`, including defeated ones not yet purged.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every agent record, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of deployed agents that are not disabled.
    pub fn active_agent_count(&self) -> usize {
        self.agents.values().filter(|agent| !agent.is_disabled()).count()
    }

    /// The structure `id`, including destroyed ones not yet purged.
    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Every structure record, in id order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub(crate) fn get_agent(&self, id: AgentId) -> Result<&Agent, SimError> {
        self.agents.get(&id).ok_or(SimError::AgentNotFound(id))
    }

    pub(crate) fn get_agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, SimError> {
        self.agents.get_mut(&id).ok_or(SimError::AgentNotFound(id))
    }

    /// The target held by the active behavior of `id`.
    pub fn current_target(&self, id: AgentId) -> Option<EntityRef> {
        self.agents.get(&id).and_then(Agent::current_target)
    }

    /// Where `entity` stands, if it is known.
    pub fn entity_position(&self, entity: EntityRef) -> Option<Position> {
        match entity {
            EntityRef::Agent(id) => self.agents.get(&id).map(Agent::position),
            EntityRef::Structure(id) => self.structures.get(&id).map(Structure::position),
        }
    }

    /// Defeat and destruction listeners.
    pub const fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// The simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Where traveling agents without a destination head.
    pub const fn rally_point(&self) -> Position {
        self.rally_point
    }

    /// Move the rally point. Agents pick it up on their next repath.
    pub const fn set_rally_point(&mut self, rally_point: Position) {
        self.rally_point = rally_point;
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take every recorded event.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop the records of defeated agents and destroyed structures.
    /// Returns how many records were dropped.
    pub fn purge_defeated(&mut self) -> usize {
        let before = self.agents.len().saturating_add(self.structures.len());
        self.agents.retain(|_, agent| !agent.is_disabled());
        self.structures.retain(|_, structure| !structure.is_destroyed());
        let after = self.agents.len().saturating_add(self.structures.len());
        let purged = before.saturating_sub(after);
        if purged > 0 {
            debug!(purged, "Purged defeated records");
        }
        purged
    }

    // --- Registration ---

    /// Hand a built agent to the simulation.
    ///
    /// The agent joins its team's roster, its defeat is wired to automatic
    /// de-registration, and its initial state is entered. The unit cap is
    /// not checked here: it bounds factory production only.
    pub fn deploy_agent(&mut self, mut agent: Agent) -> Result<AgentId, SimError> {
        let id = agent.id();
        let team = agent.team();
        let kind = agent.kind();
        if self.agents.contains_key(&id) {
            return Err(SimError::DuplicateAgent(id));
        }

        let mut ctx = agent.behavior_context();
        agent.machine_mut().activate(&mut ctx)?;
        self.roster_mut(team)?.register_agent(id, kind);
        self.subscriptions
            .subscribe(EntityRef::Agent(id), Listener::Roster(team));

        agent.push_meter();
        let position = agent.position();
        self.agents.insert(id, agent);
        info!(agent = %id, team = %team, kind = ?kind, "Unit deployed");
        self.events.push(SimEvent::UnitDeployed {
            agent: id,
            team,
            kind,
            position,
        });

        self.apply_commands(id, INITIAL_STATE, ctx.into_commands())?;
        Ok(id)
    }

    /// Hand a built structure to the simulation.
    pub fn register_structure(&mut self, mut structure: Structure) -> Result<StructureId, SimError> {
        let id = structure.id();
        let team = structure.team();
        if self.structures.contains_key(&id) {
            return Err(SimError::DuplicateStructure(id));
        }
        self.roster_mut(team)?.register_structure(id);
        self.subscriptions
            .subscribe(EntityRef::Structure(id), Listener::Roster(team));
        structure.push_meter();
        info!(structure = %id, team = %team, "Structure registered");
        self.structures.insert(id, structure);
        Ok(id)
    }

    // --- Agent vitals ---

    /// Set the health of `id`. Reaching zero defeats the agent.
    pub fn set_agent_health(&mut self, id: AgentId, value: f32) -> Result<(), SimError> {
        let Some(change) = self.get_agent_mut(id)?.vitals_mut().set_health(value) else {
            return Ok(());
        };
        self.after_health_change(id, change)
    }

    /// Lower the health of `id` by `amount`. Negative amounts count as zero.
    pub fn damage_agent(&mut self, id: AgentId, amount: f32) -> Result<(), SimError> {
        let health = self.get_agent(id)?.vitals().health();
        self.set_agent_health(id, health - non_negative(amount))
    }

    /// Set the max health of `id`, lowering its health when it no longer
    /// fits.
    pub fn set_agent_max_health(&mut self, id: AgentId, value: f32) -> Result<(), SimError> {
        let agent = self.get_agent_mut(id)?;
        let Some(change) = agent.vitals_mut().set_max_health(value) else {
            return Ok(());
        };
        agent.push_meter();
        self.events.push(SimEvent::MaxHealthChanged {
            agent: id,
            max_health: change.max_health,
        });
        match change.health {
            Some(health) => self.after_health_change(id, health),
            None => Ok(()),
        }
    }

    /// Set the speed factor of `id`. A traveling agent's navigator follows
    /// immediately.
    pub fn set_agent_speed_factor(&mut self, id: AgentId, value: f32) -> Result<(), SimError> {
        let agent = self.get_agent_mut(id)?;
        if !agent.vitals_mut().set_speed_factor(value) {
            return Ok(());
        }
        let speed_factor = agent.vitals().speed_factor();
        if agent.state() == StateKind::Traveling {
            agent.navigator_mut().set_speed(speed_factor);
        }
        self.events.push(SimEvent::SpeedFactorChanged {
            agent: id,
            speed_factor,
        });
        Ok(())
    }

    /// Set the cumulative damage dealt by `id`.
    pub fn set_damage_dealt(&mut self, id: AgentId, value: f32) -> Result<(), SimError> {
        let agent = self.get_agent_mut(id)?;
        if agent.vitals_mut().set_damage_dealt(value) {
            let damage_dealt = agent.vitals().damage_dealt();
            self.events.push(SimEvent::DamageDealtChanged {
                agent: id,
                damage_dealt,
            });
        }
        Ok(())
    }

    /// Add to the cumulative damage dealt by `id`.
    pub fn add_damage_dealt(&mut self, id: AgentId, amount: f32) -> Result<(), SimError> {
        let current = self.get_agent(id)?.vitals().damage_dealt();
        self.set_damage_dealt(id, current + non_negative(amount))
    }

    /// Move `id` instantly.
    pub fn teleport_agent(&mut self, id: AgentId, position: Position) -> Result<(), SimError> {
        self.get_agent_mut(id)?.navigator_mut().teleport(position);
        Ok(())
    }

    /// Set where `id` travels while in `Traveling`; `None` means the rally
    /// point.
    pub fn set_travel_destination(
        &mut self,
        id: AgentId,
        destination: Option<Position>,
    ) -> Result<(), SimError> {
        self.get_agent_mut(id)?.set_travel_destination(destination);
        Ok(())
    }

    fn after_health_change(&mut self, id: AgentId, change: HealthChange) -> Result<(), SimError> {
        let agent = self.get_agent_mut(id)?;
        agent.push_meter();
        let max_health = agent.vitals().max_health();
        self.events.push(SimEvent::HealthChanged {
            agent: id,
            health: change.current,
            max_health,
        });
        if change.depleted() {
            self.defeat_agent(id)?;
        }
        Ok(())
    }

    /// Disable `id` and deliver its defeat. Runs at most once per agent.
    fn defeat_agent(&mut self, id: AgentId) -> Result<(), SimError> {
        let agent = self.get_agent(id)?;
        if agent.is_disabled() {
            return Ok(());
        }
        let team = agent.team();

        self.transition(id, StateKind::Disabled)?;
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.release_targets(&mut self.subscriptions)?;
        }
        info!(agent = %id, team = %team, "Agent defeated");
        self.events.push(SimEvent::AgentDefeated { agent: id, team });
        self.notify_loss(EntityRef::Agent(id))
    }

    /// Deliver the loss of `entity` to a snapshot of its listeners, in
    /// registration order.
    fn notify_loss(&mut self, entity: EntityRef) -> Result<(), SimError> {
        for listener in self.subscriptions.take(entity) {
            match listener {
                Listener::Roster(team) => {
                    self.remove_from_roster(team, entity);
                }
                Listener::Behavior { agent, state } => {
                    self.on_target_lost(agent, state, entity)?;
                }
            }
        }
        Ok(())
    }

    fn on_target_lost(
        &mut self,
        holder: AgentId,
        state: StateKind,
        lost: EntityRef,
    ) -> Result<(), SimError> {
        let Some(agent) = self.agents.get_mut(&holder) else {
            return Ok(());
        };
        if !agent.machine_mut().state_mut(state)?.forget_target(lost) {
            debug!(agent = %holder, state = ?state, target = %lost, "Stale target listener");
            return Ok(());
        }
        let disabled = agent.is_disabled();
        debug!(agent = %holder, state = ?state, target = %lost, "Target lost");
        self.events.push(SimEvent::TargetLost {
            agent: holder,
            state,
            target: lost,
        });
        if !disabled {
            self.evaluate(holder)?;
        }
        Ok(())
    }

    // --- Transitions ---

    /// Switch `id` to `key`, then apply the commands its hooks emitted.
    ///
    /// Returns `Ok(false)` when `key` is already active or the agent is
    /// disabled.
    pub fn transition(&mut self, id: AgentId, key: StateKind) -> Result<bool, SimError> {
        let agent = self.get_agent_mut(id)?;
        let from = agent.state();
        if from == key {
            return Ok(false);
        }
        if from.is_terminal() {
            debug!(agent = %id, requested = ?key, "Ignoring transition out of a terminal state");
            return Ok(false);
        }

        let mut ctx = agent.behavior_context();
        let changed = agent.machine_mut().set_state(key, &mut ctx)?;
        if let Some((from, to)) = ctx.transition() {
            debug!(agent = %id, from = ?from, to = ?to, "State changed");
            self.events.push(SimEvent::StateChanged { agent: id, from, to });
        }
        self.apply_commands(id, key, ctx.into_commands())?;
        Ok(changed)
    }

    /// Apply hook commands emitted while `origin` was active. Commands are
    /// dropped once `origin` is no longer the agent's state, except cleanup
    /// commands.
    pub(crate) fn apply_commands(
        &mut self,
        id: AgentId,
        origin: StateKind,
        commands: Vec<Command>,
    ) -> Result<(), SimError> {
        for command in commands {
            if !command.is_cleanup() && self.agents.get(&id).map(Agent::state) != Some(origin) {
                debug!(agent = %id, origin = ?origin, command = ?command, "Dropping command of inactive state");
                continue;
            }
            self.apply_command(id, origin, command)?;
        }
        Ok(())
    }

    // --- Structures ---

    /// Set the health of structure `id`. Reaching zero destroys it.
    pub fn set_structure_health(&mut self, id: StructureId, value: f32) -> Result<(), SimError> {
        let structure = self
            .structures
            .get_mut(&id)
            .ok_or(SimError::StructureNotFound(id))?;
        let Some(damage) = structure.set_health(value) else {
            return Ok(());
        };
        let team = structure.team();
        let max_health = structure.max_health();
        self.after_structure_damage(id, team, damage.current, max_health, damage.destroyed)
    }

    /// Lower the health of structure `id` by `amount`.
    pub fn damage_structure(&mut self, id: StructureId, amount: f32) -> Result<(), SimError> {
        let health = self
            .structures
            .get(&id)
            .ok_or(SimError::StructureNotFound(id))?
            .health();
        self.set_structure_health(id, health - non_negative(amount))
    }

    /// Set the max health of structure `id`, lowering its health when it
    /// no longer fits.
    pub fn set_structure_max_health(
        &mut self,
        id: StructureId,
        value: f32,
    ) -> Result<(), SimError> {
        let structure = self
            .structures
            .get_mut(&id)
            .ok_or(SimError::StructureNotFound(id))?;
        let Some(damage) = structure.set_max_health(value) else {
            return Ok(());
        };
        let team = structure.team();
        let max_health = structure.max_health();
        self.after_structure_damage(id, team, damage.current, max_health, damage.destroyed)
    }

    fn after_structure_damage(
        &mut self,
        id: StructureId,
        team: TeamId,
        health: f32,
        max_health: f32,
        destroyed: bool,
    ) -> Result<(), SimError> {
        self.events.push(SimEvent::StructureHealthChanged {
            structure: id,
            health,
            max_health,
        });
        if !destroyed {
            return Ok(());
        }
        info!(structure = %id, team = %team, "Structure destroyed");
        self.events
            .push(SimEvent::StructureDestroyed { structure: id, team });
        self.notify_loss(EntityRef::Structure(id))
    }

    /// Produce a unit from the factory of `structure_id` and deploy it at
    /// a random point of the factory's spawn ring.
    pub fn spawn_from_factory(&mut self, structure_id: StructureId) -> Result<AgentId, SimError> {
        let structure = self
            .structures
            .get(&structure_id)
            .ok_or(SimError::StructureNotFound(structure_id))?;
        if structure.is_destroyed() {
            return Err(SimError::FactoryUnavailable {
                structure: structure_id,
                reason: "structure destroyed",
            });
        }
        let team = structure.team();
        let center = structure.position();
        let factory = structure
            .factory()
            .ok_or(SimError::NoFactory(structure_id))?;
        if !factory.is_charged() {
            return Err(SimError::FactoryUnavailable {
                structure: structure_id,
                reason: "cooling down",
            });
        }
        let (inner, outer) = (factory.inner_radius(), factory.outer_radius());

        let roster = self.roster(team).ok_or(SimError::RosterNotFound(team))?;
        if !roster.can_deploy() {
            return Err(SimError::RosterFull {
                team,
                max_units: roster.max_units(),
            });
        }

        let angle = self.rng.random::<f32>() * TAU;
        let radius = inner + (outer - inner) * self.rng.random::<f32>();
        let position = center.offset_polar(angle, radius);
        let agent = self
            .structures
            .get_mut(&structure_id)
            .and_then(Structure::factory_mut)
            .ok_or(SimError::NoFactory(structure_id))?
            .produce(team, position)?;
        self.deploy_agent(agent)
    }

    // --- Frame ---

    /// Advance the world by `delta_time` seconds.
    ///
    /// Factories charge first, then every active agent ticks in roster
    /// order (rosters in creation order). The order is collected before
    /// the first agent runs; agents deployed during the tick start next
    /// tick, agents defeated during it are skipped.
    pub fn tick(&mut self, delta_time: f32) -> Result<TickSummary, SimError> {
        let delta_time = sanitize_delta(delta_time);
        let tick = self.clock.advance(delta_time)?;
        let first_event = self.events.len();

        for structure in self.structures.values_mut() {
            if structure.is_destroyed() {
                continue;
            }
            if let Some(factory) = structure.factory_mut() {
                factory.advance(delta_time);
            }
        }

        let order: Vec<AgentId> = self
            .rosters
            .iter()
            .flat_map(|roster| roster.agents())
            .collect();
        for id in order {
            self.tick_agent(id, delta_time)?;
        }

        let summary = TickSummary::from_events(
            tick,
            self.clock.elapsed_seconds(),
            self.active_agent_count(),
            self.events.get(first_event..).unwrap_or(&[]),
        );
        debug!(
            tick,
            active_agents = summary.active_agents,
            events = summary.event_count,
            "Tick complete"
        );
        Ok(summary)
    }

    fn tick_agent(&mut self, id: AgentId, delta_time: f32) -> Result<(), SimError> {
        let Some(agent) = self.agents.get_mut(&id) else {
            return Ok(());
        };
        if agent.is_disabled() {
            return Ok(());
        }
        if let Some(event) = agent.navigator_mut().advance(delta_time) {
            debug!(agent = %id, event = ?event, "Navigation event");
        }
        let origin = agent.state();
        let mut ctx = agent.behavior_context();
        agent.machine_mut().tick(&mut ctx, delta_time);
        self.apply_commands(id, origin, ctx.into_commands())
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
