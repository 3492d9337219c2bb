//! Per-state behaviors and the commands they emit.
//!
//! Each [`StateKind`] has one behavior variant carrying its own timers and,
//! for targeted states, a weak [`TargetSlot`]. Hooks never touch other
//! entities directly. They push [`Command`]s into the [`BehaviorContext`];
//! the simulation applies them in order right after the hook returns.
//!
//! Commands emitted by a hook are dropped as soon as the emitting state is
//! no longer active (an `Evaluate` that switches state cancels the rest of
//! the frame's commands). Cleanup commands ([`Command::is_cleanup`]) always
//! run.

use skirmish_ai::{State, TransitionObserver};
use skirmish_types::{AgentId, EntityRef, Position, StructureId};

use crate::config::BehaviorConfig;
use crate::error::AgentError;
use crate::kinds::StateKind;
use crate::periodic::PeriodicTimer;
use crate::target::{Listener, Subscriptions, TargetSlot};

/// A side effect requested by a behavior hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Run the decision procedure for this agent.
    Evaluate,
    /// Abandon the current route.
    QuitRoute,
    /// Pause or resume navigation.
    SetPaused(bool),
    /// Hand the agent's speed factor to the navigator.
    MatchSpeedFactor,
    /// Set the navigator's arrival tolerance.
    SetDestinationTolerance(f32),
    /// Head for a destination, or the world rally point when `None`.
    Travel(Option<Position>),
    /// Head for the active behavior's current target.
    ChaseTarget,
    /// Head for a random point on a ring around the active behavior's
    /// structure target.
    SwarmTarget {
        /// Inner ring radius.
        min_radius: f32,
        /// Outer ring radius.
        max_radius: f32,
    },
    /// Run `radius` further away from the nearest allied structure.
    FleeAlliedStructures {
        /// Flee distance.
        radius: f32,
    },
    /// Strike the active behavior's current target if it is in reach.
    StrikeTarget,
    /// Force an enemy agent to attack this agent.
    Taunt(AgentId),
    /// Restore a previously taunted agent's decision coefficients.
    ReleaseTaunt(AgentId),
}

impl Command {
    /// Whether this command must run even after its emitting state ended.
    pub const fn is_cleanup(&self) -> bool {
        matches!(self, Self::ReleaseTaunt(_))
    }
}

/// Scratch space handed to behavior hooks.
#[derive(Debug, Clone, Default)]
pub struct BehaviorContext {
    attack_delay: f32,
    commands: Vec<Command>,
    transition: Option<(StateKind, StateKind)>,
}

impl BehaviorContext {
    /// A context for an agent striking every `attack_delay` seconds.
    pub const fn new(attack_delay: f32) -> Self {
        Self {
            attack_delay,
            commands: Vec::new(),
            transition: None,
        }
    }

    /// The agent's current delay between strikes.
    pub const fn attack_delay(&self) -> f32 {
        self.attack_delay
    }

    /// Queue a command.
    pub fn issue(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Commands queued so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The state change raised by the machine, if any.
    pub const fn transition(&self) -> Option<(StateKind, StateKind)> {
        self.transition
    }

    /// Consume the context, yielding its commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

impl TransitionObserver<StateKind> for BehaviorContext {
    fn state_changed(&mut self, from: StateKind, to: StateKind) {
        self.transition = Some((from, to));
    }
}

/// Defeated: stop moving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisabledBehavior;

/// Moving toward a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelingBehavior {
    destination: Option<Position>,
    destination_tolerance: f32,
    repath: PeriodicTimer,
    evaluate: PeriodicTimer,
}

impl TravelingBehavior {
    /// The configured destination; `None` means the world rally point.
    pub const fn destination(&self) -> Option<Position> {
        self.destination
    }

    /// Set where to travel. Takes effect on the next entry or repath.
    pub const fn set_destination(&mut self, destination: Option<Position>) {
        self.destination = destination;
    }
}

/// Chasing and striking an enemy agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackUnitBehavior {
    target: TargetSlot<AgentId>,
    repath: PeriodicTimer,
    evaluate: PeriodicTimer,
    attack: PeriodicTimer,
}

/// Approaching and striking an enemy structure.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackStructureBehavior {
    target: TargetSlot<StructureId>,
    evaluate: PeriodicTimer,
    attack: PeriodicTimer,
}

/// Swarming around an allied structure.
#[derive(Debug, Clone, PartialEq)]
pub struct DefendStructureBehavior {
    target: TargetSlot<StructureId>,
    repath: PeriodicTimer,
    evaluate: PeriodicTimer,
    min_radius: f32,
    max_radius: f32,
}

/// Taunting an enemy agent and fleeing.
#[derive(Debug, Clone, PartialEq)]
pub struct TauntBehavior {
    target: TargetSlot<AgentId>,
    repath: PeriodicTimer,
    evaluate: PeriodicTimer,
    redirection_radius: f32,
}

/// The behavior object of one state, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// See [`DisabledBehavior`].
    Disabled(DisabledBehavior),
    /// See [`TravelingBehavior`].
    Traveling(TravelingBehavior),
    /// See [`AttackUnitBehavior`].
    AttackingUnit(AttackUnitBehavior),
    /// See [`AttackStructureBehavior`].
    AttackingStructure(AttackStructureBehavior),
    /// See [`DefendStructureBehavior`].
    DefendingStructure(DefendStructureBehavior),
    /// See [`TauntBehavior`].
    Taunting(TauntBehavior),
}

impl Behavior {
    /// Build the behavior for `kind` from configuration.
    pub fn for_state(kind: StateKind, config: &BehaviorConfig) -> Self {
        match kind {
            StateKind::Disabled => Self::Disabled(DisabledBehavior),
            StateKind::Traveling => Self::Traveling(TravelingBehavior {
                destination: None,
                destination_tolerance: config.traveling.destination_tolerance.max(0.0),
                repath: PeriodicTimer::new(config.traveling.repath_interval),
                evaluate: PeriodicTimer::new(config.traveling.evaluate_interval),
            }),
            StateKind::AttackingUnit => Self::AttackingUnit(AttackUnitBehavior {
                target: TargetSlot::empty(),
                repath: PeriodicTimer::new(config.attacking_unit.repath_interval),
                evaluate: PeriodicTimer::new(config.attacking_unit.evaluate_interval),
                attack: PeriodicTimer::new(0.0),
            }),
            StateKind::AttackingStructure => Self::AttackingStructure(AttackStructureBehavior {
                target: TargetSlot::empty(),
                evaluate: PeriodicTimer::new(config.attacking_structure.evaluate_interval),
                attack: PeriodicTimer::new(0.0),
            }),
            StateKind::DefendingStructure => {
                let min = config.defending.swarm_min_radius.max(0.0);
                Self::DefendingStructure(DefendStructureBehavior {
                    target: TargetSlot::empty(),
                    repath: PeriodicTimer::new(config.defending.repath_interval),
                    evaluate: PeriodicTimer::new(config.defending.evaluate_interval),
                    min_radius: min,
                    max_radius: config.defending.swarm_max_radius.max(min),
                })
            }
            StateKind::Taunting => Self::Taunting(TauntBehavior {
                target: TargetSlot::empty(),
                repath: PeriodicTimer::new(config.taunting.repath_interval),
                evaluate: PeriodicTimer::new(config.taunting.evaluate_interval),
                redirection_radius: config.taunting.redirection_radius.max(0.0),
            }),
        }
    }

    /// The state this behavior implements.
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Disabled(_) => StateKind::Disabled,
            Self::Traveling(_) => StateKind::Traveling,
            Self::AttackingUnit(_) => StateKind::AttackingUnit,
            Self::AttackingStructure(_) => StateKind::AttackingStructure,
            Self::DefendingStructure(_) => StateKind::DefendingStructure,
            Self::Taunting(_) => StateKind::Taunting,
        }
    }

    /// The held target, `None` for untargeted states or an empty slot.
    pub fn target(&self) -> Option<EntityRef> {
        match self {
            Self::AttackingUnit(b) => b.target.get().map(EntityRef::Agent),
            Self::Taunting(b) => b.target.get().map(EntityRef::Agent),
            Self::AttackingStructure(b) => b.target.get().map(EntityRef::Structure),
            Self::DefendingStructure(b) => b.target.get().map(EntityRef::Structure),
            Self::Disabled(_) | Self::Traveling(_) => None,
        }
    }

    /// Point this behavior at `target` (or clear it with `None`), moving
    /// `listener`'s registration in `subscriptions` along.
    ///
    /// Fails when the state holds no target or the target is of the wrong
    /// entity kind.
    pub fn rebind_target(
        &mut self,
        target: Option<EntityRef>,
        subscriptions: &mut Subscriptions,
        listener: Listener,
    ) -> Result<bool, AgentError> {
        let state = self.kind();
        let mismatch = |target: EntityRef| AgentError::TargetMismatch { state, target };
        match self {
            Self::AttackingUnit(AttackUnitBehavior { target: slot, .. })
            | Self::Taunting(TauntBehavior { target: slot, .. }) => {
                let next = match target {
                    Some(entity) => Some(entity.as_agent().ok_or_else(|| mismatch(entity))?),
                    None => None,
                };
                Ok(slot.rebind(next, subscriptions, listener))
            }
            Self::AttackingStructure(AttackStructureBehavior { target: slot, .. })
            | Self::DefendingStructure(DefendStructureBehavior { target: slot, .. }) => {
                let next = match target {
                    Some(entity) => Some(entity.as_structure().ok_or_else(|| mismatch(entity))?),
                    None => None,
                };
                Ok(slot.rebind(next, subscriptions, listener))
            }
            Self::Disabled(_) | Self::Traveling(_) => match target {
                Some(entity) => Err(mismatch(entity)),
                None => Ok(false),
            },
        }
    }

    /// Clear the held target if it is `lost`. The registration has already
    /// been removed by whoever delivered the loss.
    pub fn forget_target(&mut self, lost: EntityRef) -> bool {
        match (self, lost) {
            (Self::AttackingUnit(b), EntityRef::Agent(id)) => b.target.forget(id),
            (Self::Taunting(b), EntityRef::Agent(id)) => b.target.forget(id),
            (Self::AttackingStructure(b), EntityRef::Structure(id)) => b.target.forget(id),
            (Self::DefendingStructure(b), EntityRef::Structure(id)) => b.target.forget(id),
            _ => false,
        }
    }

    /// The traveling payload, if this is the traveling behavior.
    pub const fn as_traveling_mut(&mut self) -> Option<&mut TravelingBehavior> {
        match self {
            Self::Traveling(b) => Some(b),
            _ => None,
        }
    }
}

impl State<BehaviorContext> for Behavior {
    fn entered(&mut self, ctx: &mut BehaviorContext) {
        match self {
            Self::Disabled(_) => ctx.issue(Command::QuitRoute),
            Self::Traveling(b) => {
                b.evaluate.reset();
                ctx.issue(Command::MatchSpeedFactor);
                ctx.issue(Command::SetPaused(false));
                ctx.issue(Command::SetDestinationTolerance(b.destination_tolerance));
                ctx.issue(Command::Travel(b.destination));
            }
            Self::AttackingUnit(b) => {
                b.evaluate.reset();
                ctx.issue(Command::SetDestinationTolerance(0.0));
                if b.target.get().is_some() {
                    ctx.issue(Command::ChaseTarget);
                }
            }
            Self::AttackingStructure(b) => {
                b.evaluate.reset();
                ctx.issue(Command::SetDestinationTolerance(0.0));
                if b.target.get().is_some() {
                    ctx.issue(Command::ChaseTarget);
                }
            }
            Self::DefendingStructure(b) => {
                b.evaluate.reset();
                ctx.issue(Command::SetDestinationTolerance(0.0));
                if b.target.get().is_some() {
                    ctx.issue(Command::SwarmTarget {
                        min_radius: b.min_radius,
                        max_radius: b.max_radius,
                    });
                }
            }
            Self::Taunting(b) => {
                b.evaluate.reset();
                if let Some(victim) = b.target.get() {
                    ctx.issue(Command::Taunt(victim));
                }
                ctx.issue(Command::FleeAlliedStructures {
                    radius: b.redirection_radius,
                });
            }
        }
    }

    fn exited(&mut self, ctx: &mut BehaviorContext) {
        if let Self::Taunting(b) = self
            && let Some(victim) = b.target.get()
        {
            ctx.issue(Command::ReleaseTaunt(victim));
        }
    }

    fn tick(&mut self, ctx: &mut BehaviorContext, delta_time: f32) {
        match self {
            Self::Disabled(_) => {}
            Self::Traveling(b) => {
                if b.repath.advance(delta_time) {
                    ctx.issue(Command::Travel(b.destination));
                }
                if b.evaluate.advance(delta_time) {
                    ctx.issue(Command::Evaluate);
                }
            }
            Self::AttackingUnit(b) => {
                if b.evaluate.advance(delta_time) {
                    ctx.issue(Command::Evaluate);
                }
                if b.target.get().is_none() {
                    return;
                }
                if b.repath.advance_resetting(delta_time) {
                    ctx.issue(Command::ChaseTarget);
                }
                b.attack.set_interval(ctx.attack_delay());
                if b.attack.advance(delta_time) {
                    ctx.issue(Command::StrikeTarget);
                }
            }
            Self::AttackingStructure(b) => {
                if b.evaluate.advance(delta_time) {
                    ctx.issue(Command::Evaluate);
                }
                if b.target.get().is_none() {
                    return;
                }
                b.attack.set_interval(ctx.attack_delay());
                if b.attack.advance(delta_time) {
                    ctx.issue(Command::StrikeTarget);
                }
            }
            Self::DefendingStructure(b) => {
                if b.evaluate.advance(delta_time) {
                    ctx.issue(Command::Evaluate);
                }
                if b.target.get().is_some() && b.repath.advance_resetting(delta_time) {
                    ctx.issue(Command::SwarmTarget {
                        min_radius: b.min_radius,
                        max_radius: b.max_radius,
                    });
                }
            }
            Self::Taunting(b) => {
                if b.evaluate.advance(delta_time) {
                    ctx.issue(Command::Evaluate);
                }
                if b.repath.advance_resetting(delta_time) {
                    ctx.issue(Command::FleeAlliedStructures {
                        radius: b.redirection_radius,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use skirmish_types::TeamId;

    use super::*;

    fn build(kind: StateKind) -> Behavior {
        Behavior::for_state(kind, &BehaviorConfig::default())
    }

    fn listener(agent: AgentId, state: StateKind) -> Listener {
        Listener::Behavior { agent, state }
    }

    #[test]
    fn every_state_builds_its_own_variant() {
        for &kind in <StateKind as skirmish_ai::StateKey>::ALL {
            assert_eq!(build(kind).kind(), kind);
        }
    }

    #[test]
    fn disabled_entry_quits_route() {
        let mut ctx = BehaviorContext::new(1.0);
        build(StateKind::Disabled).entered(&mut ctx);
        assert_eq!(ctx.commands(), &[Command::QuitRoute]);
    }

    #[test]
    fn traveling_entry_resumes_and_heads_out() {
        let mut ctx = BehaviorContext::new(1.0);
        let mut traveling = build(StateKind::Traveling);
        let destination = Position::new(4.0, 0.0, 4.0);
        if let Some(payload) = traveling.as_traveling_mut() {
            payload.set_destination(Some(destination));
        }
        traveling.entered(&mut ctx);
        assert_eq!(
            ctx.commands(),
            &[
                Command::MatchSpeedFactor,
                Command::SetPaused(false),
                Command::SetDestinationTolerance(1.0),
                Command::Travel(Some(destination)),
            ]
        );
    }

    #[test]
    fn attack_unit_strikes_on_its_delay() {
        let mut subs = Subscriptions::new();
        let me = AgentId::new();
        let mut attack = build(StateKind::AttackingUnit);
        let bound = attack.rebind_target(
            Some(EntityRef::Agent(AgentId::new())),
            &mut subs,
            listener(me, StateKind::AttackingUnit),
        );
        assert!(matches!(bound, Ok(true)));

        let mut ctx = BehaviorContext::new(0.5);
        attack.tick(&mut ctx, 0.3);
        assert!(!ctx.commands().contains(&Command::StrikeTarget));
        attack.tick(&mut ctx, 0.3);
        assert!(ctx.commands().contains(&Command::StrikeTarget));
    }

    #[test]
    fn untargeted_attack_only_evaluates() {
        let mut attack = build(StateKind::AttackingUnit);
        let mut ctx = BehaviorContext::new(0.1);
        attack.tick(&mut ctx, 1.5);
        assert_eq!(ctx.commands(), &[Command::Evaluate]);
    }

    #[test]
    fn structure_state_rejects_agent_targets() {
        let mut subs = Subscriptions::new();
        let mut defend = build(StateKind::DefendingStructure);
        let result = defend.rebind_target(
            Some(EntityRef::Agent(AgentId::new())),
            &mut subs,
            listener(AgentId::new(), StateKind::DefendingStructure),
        );
        assert!(matches!(result, Err(AgentError::TargetMismatch { .. })));
        assert!(subs.is_empty());
    }

    #[test]
    fn taunting_exit_releases_its_victim() {
        let mut subs = Subscriptions::new();
        let victim = AgentId::new();
        let mut taunt = build(StateKind::Taunting);
        let _ = taunt.rebind_target(
            Some(EntityRef::Agent(victim)),
            &mut subs,
            listener(AgentId::new(), StateKind::Taunting),
        );

        let mut ctx = BehaviorContext::new(1.0);
        taunt.entered(&mut ctx);
        taunt.exited(&mut ctx);
        assert_eq!(ctx.commands().first(), Some(&Command::Taunt(victim)));
        assert_eq!(ctx.commands().last(), Some(&Command::ReleaseTaunt(victim)));
        assert!(Command::ReleaseTaunt(victim).is_cleanup());
    }

    #[test]
    fn forget_only_clears_matching_target() {
        let mut subs = Subscriptions::new();
        let structure = StructureId::new();
        let mut siege = build(StateKind::AttackingStructure);
        let _ = siege.rebind_target(
            Some(EntityRef::Structure(structure)),
            &mut subs,
            Listener::Roster(TeamId(0)),
        );
        assert!(!siege.forget_target(EntityRef::Agent(AgentId::new())));
        assert!(siege.forget_target(EntityRef::Structure(structure)));
        assert_eq!(siege.target(), None);
    }
}
