//! The combat agent.
//!
//! An [`Agent`] bundles identity, vitals, attack profile, its personal
//! decision template, the state machine of behaviors, and its navigation
//! and display collaborators. It does not know about other agents; every
//! cross-entity effect goes through the simulation context.

use skirmish_ai::{StateMachine, WeightedTable};
use skirmish_types::{AgentId, EntityRef, Position, TeamId};

use crate::behavior::{Behavior, BehaviorContext};
use crate::config::BehaviorConfig;
use crate::error::AgentError;
use crate::kinds::{StateKind, UnitKind};
use crate::meter::Meter;
use crate::navigation::Navigator;
use crate::profile::AttackProfile;
use crate::target::{Listener, Subscriptions};
use crate::vitals::Vitals;

/// The state every agent starts in.
pub const INITIAL_STATE: StateKind = StateKind::Traveling;

/// A combat agent.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    team: TeamId,
    kind: UnitKind,
    vitals: Vitals,
    profile: AttackProfile,
    template: WeightedTable<StateKind>,
    machine: StateMachine<StateKind, Behavior>,
    navigator: Box<dyn Navigator>,
    meter: Option<Box<dyn Meter>>,
}

impl Agent {
    /// Build an agent with default vitals, the stock profile for `kind`, and
    /// default behavior timings.
    ///
    /// Fails when `template` has no entries: such an agent could never
    /// decide anything.
    pub fn new(
        team: TeamId,
        kind: UnitKind,
        template: WeightedTable<StateKind>,
        navigator: Box<dyn Navigator>,
    ) -> Result<Self, AgentError> {
        if template.is_empty() {
            return Err(AgentError::EmptyTemplate);
        }
        Ok(Self {
            id: AgentId::new(),
            team,
            kind,
            vitals: Vitals::new(100.0, 100.0, 1.0),
            profile: AttackProfile::for_kind(kind),
            template,
            machine: build_machine(&BehaviorConfig::default()),
            navigator,
            meter: None,
        })
    }

    /// Replace the vitals.
    #[must_use]
    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = vitals;
        self
    }

    /// Replace the attack profile.
    #[must_use]
    pub fn with_profile(mut self, profile: AttackProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Rebuild every behavior from `config`.
    ///
    /// Only meaningful before the agent is deployed: targets and timers of
    /// the old behaviors are discarded.
    #[must_use]
    pub fn with_behaviors(mut self, config: &BehaviorConfig) -> Self {
        self.machine = build_machine(config);
        self
    }

    /// Attach a health display.
    #[must_use]
    pub fn with_meter(mut self, meter: Box<dyn Meter>) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Identity.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Team.
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Unit kind.
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Vitals (read-only; the simulation owns mutation so it can notify).
    pub const fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Vitals, mutably.
    pub const fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    /// Attack profile.
    pub const fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    /// Attack profile, mutably.
    pub const fn profile_mut(&mut self) -> &mut AttackProfile {
        &mut self.profile
    }

    /// The personal decision template.
    pub const fn template(&self) -> &WeightedTable<StateKind> {
        &self.template
    }

    /// The personal decision template, mutably.
    pub const fn template_mut(&mut self) -> &mut WeightedTable<StateKind> {
        &mut self.template
    }

    /// The state machine.
    pub const fn machine(&self) -> &StateMachine<StateKind, Behavior> {
        &self.machine
    }

    /// The state machine, mutably.
    pub const fn machine_mut(&mut self) -> &mut StateMachine<StateKind, Behavior> {
        &mut self.machine
    }

    /// Current state.
    pub const fn state(&self) -> StateKind {
        self.machine.current()
    }

    /// Whether the agent has been defeated.
    pub const fn is_disabled(&self) -> bool {
        matches!(self.machine.current(), StateKind::Disabled)
    }

    /// The active behavior's target.
    pub fn current_target(&self) -> Option<EntityRef> {
        self.machine.active().and_then(Behavior::target)
    }

    /// Current position, as reported by the navigator.
    pub fn position(&self) -> Position {
        self.navigator.position()
    }

    /// The navigation collaborator.
    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    /// The navigation collaborator, mutably.
    pub fn navigator_mut(&mut self) -> &mut dyn Navigator {
        self.navigator.as_mut()
    }

    /// Push `(health, max_health)` to the meter, if one is attached.
    pub fn push_meter(&mut self) {
        if let Some(meter) = self.meter.as_mut() {
            meter.set_meter(self.vitals.health(), self.vitals.max_health());
        }
    }

    /// Set where the traveling behavior heads; `None` means the rally point.
    pub fn set_travel_destination(&mut self, destination: Option<Position>) {
        if let Ok(traveling) = self.machine.state_mut(StateKind::Traveling)
            && let Some(payload) = traveling.as_traveling_mut()
        {
            payload.set_destination(destination);
        }
    }

    /// A fresh hook context for this agent.
    pub const fn behavior_context(&self) -> BehaviorContext {
        BehaviorContext::new(self.profile.attack_delay())
    }

    /// Clear every target slot, removing the matching registrations.
    pub fn release_targets(&mut self, subscriptions: &mut Subscriptions) -> Result<(), AgentError> {
        let id = self.id;
        for (state, behavior) in self.machine.iter_mut() {
            if behavior.target().is_some() {
                behavior.rebind_target(
                    None,
                    subscriptions,
                    Listener::Behavior { agent: id, state },
                )?;
            }
        }
        Ok(())
    }
}

fn build_machine(config: &BehaviorConfig) -> StateMachine<StateKind, Behavior> {
    StateMachine::from_fn(INITIAL_STATE, |kind| Behavior::for_state(kind, config))
}
