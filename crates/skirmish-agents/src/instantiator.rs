//! Unit construction for factories.

use core::fmt;

use skirmish_ai::WeightedTable;
use skirmish_types::{Position, TeamId};

use crate::agent::Agent;
use crate::config::{BehaviorConfig, VitalsConfig};
use crate::error::AgentError;
use crate::kinds::{StateKind, UnitKind};
use crate::navigation::LinearNavigator;
use crate::profile::AttackProfile;
use crate::vitals::Vitals;

/// Builds new agents on demand.
pub trait Instantiator: fmt::Debug {
    /// Build an agent of `team` standing at `position`.
    fn instantiate(&mut self, team: TeamId, position: Position) -> Result<Agent, AgentError>;
}

/// Blueprint producing identical agents with straight-line navigators.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTemplate {
    /// Unit kind of every produced agent.
    pub kind: UnitKind,
    /// Starting vitals.
    pub vitals: VitalsConfig,
    /// Attack profile.
    pub profile: AttackProfile,
    /// Behavior timings.
    pub behavior: BehaviorConfig,
    /// Decision template copied into every agent.
    pub distribution: WeightedTable<StateKind>,
}

impl UnitTemplate {
    /// A blueprint with the stock profile for `kind` and default vitals and
    /// timings.
    pub fn new(kind: UnitKind, distribution: WeightedTable<StateKind>) -> Self {
        Self {
            kind,
            vitals: VitalsConfig::default(),
            profile: AttackProfile::for_kind(kind),
            behavior: BehaviorConfig::default(),
            distribution,
        }
    }
}

impl Instantiator for UnitTemplate {
    fn instantiate(&mut self, team: TeamId, position: Position) -> Result<Agent, AgentError> {
        let navigator = LinearNavigator::new(position, self.vitals.base_speed);
        let agent = Agent::new(team, self.kind, self.distribution.clone(), Box::new(navigator))?
            .with_vitals(Vitals::from_config(&self.vitals))
            .with_profile(self.profile)
            .with_behaviors(&self.behavior);
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produced_agents_are_independent() {
        let mut blueprint = UnitTemplate::new(
            UnitKind::Jousting,
            WeightedTable::from_weights([(StateKind::AttackingUnit, 1.0)]),
        );
        let first = blueprint.instantiate(TeamId(2), Position::new(1.0, 0.0, 1.0));
        let second = blueprint.instantiate(TeamId(2), Position::ZERO);
        assert!(first.is_ok() && second.is_ok());
        if let (Ok(mut first), Ok(second)) = (first, second) {
            assert_ne!(first.id(), second.id());
            first.template_mut().mask(&StateKind::AttackingUnit);
            assert_eq!(second.template().coefficient_of(&StateKind::AttackingUnit), Some(1.0));
            assert_eq!(first.kind(), UnitKind::Jousting);
            assert_eq!(first.position(), Position::new(1.0, 0.0, 1.0));
        }
    }

    #[test]
    fn empty_distribution_fails_to_instantiate() {
        let mut blueprint = UnitTemplate::new(UnitKind::Melee, WeightedTable::new());
        assert!(matches!(
            blueprint.instantiate(TeamId(0), Position::ZERO),
            Err(AgentError::EmptyTemplate)
        ));
    }
}
