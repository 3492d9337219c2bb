//! State and unit kind enumerations.

use serde::{Deserialize, Serialize};
use skirmish_ai::StateKey;

/// The closed set of agent states.
///
/// `Disabled` is terminal: once entered, an agent never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Defeated. Navigation stopped, no further decisions.
    Disabled,
    /// Moving toward a destination (or the rally point).
    Traveling,
    /// Chasing and striking an enemy agent.
    AttackingUnit,
    /// Approaching and striking an enemy structure.
    AttackingStructure,
    /// Swarming around an allied structure.
    DefendingStructure,
    /// Drawing an enemy agent's attention and running away.
    Taunting,
}

/// Which entity kind a targeted state binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// An enemy agent.
    EnemyAgent,
    /// An enemy structure.
    EnemyStructure,
    /// An allied structure.
    AlliedStructure,
}

impl StateKind {
    /// The kind of target this state needs bound before it is entered,
    /// `None` for untargeted states.
    pub const fn target_kind(self) -> Option<TargetKind> {
        match self {
            Self::AttackingUnit | Self::Taunting => Some(TargetKind::EnemyAgent),
            Self::AttackingStructure => Some(TargetKind::EnemyStructure),
            Self::DefendingStructure => Some(TargetKind::AlliedStructure),
            Self::Disabled | Self::Traveling => None,
        }
    }

    /// Whether leaving this state is forbidden.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disabled)
    }
}

impl StateKey for StateKind {
    const ALL: &'static [Self] = &[
        Self::Disabled,
        Self::Traveling,
        Self::AttackingUnit,
        Self::AttackingStructure,
        Self::DefendingStructure,
        Self::Taunting,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// The flavor of combat unit. Selects the default attack profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Close-range striker.
    Melee,
    /// Long-range shooter.
    Ranged,
    /// Charging lancer with a medium reach.
    Jousting,
    /// Area-of-effect attacker; strikes splash onto nearby enemies.
    Aoe,
}

impl UnitKind {
    /// Every unit kind.
    pub const ALL: [Self; 4] = [Self::Melee, Self::Ranged, Self::Jousting, Self::Aoe];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_table_indices_match_all() {
        for (position, state) in StateKind::ALL.iter().enumerate() {
            assert_eq!(state.index(), position);
        }
    }

    #[test]
    fn only_disabled_is_terminal() {
        let terminal: Vec<_> = StateKind::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![&StateKind::Disabled]);
    }

    #[test]
    fn targeted_states_name_their_pool() {
        assert_eq!(
            StateKind::Taunting.target_kind(),
            Some(TargetKind::EnemyAgent)
        );
        assert_eq!(
            StateKind::DefendingStructure.target_kind(),
            Some(TargetKind::AlliedStructure)
        );
        assert_eq!(StateKind::Traveling.target_kind(), None);
    }
}
