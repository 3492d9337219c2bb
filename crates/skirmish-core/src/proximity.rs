//! Ascending-distance queries over rosters.
//!
//! Results are built by linear-scan sorted insertion: each candidate goes
//! before the first entry strictly farther away, so equal distances keep
//! enumeration order (roster registration order, rosters in creation
//! order). Distances are squared; no root is taken.

use skirmish_agents::Agent;
use skirmish_types::{AgentId, Position, StructureId, TeamId};

use crate::simulation::Simulation;

/// A query hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearby<T> {
    /// The entity.
    pub id: T,
    /// Where it stands.
    pub position: Position,
    /// Squared distance from the query point.
    pub distance_squared: f32,
}

/// Which rosters a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamFilter {
    /// Only the given team.
    Allies(TeamId),
    /// Every team except the given one.
    Enemies(TeamId),
}

impl TeamFilter {
    /// Whether `team` passes the filter.
    pub fn accepts(self, team: TeamId) -> bool {
        match self {
            Self::Allies(own) => team == own,
            Self::Enemies(own) => team != own,
        }
    }
}

/// Insert `item` before the first entry strictly farther away.
pub fn sorted_insert<T>(list: &mut Vec<Nearby<T>>, item: Nearby<T>) {
    let index = list
        .iter()
        .position(|existing| item.distance_squared < existing.distance_squared)
        .unwrap_or(list.len());
    list.insert(index, item);
}

/// Sort `(id, position)` candidates by squared distance from `origin`.
pub fn by_proximity<T, I>(origin: Position, candidates: I) -> Vec<Nearby<T>>
where
    I: IntoIterator<Item = (T, Position)>,
{
    let mut sorted = Vec::new();
    for (id, position) in candidates {
        sorted_insert(
            &mut sorted,
            Nearby {
                id,
                position,
                distance_squared: origin.distance_squared(position),
            },
        );
    }
    sorted
}

impl Simulation {
    /// Active agents of the rosters passing `filter`, nearest first.
    ///
    /// Disabled agents are skipped even during the instant between their
    /// defeat and their roster removal.
    pub fn agents_near(&self, origin: Position, filter: TeamFilter) -> Vec<Nearby<AgentId>> {
        let candidates = self
            .rosters
            .iter()
            .filter(|roster| filter.accepts(roster.team()))
            .flat_map(|roster| roster.agents())
            .filter_map(|id| self.agents.get(&id))
            .filter(|agent| !agent.is_disabled())
            .map(|agent: &Agent| (agent.id(), agent.position()));
        by_proximity(origin, candidates)
    }

    /// Standing structures of the rosters passing `filter`, nearest first.
    pub fn structures_near(
        &self,
        origin: Position,
        filter: TeamFilter,
    ) -> Vec<Nearby<StructureId>> {
        let candidates = self
            .rosters
            .iter()
            .filter(|roster| filter.accepts(roster.team()))
            .flat_map(|roster| roster.structures().iter().copied())
            .filter_map(|id| self.structures.get(&id))
            .filter(|structure| !structure.is_destroyed())
            .map(|structure| (structure.id(), structure.position()));
        by_proximity(origin, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_non_decreasing_and_complete() {
        let origin = Position::new(1.0, 0.0, 1.0);
        let points = [
            Position::new(9.0, 0.0, 0.0),
            Position::new(1.0, 0.0, 2.0),
            Position::new(-3.0, 0.0, 4.0),
            Position::new(0.0, 0.0, 0.0),
            Position::new(5.0, 0.0, 5.0),
        ];
        let sorted = by_proximity(origin, points.iter().copied().enumerate());
        assert_eq!(sorted.len(), points.len());
        assert!(
            sorted
                .windows(2)
                .all(|pair| match pair {
                    [a, b] => a.distance_squared <= b.distance_squared,
                    _ => true,
                })
        );
        assert_eq!(sorted.first().map(|n| n.id), Some(1));
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let origin = Position::ZERO;
        let candidates = [
            ('a', Position::new(2.0, 0.0, 0.0)),
            ('b', Position::new(0.0, 0.0, 1.0)),
            ('c', Position::new(0.0, 0.0, -2.0)),
            ('d', Position::new(-2.0, 0.0, 0.0)),
        ];
        let order: Vec<char> = by_proximity(origin, candidates).iter().map(|n| n.id).collect();
        assert_eq!(order, vec!['b', 'a', 'c', 'd']);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let sorted: Vec<Nearby<u8>> = by_proximity(Position::ZERO, Vec::new());
        assert!(sorted.is_empty());
    }

    #[test]
    fn team_filter_splits_allies_from_enemies() {
        assert!(TeamFilter::Allies(TeamId(1)).accepts(TeamId(1)));
        assert!(!TeamFilter::Allies(TeamId(1)).accepts(TeamId(2)));
        assert!(TeamFilter::Enemies(TeamId(1)).accepts(TeamId(2)));
        assert!(!TeamFilter::Enemies(TeamId(1)).accepts(TeamId(1)));
    }
}
