//! Bounded fixed-step run loop.
//!
//! [`run_simulation`] drives commanders and ticks with a constant delta
//! until one of the termination conditions holds:
//!
//! - **Max ticks**: the tick budget is spent
//! - **Victory**: exactly one team still has structures
//! - **Annihilation**: every team has lost its structures
//!
//! Victory and annihilation are only checked with two or more rosters.
//!
//! The callback sees each tick's events through [`Simulation::events`].
//! Once it returns, the events are drained and the records of defeated
//! agents and destroyed structures are purged, so a long run holds only
//! the live world.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skirmish_types::TeamId;
use tracing::info;

use crate::commander::AutoCommander;
use crate::events::TickSummary;
use crate::simulation::{SimError, Simulation};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick or commander step failed.
    #[error("simulation error: {source}")]
    Sim {
        /// The underlying simulation error.
        #[from]
        source: SimError,
    },
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// The tick budget was spent.
    MaxTicksReached,
    /// Only one team still has structures.
    Victory {
        /// The surviving team.
        team: TeamId,
    },
    /// No team has structures left.
    Annihilation,
}

/// Result of the simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
}

/// Callback invoked after each tick completes.
pub trait TickCallback {
    /// Called after a tick completes successfully, before the tick's
    /// events are drained and defeated records purged.
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {}
}

/// Run the simulation until a termination condition is met.
///
/// Each step lets every commander think for `tick_seconds`, then ticks the
/// world by the same amount and reports the summary to `callback`.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick or a commander fails.
pub fn run_simulation(
    sim: &mut Simulation,
    commanders: &mut [AutoCommander],
    tick_seconds: f32,
    max_ticks: u64,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let started_at = Utc::now();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks,
        tick_seconds,
        teams = sim.rosters().len(),
        commanders = commanders.len(),
        "Simulation starting"
    );

    let end_reason = loop {
        if total_ticks >= max_ticks {
            break SimulationEndReason::MaxTicksReached;
        }

        for commander in commanders.iter_mut() {
            commander.think(sim, tick_seconds)?;
        }
        let summary = sim.tick(tick_seconds)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, sim);
        sim.drain_events();
        sim.purge_defeated();
        last_summary = Some(summary);

        if let Some(reason) = check_end(sim) {
            break reason;
        }
    };

    let result = SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        started_at,
        finished_at: Utc::now(),
    };
    log_simulation_end(&result);
    Ok(result)
}

/// Decide whether the structure war is over.
pub fn check_end(sim: &Simulation) -> Option<SimulationEndReason> {
    let rosters = sim.rosters();
    if rosters.len() < 2 {
        return None;
    }
    let mut standing = rosters
        .iter()
        .filter(|roster| !roster.has_lost_all_structures());
    match (standing.next(), standing.next()) {
        (None, _) => Some(SimulationEndReason::Annihilation),
        (Some(winner), None) => Some(SimulationEndReason::Victory {
            team: winner.team(),
        }),
        (Some(_), Some(_)) => None,
    }
}

/// Log the outcome of a finished run.
pub fn log_simulation_end(result: &SimulationResult) {
    let active_agents = result
        .final_summary
        .as_ref()
        .map_or(0, |summary| summary.active_agents);
    let wall_ms = (result.finished_at - result.started_at).num_milliseconds();
    match result.end_reason {
        SimulationEndReason::MaxTicksReached => info!(
            total_ticks = result.total_ticks,
            active_agents, wall_ms, "Simulation ended: max ticks reached"
        ),
        SimulationEndReason::Victory { team } => info!(
            team = %team,
            total_ticks = result.total_ticks,
            active_agents,
            wall_ms,
            "Simulation ended: victory"
        ),
        SimulationEndReason::Annihilation => info!(
            total_ticks = result.total_ticks,
            active_agents, wall_ms, "Simulation ended: annihilation"
        ),
    }
}

#[cfg(test)]
mod tests {
    use skirmish_agents::{Agent, LinearNavigator, StateKind, Structure, UnitKind};
    use skirmish_ai::WeightedTable;
    use skirmish_types::{AgentId, Position};

    use super::*;

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {
            self.0 += 1;
        }
    }

    #[test]
    fn stops_at_max_ticks() -> Result<(), RunnerError> {
        let mut sim = Simulation::new(9);
        sim.add_roster(TeamId(0), 1)?;
        let mut counter = Counter(0);
        let result = run_simulation(&mut sim, &mut [], 0.1, 5, &mut counter)?;
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(counter.0, 5);
        Ok(())
    }

    #[derive(Default)]
    struct EventWindow {
        largest: usize,
        total: usize,
    }

    impl TickCallback for EventWindow {
        fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation) {
            assert_eq!(sim.events().len(), summary.event_count);
            self.largest = self.largest.max(summary.event_count);
            self.total = self.total.saturating_add(summary.event_count);
        }
    }

    fn unit(
        sim: &mut Simulation,
        team: TeamId,
        at: Position,
        state: StateKind,
    ) -> Result<AgentId, SimError> {
        let agent = Agent::new(
            team,
            UnitKind::Melee,
            WeightedTable::from_weights([(state, 1.0)]),
            Box::new(LinearNavigator::new(at, 1.0)),
        )?;
        sim.deploy_agent(agent)
    }

    #[test]
    fn events_and_defeated_records_do_not_accumulate() -> Result<(), RunnerError> {
        let mut sim = Simulation::new(9);
        sim.add_roster(TeamId(0), 4)?;
        sim.add_roster(TeamId(1), 4)?;
        sim.register_structure(Structure::new(TeamId(0), Position::new(-40.0, 0.0, 0.0), 1.0, 10.0))?;
        sim.register_structure(Structure::new(TeamId(1), Position::new(40.0, 0.0, 0.0), 1.0, 10.0))?;
        let attacker = unit(&mut sim, TeamId(0), Position::ZERO, StateKind::AttackingUnit)?;
        let doomed = unit(&mut sim, TeamId(1), Position::new(1.0, 0.0, 0.0), StateKind::Traveling)?;
        let survivor = unit(&mut sim, TeamId(1), Position::new(2.0, 0.0, 0.0), StateKind::Traveling)?;
        sim.evaluate(attacker)?;
        sim.set_agent_health(doomed, 0.0)?;
        assert!(!sim.events().is_empty());
        sim.drain_events();

        let mut window = EventWindow::default();
        let result = run_simulation(&mut sim, &mut [], 0.1, 40, &mut window)?;

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert!(window.total > 0);
        assert!(window.largest < window.total);
        assert!(sim.events().is_empty());
        assert!(sim.agent(doomed).is_none());
        assert!(sim.agent(survivor).is_some_and(|a| a.vitals().health() < 100.0));
        Ok(())
    }

    #[test]
    fn last_team_with_structures_wins() -> Result<(), RunnerError> {
        let mut sim = Simulation::new(9);
        sim.add_roster(TeamId(0), 1)?;
        sim.add_roster(TeamId(1), 1)?;
        sim.register_structure(Structure::new(TeamId(0), Position::ZERO, 1.0, 10.0))?;
        let doomed = sim.register_structure(Structure::new(
            TeamId(1),
            Position::new(20.0, 0.0, 0.0),
            1.0,
            10.0,
        ))?;
        assert_eq!(check_end(&sim), None);

        sim.set_structure_health(doomed, 0.0)?;
        let result = run_simulation(&mut sim, &mut [], 0.1, 100, &mut NoOpCallback)?;
        assert_eq!(
            result.end_reason,
            SimulationEndReason::Victory { team: TeamId(0) }
        );
        assert_eq!(result.total_ticks, 1);
        assert!(sim.structure(doomed).is_none());
        Ok(())
    }

    #[test]
    fn no_standing_team_is_annihilation() -> Result<(), RunnerError> {
        let mut sim = Simulation::new(9);
        sim.add_roster(TeamId(0), 1)?;
        sim.add_roster(TeamId(1), 1)?;
        for team in [TeamId(0), TeamId(1)] {
            let id = sim.register_structure(Structure::new(team, Position::ZERO, 1.0, 5.0))?;
            sim.damage_structure(id, 5.0)?;
        }
        assert_eq!(check_end(&sim), Some(SimulationEndReason::Annihilation));
        Ok(())
    }
}
