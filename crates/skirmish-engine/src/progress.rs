//! Tick callback that reports battle progress through tracing.
//!
//! Every tick is logged at debug level. Defeats, destroyed structures and
//! eliminated teams are logged at info level as they happen, and a short
//! status line is emitted every `report_every` ticks.

use skirmish_core::{Simulation, TickCallback, TickSummary};
use tracing::{debug, info};

/// Callback that logs the course of the battle.
#[derive(Debug, Clone, Copy)]
pub struct ProgressCallback {
    report_every: u64,
}

impl ProgressCallback {
    /// A callback emitting a status line every `report_every` ticks.
    /// Zero disables the status line.
    pub const fn new(report_every: u64) -> Self {
        Self { report_every }
    }

    const fn is_report_tick(&self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.report_every), Some(0))
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation) {
        debug!(
            tick = summary.tick,
            active_agents = summary.active_agents,
            events = summary.event_count,
            "Tick observed"
        );

        if !summary.defeated.is_empty() {
            info!(
                tick = summary.tick,
                defeated = summary.defeated.len(),
                "Units defeated"
            );
        }
        for structure in &summary.destroyed {
            info!(tick = summary.tick, structure = %structure, "Structure destroyed");
        }
        for team in &summary.teams_eliminated {
            info!(tick = summary.tick, team = %team, "Team lost its last structure");
        }

        if self.is_report_tick(summary.tick) {
            for roster in sim.rosters() {
                info!(
                    tick = summary.tick,
                    elapsed_seconds = summary.elapsed_seconds,
                    team = %roster.team(),
                    units = roster.total_units(),
                    structures = roster.structures().len(),
                    "Team status"
                );
            }
        }
    }
}
