//! Starting battlefield for the engine binary.
//!
//! The `scenario` section of `skirmish-config.yaml` lists the teams taking
//! part, the structures each team starts with (optionally producing units),
//! and any units already on the field. When the section is missing, a
//! mirrored two-team layout is used.

use serde::Deserialize;
use skirmish_agents::{Factory, Instantiator, Structure, UnitKind};
use skirmish_core::config::SimulationConfig;
use skirmish_core::{AutoCommander, SimError, Simulation};
use skirmish_types::{Position, TeamId};
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// The teams and their starting assets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Participating teams, in roster order.
    #[serde(default = "default_teams")]
    pub teams: Vec<TeamSetup>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            teams: default_teams(),
        }
    }
}

/// One team: its cap, its commander pace, and its starting assets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamSetup {
    /// Team identity.
    pub team: TeamId,

    /// Unit cap enforced on factory production.
    #[serde(default = "default_max_units")]
    pub max_units: u32,

    /// Seconds between commander thoughts.
    #[serde(default = "default_thought_interval")]
    pub thought_interval: f32,

    /// Structures the team starts with.
    #[serde(default)]
    pub structures: Vec<StructureSetup>,

    /// Units already deployed at start.
    #[serde(default)]
    pub units: Vec<UnitSetup>,
}

/// A starting structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructureSetup {
    /// Where the structure stands.
    #[serde(default)]
    pub position: Position,

    /// Footprint radius added to attacker reach.
    #[serde(default = "default_damage_radius")]
    pub damage_radius: f32,

    /// Starting and maximum health.
    #[serde(default = "default_structure_health")]
    pub health: f32,

    /// Unit production, if the structure has any.
    #[serde(default)]
    pub factory: Option<FactorySetup>,
}

/// Unit production settings for a structure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FactorySetup {
    /// Inner radius of the spawn ring.
    #[serde(default = "default_inner_radius")]
    pub inner_radius: f32,

    /// Outer radius of the spawn ring.
    #[serde(default = "default_outer_radius")]
    pub outer_radius: f32,

    /// Seconds between spawns.
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,

    /// Kind of unit produced.
    #[serde(default = "default_unit_kind")]
    pub unit: UnitKind,
}

/// A unit present at start.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UnitSetup {
    /// Kind of unit.
    pub kind: UnitKind,

    /// Starting position.
    #[serde(default)]
    pub position: Position,
}

const fn default_max_units() -> u32 {
    20
}

const fn default_thought_interval() -> f32 {
    1.0
}

const fn default_damage_radius() -> f32 {
    2.0
}

const fn default_structure_health() -> f32 {
    500.0
}

const fn default_inner_radius() -> f32 {
    3.0
}

const fn default_outer_radius() -> f32 {
    6.0
}

const fn default_cooldown() -> f32 {
    2.0
}

const fn default_unit_kind() -> UnitKind {
    UnitKind::Melee
}

fn default_teams() -> Vec<TeamSetup> {
    [(TeamId(0), -30.0), (TeamId(1), 30.0)]
        .into_iter()
        .map(|(team, x)| TeamSetup {
            team,
            max_units: default_max_units(),
            thought_interval: default_thought_interval(),
            structures: vec![
                StructureSetup {
                    position: Position::new(x, 0.0, 0.0),
                    damage_radius: default_damage_radius(),
                    health: default_structure_health(),
                    factory: Some(FactorySetup {
                        inner_radius: default_inner_radius(),
                        outer_radius: default_outer_radius(),
                        cooldown: default_cooldown(),
                        unit: UnitKind::Melee,
                    }),
                },
                StructureSetup {
                    position: Position::new(x, 0.0, 12.0),
                    damage_radius: default_damage_radius(),
                    health: default_structure_health(),
                    factory: Some(FactorySetup {
                        inner_radius: default_inner_radius(),
                        outer_radius: default_outer_radius(),
                        cooldown: 4.0,
                        unit: UnitKind::Ranged,
                    }),
                },
            ],
            units: Vec::new(),
        })
        .collect()
}

// -----------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------

/// Read the `scenario` section out of a full configuration document.
///
/// A document without the section yields the default layout.
pub fn parse_scenario(yaml: &str) -> Result<ScenarioConfig, EngineError> {
    let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Scenario {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    raw.get("scenario").map_or_else(
        || Ok(ScenarioConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Scenario {
                message: format!("failed to parse scenario config: {e}"),
            })
        },
    )
}

// -----------------------------------------------------------------------
// Building
// -----------------------------------------------------------------------

/// Build the simulation and one commander per team.
///
/// Factories produce units from the configured template for their kind.
/// Starting units are deployed in listing order, after every structure of
/// every team is in place.
pub fn build_scenario(
    config: &SimulationConfig,
    scenario: &ScenarioConfig,
) -> Result<(Simulation, Vec<AutoCommander>), EngineError> {
    let mut sim = Simulation::from_config(config);
    let mut commanders = Vec::with_capacity(scenario.teams.len());

    for setup in &scenario.teams {
        sim.add_roster(setup.team, setup.max_units)?;
        for site in &setup.structures {
            let mut structure =
                Structure::new(setup.team, site.position, site.damage_radius, site.health);
            if let Some(factory) = site.factory {
                structure = structure.with_factory(Factory::new(
                    factory.inner_radius,
                    factory.outer_radius,
                    factory.cooldown,
                    Box::new(config.unit_template(factory.unit)),
                ));
            }
            sim.register_structure(structure)?;
        }
        commanders.push(AutoCommander::new(setup.team, setup.thought_interval));
    }

    for setup in &scenario.teams {
        for unit in &setup.units {
            let agent = config
                .unit_template(unit.kind)
                .instantiate(setup.team, unit.position)
                .map_err(SimError::from)?;
            sim.deploy_agent(agent)?;
        }
    }

    info!(
        teams = scenario.teams.len(),
        structures = sim.structures().count(),
        units = sim.active_agent_count(),
        "Scenario built"
    );
    Ok((sim, commanders))
}

#[cfg(test)]
mod tests {
    use skirmish_agents::StateKind;

    use super::*;

    #[test]
    fn missing_section_uses_mirrored_default() -> Result<(), EngineError> {
        let scenario = parse_scenario("world:\n  seed: 7\n")?;
        assert_eq!(scenario, ScenarioConfig::default());
        assert_eq!(scenario.teams.len(), 2);

        let (sim, commanders) = build_scenario(&SimulationConfig::default(), &scenario)?;
        assert_eq!(sim.rosters().len(), 2);
        assert_eq!(sim.structures().count(), 4);
        assert_eq!(sim.active_agent_count(), 0);
        assert_eq!(
            commanders.iter().map(AutoCommander::team).collect::<Vec<_>>(),
            vec![TeamId(0), TeamId(1)]
        );
        Ok(())
    }

    #[test]
    fn section_fields_take_defaults() -> Result<(), EngineError> {
        let yaml = "
scenario:
  teams:
    - team: 3
      max_units: 5
      structures:
        - position: { x: 1.0, z: 2.0 }
          factory:
            unit: Aoe
      units:
        - kind: Jousting
          position: { x: 4.0 }
";
        let scenario = parse_scenario(yaml)?;
        let team = scenario.teams.first().ok_or_else(|| EngineError::Scenario {
            message: "no team".to_owned(),
        })?;
        assert_eq!(team.team, TeamId(3));
        assert_eq!(team.max_units, 5);
        assert!((team.thought_interval - 1.0).abs() < f32::EPSILON);

        let site = team.structures.first().ok_or_else(|| EngineError::Scenario {
            message: "no structure".to_owned(),
        })?;
        assert_eq!(site.position, Position::new(1.0, 0.0, 2.0));
        assert_eq!(
            site.factory.map(|factory| factory.unit),
            Some(UnitKind::Aoe)
        );
        assert_eq!(
            team.units.first().map(|unit| unit.kind),
            Some(UnitKind::Jousting)
        );
        Ok(())
    }

    #[test]
    fn starting_units_are_deployed_traveling() -> Result<(), EngineError> {
        let yaml = "
scenario:
  teams:
    - team: 0
      structures:
        - position: { x: -10.0 }
      units:
        - kind: Melee
        - kind: Ranged
          position: { x: 2.0 }
    - team: 1
      structures:
        - position: { x: 10.0 }
";
        let scenario = parse_scenario(yaml)?;
        let (sim, commanders) = build_scenario(&SimulationConfig::default(), &scenario)?;
        assert_eq!(commanders.len(), 2);
        assert_eq!(sim.active_agent_count(), 2);
        assert!(sim.agents().all(|agent| agent.state() == StateKind::Traveling));
        assert_eq!(sim.roster(TeamId(0)).map(skirmish_agents::Roster::total_units), Some(2));
        Ok(())
    }

    #[test]
    fn duplicate_team_is_rejected() -> Result<(), EngineError> {
        let yaml = "
scenario:
  teams:
    - team: 1
    - team: 1
";
        let scenario = parse_scenario(yaml)?;
        let result = build_scenario(&SimulationConfig::default(), &scenario);
        assert!(matches!(
            result,
            Err(EngineError::Sim {
                source: SimError::DuplicateRoster(_)
            })
        ));
        Ok(())
    }

    #[test]
    fn shipped_config_runs() -> Result<(), Box<dyn std::error::Error>> {
        let yaml = include_str!("../../../skirmish-config.yaml");
        let config = SimulationConfig::parse(yaml)?;
        let scenario = parse_scenario(yaml)?;
        assert_eq!(scenario.teams.len(), 2);
        assert!(
            scenario
                .teams
                .iter()
                .flat_map(|team| &team.structures)
                .all(|site| site.factory.is_some())
        );

        let (mut sim, mut commanders) = build_scenario(&config, &scenario)?;
        let result = skirmish_core::run_simulation(
            &mut sim,
            &mut commanders,
            config.world.tick_seconds,
            200,
            &mut skirmish_core::NoOpCallback,
        )?;
        assert!(result.total_ticks <= 200);
        assert!(result.final_summary.is_some());
        assert!(sim.events().is_empty());
        Ok(())
    }

    #[test]
    fn malformed_section_is_a_scenario_error() {
        let result = parse_scenario("scenario:\n  teams: 12\n");
        assert!(matches!(result, Err(EngineError::Scenario { .. })));
    }
}
