//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `skirmish-config.yaml` at the
//! project root. Every section is optional; missing fields take the
//! defaults documented on each struct. Sections belonging to the engine
//! binary (such as `scenario`) are ignored here.

use std::path::Path;

use serde::Deserialize;
use skirmish_agents::{AttackProfile, BehaviorConfig, StateKind, UnitKind, UnitTemplate, VitalsConfig};
use skirmish_ai::WeightedTable;
use skirmish_types::Position;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (seed, step size, run length, rally point).
    #[serde(default)]
    pub world: WorldConfig,

    /// Starting vitals for built agents.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Per-state behavior timings.
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Attack profile per unit kind.
    #[serde(default)]
    pub units: UnitsConfig,

    /// The decision template every agent starts from.
    #[serde(default = "default_distribution")]
    pub distribution: Vec<DistributionEntry>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            vitals: VitalsConfig::default(),
            behavior: BehaviorConfig::default(),
            units: UnitsConfig::default(),
            distribution: default_distribution(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The configured decision template. Negative weights clamp to zero;
    /// a state listed twice keeps its last weight.
    pub fn template(&self) -> WeightedTable<StateKind> {
        WeightedTable::from_weights(
            self.distribution
                .iter()
                .map(|entry| (entry.state, entry.weight)),
        )
    }

    /// A unit blueprint for `kind` carrying this configuration's vitals,
    /// timings, profile, and template.
    pub fn unit_template(&self, kind: UnitKind) -> UnitTemplate {
        UnitTemplate {
            kind,
            vitals: self.vitals.clone(),
            profile: self.units.profile(kind),
            behavior: self.behavior.clone(),
            distribution: self.template(),
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Seed for every random draw (default: 42).
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fixed step handed to each tick, in seconds (default: 0.1).
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f32,

    /// Tick budget of a bounded run (default: 6000).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Where traveling agents without a destination head (default: origin).
    #[serde(default)]
    pub rally_point: Position,
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_seconds() -> f32 {
    0.1
}

const fn default_max_ticks() -> u64 {
    6000
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_seconds: default_tick_seconds(),
            max_ticks: default_max_ticks(),
            rally_point: Position::ZERO,
        }
    }
}

/// Attack profiles per unit kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitsConfig {
    /// Melee profile.
    #[serde(default = "melee_profile")]
    pub melee: AttackProfile,

    /// Ranged profile.
    #[serde(default = "ranged_profile")]
    pub ranged: AttackProfile,

    /// Jousting profile.
    #[serde(default = "jousting_profile")]
    pub jousting: AttackProfile,

    /// Area-of-effect profile.
    #[serde(default = "aoe_profile")]
    pub aoe: AttackProfile,
}

fn melee_profile() -> AttackProfile {
    AttackProfile::for_kind(UnitKind::Melee)
}

fn ranged_profile() -> AttackProfile {
    AttackProfile::for_kind(UnitKind::Ranged)
}

fn jousting_profile() -> AttackProfile {
    AttackProfile::for_kind(UnitKind::Jousting)
}

fn aoe_profile() -> AttackProfile {
    AttackProfile::for_kind(UnitKind::Aoe)
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            melee: melee_profile(),
            ranged: ranged_profile(),
            jousting: jousting_profile(),
            aoe: aoe_profile(),
        }
    }
}

impl UnitsConfig {
    /// The profile configured for `kind`.
    pub const fn profile(&self, kind: UnitKind) -> AttackProfile {
        match kind {
            UnitKind::Melee => self.melee,
            UnitKind::Ranged => self.ranged,
            UnitKind::Jousting => self.jousting,
            UnitKind::Aoe => self.aoe,
        }
    }
}

/// One `(state, weight)` entry of the decision template.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DistributionEntry {
    /// The state this entry selects.
    pub state: StateKind,
    /// Its base weight.
    pub weight: f32,
}

fn default_distribution() -> Vec<DistributionEntry> {
    [
        (StateKind::Traveling, 1.0),
        (StateKind::AttackingUnit, 4.0),
        (StateKind::AttackingStructure, 2.0),
        (StateKind::DefendingStructure, 1.0),
        (StateKind::Taunting, 0.5),
    ]
    .into_iter()
    .map(|(state, weight)| DistributionEntry { state, weight })
    .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    String::from("info")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimulationConfig::parse("{}");
        assert!(config.is_ok_and(|c| c == SimulationConfig::default()));
    }

    #[test]
    fn parse_overrides_selected_fields() {
        let yaml = r"
world:
  seed: 7
  tick_seconds: 0.05
distribution:
  - state: Traveling
    weight: 1.0
  - state: AttackingUnit
    weight: 3.0
units:
  ranged:
    range: 12.0
    attack_delay: 2.0
    attack_damage: 4.0
scenario:
  teams: []
";
        let parsed = SimulationConfig::parse(yaml);
        assert!(parsed.is_ok(), "{parsed:?}");
        let Ok(config) = parsed else {
            return;
        };
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.max_ticks, 6000);
        let template = config.template();
        assert!((template.probability_of(&StateKind::AttackingUnit) - 0.75).abs() < 1e-6);
        assert!((config.units.profile(UnitKind::Ranged).range() - 12.0).abs() < f32::EPSILON);
        assert_eq!(config.units.melee, AttackProfile::for_kind(UnitKind::Melee));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(matches!(
            SimulationConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn unit_template_uses_configured_profile() {
        let config = SimulationConfig::default();
        let blueprint = config.unit_template(UnitKind::Aoe);
        assert_eq!(blueprint.profile, AttackProfile::for_kind(UnitKind::Aoe));
        assert_eq!(blueprint.distribution.len(), config.distribution.len());
    }
}
