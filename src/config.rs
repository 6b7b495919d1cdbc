//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::fleet::Vehicle;
use crate::mdp::reward::{PriceBand, PriceSchedule, RewardModel};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Transmission network parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Vehicle fleet parameters.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Electricity price parameters.
    #[serde(default)]
    pub prices: PricesConfig,
    /// Solver parameters.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Reward shaping parameters.
    #[serde(default)]
    pub reward: RewardConfig,
}

/// Transmission network parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Path to the line-list topology file.
    pub topology: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            topology: "grids/grid_1.txt".to_string(),
        }
    }
}

/// Vehicle fleet parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// One entry per vehicle, in canonical fleet order.
    pub vehicles: Vec<VehicleConfig>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            vehicles: vec![
                VehicleConfig {
                    charge_steps: 3,
                    battery_max: 2,
                    node: 2,
                    ..VehicleConfig::default()
                },
                VehicleConfig::default(),
            ],
        }
    }
}

/// Parameters for a single vehicle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleConfig {
    /// Number of discrete charge levels, inclusive of level 0 (must be > 0).
    pub charge_steps: usize,
    /// Highest reachable charge level (must equal `charge_steps - 1`).
    pub battery_max: usize,
    /// Charge-rate multiplier applied to the unit power draw (must be > 0).
    pub charge_rate: f64,
    /// Grid node the vehicle charges at.
    pub node: usize,
    /// Charge level the vehicle arrives with.
    pub initial_level: usize,
    /// Departure deadline in timesteps.
    pub deadline: usize,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            charge_steps: 4,
            battery_max: 3,
            charge_rate: 1.0,
            node: 1,
            initial_level: 0,
            deadline: 23,
        }
    }
}

/// Electricity price parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricesConfig {
    /// Ordered bands; each covers timesteps strictly below `until`.
    pub bands: Vec<PriceBandConfig>,
    /// Price for timesteps past the last band.
    pub tail: f64,
    /// Number of discrete price levels in the transition model (must be > 0).
    pub levels: usize,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            bands: vec![
                PriceBandConfig {
                    until: 3,
                    price: 70.0,
                },
                PriceBandConfig {
                    until: 7,
                    price: 30.0,
                },
            ],
            tail: 90.0,
            levels: 5,
        }
    }
}

/// One constant-price band.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceBandConfig {
    /// First timestep the band no longer covers.
    pub until: usize,
    /// Price during the band.
    pub price: f64,
}

/// Solver parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Number of decision epochs (must be > 0).
    pub horizon: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { horizon: 12 }
    }
}

/// Reward shaping parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Extra reward entries keyed by (state, action).
    pub bonus: Vec<BonusConfig>,
}

/// One bonus reward entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BonusConfig {
    /// State index the bonus applies to.
    pub state: usize,
    /// Action index the bonus applies to.
    pub action: usize,
    /// Bonus value.
    pub value: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"solver.horizon"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: two vehicles on separate nodes of the
    /// bundled three-node grid.
    pub fn baseline() -> Self {
        Self {
            grid: GridConfig::default(),
            fleet: FleetConfig::default(),
            prices: PricesConfig::default(),
            solver: SolverConfig::default(),
            reward: RewardConfig::default(),
        }
    }

    /// Returns the congested preset: the whole fleet charges at one node,
    /// so line limits rule out simultaneous charging.
    pub fn congested() -> Self {
        Self {
            fleet: FleetConfig {
                vehicles: vec![
                    VehicleConfig {
                        charge_steps: 3,
                        battery_max: 2,
                        node: 2,
                        ..VehicleConfig::default()
                    },
                    VehicleConfig {
                        node: 2,
                        ..VehicleConfig::default()
                    },
                ],
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "congested"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "congested" => Ok(Self::congested()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Node references
    /// are checked against the topology later, when the fleet is built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.grid.topology.is_empty() {
            errors.push(ConfigError {
                field: "grid.topology".into(),
                message: "must not be empty".into(),
            });
        }

        if self.fleet.vehicles.is_empty() {
            errors.push(ConfigError {
                field: "fleet.vehicles".into(),
                message: "must contain at least one vehicle".into(),
            });
        }
        for (i, v) in self.fleet.vehicles.iter().enumerate() {
            if v.charge_steps == 0 {
                errors.push(ConfigError {
                    field: format!("fleet.vehicles[{i}].charge_steps"),
                    message: "must be > 0".into(),
                });
            } else if v.battery_max != v.charge_steps - 1 {
                errors.push(ConfigError {
                    field: format!("fleet.vehicles[{i}].battery_max"),
                    message: "must equal charge_steps - 1".into(),
                });
            }
            if !(v.charge_rate.is_finite() && v.charge_rate > 0.0) {
                errors.push(ConfigError {
                    field: format!("fleet.vehicles[{i}].charge_rate"),
                    message: "must be > 0".into(),
                });
            }
            if v.charge_steps > 0 && v.initial_level > v.battery_max {
                errors.push(ConfigError {
                    field: format!("fleet.vehicles[{i}].initial_level"),
                    message: "must be <= battery_max".into(),
                });
            }
        }

        let mut prev_until = 0;
        for (i, band) in self.prices.bands.iter().enumerate() {
            if band.until <= prev_until {
                errors.push(ConfigError {
                    field: format!("prices.bands[{i}].until"),
                    message: "must be increasing and > 0".into(),
                });
            }
            if !(band.price.is_finite() && band.price >= 0.0) {
                errors.push(ConfigError {
                    field: format!("prices.bands[{i}].price"),
                    message: "must be >= 0".into(),
                });
            }
            prev_until = band.until;
        }
        if !(self.prices.tail.is_finite() && self.prices.tail >= 0.0) {
            errors.push(ConfigError {
                field: "prices.tail".into(),
                message: "must be >= 0".into(),
            });
        }
        if self.prices.levels == 0 {
            errors.push(ConfigError {
                field: "prices.levels".into(),
                message: "must be > 0".into(),
            });
        }

        if self.solver.horizon == 0 {
            errors.push(ConfigError {
                field: "solver.horizon".into(),
                message: "must be > 0".into(),
            });
        }

        // Bonus indices are range-checked against the configured fleet when
        // the space sizes are themselves computable.
        let n_states = self
            .fleet
            .vehicles
            .iter()
            .try_fold(1usize, |acc, v| acc.checked_mul(v.charge_steps));
        let n_actions = u32::try_from(self.fleet.vehicles.len())
            .ok()
            .and_then(|n| 1usize.checked_shl(n));
        for (i, b) in self.reward.bonus.iter().enumerate() {
            if let Some(n) = n_states
                && b.state >= n
            {
                errors.push(ConfigError {
                    field: format!("reward.bonus[{i}].state"),
                    message: format!("must be < the state-space size {n}"),
                });
            }
            if let Some(n) = n_actions
                && b.action >= n
            {
                errors.push(ConfigError {
                    field: format!("reward.bonus[{i}].action"),
                    message: format!("must be < the action-space size {n}"),
                });
            }
            if !b.value.is_finite() {
                errors.push(ConfigError {
                    field: format!("reward.bonus[{i}].value"),
                    message: "must be finite".into(),
                });
            }
        }

        errors
    }

    /// Builds the domain vehicles from the fleet section.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.fleet
            .vehicles
            .iter()
            .map(VehicleConfig::to_vehicle)
            .collect()
    }

    /// Builds the price schedule from the prices section.
    pub fn price_schedule(&self) -> PriceSchedule {
        PriceSchedule {
            bands: self
                .prices
                .bands
                .iter()
                .map(|b| PriceBand {
                    until: b.until,
                    price: b.price,
                })
                .collect(),
            tail: self.prices.tail,
        }
    }

    /// Builds the reward model, applying any configured bonus entries.
    pub fn reward_model(&self) -> RewardModel {
        let mut model = RewardModel::new(self.price_schedule(), self.prices.levels);
        for b in &self.reward.bonus {
            model.set_bonus(b.state, b.action, b.value);
        }
        model
    }
}

impl VehicleConfig {
    /// Converts to the domain vehicle record.
    pub fn to_vehicle(&self) -> Vehicle {
        Vehicle {
            charge_steps: self.charge_steps,
            battery_max: self.battery_max,
            charge_rate: self.charge_rate,
            node: self.node,
            initial_level: self.initial_level,
            deadline: self.deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_baseline() {
        let cfg = ScenarioConfig::from_preset("baseline");
        assert!(cfg.is_ok());
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[grid]
topology = "grids/grid_1.txt"

[[fleet.vehicles]]
charge_steps = 3
battery_max = 2
charge_rate = 1.0
node = 2
initial_level = 0
deadline = 23

[[fleet.vehicles]]
charge_steps = 4
battery_max = 3
charge_rate = 0.5
node = 1
initial_level = 1
deadline = 23

[prices]
tail = 95.0
levels = 7

[[prices.bands]]
until = 4
price = 60.0

[[prices.bands]]
until = 9
price = 25.0

[solver]
horizon = 10

[[reward.bonus]]
state = 4
action = 3
value = 100.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.fleet.vehicles.len()), Some(2));
        assert_eq!(cfg.as_ref().map(|c| c.solver.horizon), Some(10));
        assert_eq!(cfg.as_ref().map(|c| c.prices.levels), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.reward.bonus.len()), Some(1));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[solver]
horizon = 12
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_empty_fleet() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.vehicles.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.vehicles"));
    }

    #[test]
    fn validation_catches_level_cap_mismatch() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.vehicles[1].battery_max = 7;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fleet.vehicles[1].battery_max")
        );
    }

    #[test]
    fn validation_catches_nonpositive_rate() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.vehicles[0].charge_rate = 0.0;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "fleet.vehicles[0].charge_rate")
        );
    }

    #[test]
    fn validation_catches_zero_horizon() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.solver.horizon = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "solver.horizon"));
    }

    #[test]
    fn validation_catches_band_order() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.prices.bands[1].until = 2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "prices.bands[1].until"));
    }

    #[test]
    fn validation_catches_zero_levels() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.prices.levels = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "prices.levels"));
    }

    #[test]
    fn validation_catches_bonus_out_of_range() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.reward.bonus.push(BonusConfig {
            state: 12,
            action: 0,
            value: 100.0,
        });
        cfg.reward.bonus.push(BonusConfig {
            state: 0,
            action: 4,
            value: 100.0,
        });
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "reward.bonus[0].state"));
        assert!(errors.iter().any(|e| e.field == "reward.bonus[1].action"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn congested_colocates_fleet() {
        let cfg = ScenarioConfig::congested();
        assert!(cfg.fleet.vehicles.iter().all(|v| v.node == 2));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[solver]
horizon = 6
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        // horizon overridden
        assert_eq!(cfg.as_ref().map(|c| c.solver.horizon), Some(6));
        // fleet kept default
        assert_eq!(cfg.as_ref().map(|c| c.fleet.vehicles.len()), Some(2));
        // prices kept default
        assert_eq!(cfg.as_ref().map(|c| c.prices.tail), Some(90.0));
    }

    #[test]
    fn reward_model_applies_bonus_entries() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.reward.bonus.push(BonusConfig {
            state: 4,
            action: 3,
            value: 100.0,
        });
        let model = cfg.reward_model();
        assert_eq!(model.bonus(4, 3), Some(100.0));
        assert_eq!(model.bonus(0, 1), None);
    }

    #[test]
    fn price_schedule_matches_bands() {
        let cfg = ScenarioConfig::baseline();
        let schedule = cfg.price_schedule();
        assert_eq!(schedule.price(0), 70.0);
        assert_eq!(schedule.price(5), 30.0);
        assert_eq!(schedule.price(11), 90.0);
    }
}
