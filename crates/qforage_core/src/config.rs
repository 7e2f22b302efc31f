//! Configuration management for simulation and evolution parameters.
//!
//! Every section maps to a table in `config.toml`. Missing keys fall back to
//! the `Default` values, so a partial file is enough.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//!
//! [simulation]
//! grid_size = 9
//! vision_range = 4
//! max_moves = 20
//!
//! [evolution]
//! generations = 30
//! children = 10
//! elites = 5
//! chance = 0.2
//! sigma = 1.0
//!
//! [policy]
//! family = "classical"
//! ```

use crate::error::{ForageError, Result};
use qforage_data::PolicyFamily;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Parameters of a single episode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step budget per episode.
    pub steps: usize,
    /// Side length of the square grid.
    pub grid_size: usize,
    /// Number of cells scanned per sight ray.
    pub vision_range: usize,
    /// Starting (and baseline maximum) energy of the creature.
    pub max_moves: u32,
    /// Fraction of empty cells turned into walls, in `[0, 1)`.
    pub wall_density: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            grid_size: 9,
            vision_range: 4,
            max_moves: 20,
            wall_density: 0.0,
        }
    }
}

/// Mutation/selection strategy parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    pub generations: usize,
    /// Offspring spawned per elite each generation.
    pub children: usize,
    /// Parents kept for the next generation.
    pub elites: usize,
    /// Per-gene mutation probability.
    pub chance: f64,
    /// Perturbation scale.
    pub sigma: f64,
    /// Episodes averaged per fitness evaluation.
    pub repeats: usize,
    /// Evaluation worker threads; 0 picks one per core.
    pub workers: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: 20,
            children: 10,
            elites: 5,
            chance: 0.2,
            sigma: 1.0,
            repeats: 3,
            workers: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    pub tick_interval_ms: u64,
    /// Restart a finished episode instead of halting until reset.
    pub auto_restart: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            auto_restart: true,
        }
    }
}

impl ReplayConfig {
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// How a circuit outcome distribution becomes an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantumMode {
    /// Most probable outcome.
    #[default]
    Strict,
    /// Rounded probability-weighted mean outcome.
    Expectation,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    pub family: PolicyFamily,
    pub quantum_mode: QuantumMode,
    /// Hidden width of the classical network.
    pub hidden_units: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            family: PolicyFamily::Quantum,
            quantum_mode: QuantumMode::Strict,
            hidden_units: 8,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Seed for the optimizer and replay random sources; entropy when absent.
    pub seed: Option<u64>,
    pub simulation: SimulationConfig,
    pub evolution: EvolutionConfig,
    pub replay: ReplayConfig,
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Reads `path`, writing the defaults there first when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let default = Self::default();
            match toml::to_string_pretty(&default) {
                Ok(text) => {
                    if let Err(e) = fs::write(path, text) {
                        tracing::warn!(path = %path.display(), error = %e, "Could not write default config");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Could not serialize default config"),
            }
            return Ok(default);
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        let evo = &self.evolution;
        if sim.grid_size == 0 {
            return Err(ForageError::invalid_config("grid_size must be at least 1"));
        }
        if sim.vision_range == 0 {
            return Err(ForageError::invalid_config("vision_range must be at least 1"));
        }
        if !(0.0..1.0).contains(&sim.wall_density) {
            return Err(ForageError::invalid_config(format!(
                "wall_density must be in [0, 1), got {}",
                sim.wall_density
            )));
        }
        if !(0.0..=1.0).contains(&evo.chance) {
            return Err(ForageError::invalid_config(format!(
                "chance must be in [0, 1], got {}",
                evo.chance
            )));
        }
        if !evo.sigma.is_finite() || evo.sigma < 0.0 {
            return Err(ForageError::invalid_config(format!(
                "sigma must be finite and non-negative, got {}",
                evo.sigma
            )));
        }
        if evo.repeats == 0 {
            return Err(ForageError::invalid_config("repeats must be at least 1"));
        }
        if evo.elites == 0 {
            return Err(ForageError::invalid_config("elites must be at least 1"));
        }
        if self.policy.hidden_units == 0 {
            return Err(ForageError::invalid_config("hidden_units must be at least 1"));
        }
        Ok(())
    }
}
