//! # qforage core
//!
//! The engine behind qforage: a seeded grid-world foraging simulator, the
//! policy boundary that lets circuit-based and network-based decision
//! procedures be swapped, an elitist evolutionary search over policy
//! parameters, and a live replay loop that keeps re-running the current
//! champion while the search continues.
//!
//! ## Architecture
//!
//! - **Deterministic episodes**: every world owns a `ChaCha8Rng`; evaluation
//!   seeds derive from a hash of the genome so equal genomes score equally.
//! - **Parallel evaluation**: candidates of a generation are scored on a
//!   rayon pool and re-joined in pool order.
//! - **Versioned publishing**: the optimizer publishes champions through
//!   [`SharedBest`]; the replay loop rebuilds whenever the version moves.
//!
//! ## Example
//!
//! ```
//! use qforage_core::config::AppConfig;
//! use qforage_core::evolution::Evolution;
//! use qforage_core::policy::policy_for;
//!
//! let mut config = AppConfig::default();
//! config.seed = Some(42);
//! config.evolution.generations = 2;
//! config.evolution.children = 2;
//! config.evolution.elites = 2;
//!
//! let policy = policy_for(&config.policy);
//! let evolution = Evolution::new(policy, &config).unwrap();
//! for report in evolution {
//!     let report = report.unwrap();
//!     println!("gen {} -> {}", report.generation, report.fitness);
//! }
//! ```

/// Configuration loading and validation
pub mod config;
/// Creature state
pub mod creature;
/// Error types
pub mod error;
/// Generational search
pub mod evolution;
/// Episodes and fitness scoring
pub mod fitness;
/// Run counters and logging setup
pub mod metrics;
/// Decision procedures
pub mod policy;
/// Live champion replay
pub mod replay;
/// Orientation-relative sight
pub mod sensory;
pub mod shared;
pub mod shutdown;
/// Grid world and step physics
pub mod world;

pub use config::AppConfig;
pub use creature::Creature;
pub use error::{ForageError, Result};
pub use evolution::{Evolution, GenerationReport};
pub use fitness::{evaluate_average, genome_seed, score, simulate, Episode};
pub use metrics::{init_logging, EvolutionMetrics};
pub use policy::{config_for_genome, policy_for, ClassicalPolicy, Policy, QuantumPolicy};
pub use replay::{ReplayCoordinator, Tick};
pub use shared::{BestSnapshot, Champion, SharedBest};
pub use shutdown::Shutdown;
pub use world::GridWorld;
