//! Decision procedures that turn a genome and a sight vector into an action.
//!
//! The engine only ever talks to `dyn Policy`. The family tag decides which
//! implementation is constructed, and nothing downstream branches on it.

pub mod classical;
pub mod quantum;

pub use classical::ClassicalPolicy;
pub use quantum::QuantumPolicy;

use crate::config::PolicyConfig;
use crate::error::Result;
use qforage_data::{Action, DenseLayer, Genome, PolicyFamily, Sight};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// A replaceable decision strategy bundled with its mutation operator.
pub trait Policy: Send + Sync {
    fn family(&self) -> PolicyFamily;

    /// Checks that `genome` belongs to this family and has the expected shape.
    fn validate(&self, genome: &Genome) -> Result<()>;

    /// Picks an action for one step.
    fn decide(&self, genome: &Genome, sight: Sight) -> Result<Action>;

    /// Returns a perturbed copy of `genome`; the parent is left untouched.
    fn mutate(
        &self,
        genome: &Genome,
        chance: f64,
        sigma: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Genome>;

    fn random_genome(&self, rng: &mut dyn RngCore) -> Genome;

    /// Initial elites for a fresh run.
    fn seed_population(&self, count: usize, rng: &mut dyn RngCore) -> Vec<Genome> {
        (0..count).map(|_| self.random_genome(rng)).collect()
    }
}

/// Builds the policy for the configured family.
#[must_use]
pub fn policy_for(config: &PolicyConfig) -> Arc<dyn Policy> {
    match config.family {
        PolicyFamily::Quantum => Arc::new(QuantumPolicy::new(config.quantum_mode)),
        PolicyFamily::Classical => Arc::new(ClassicalPolicy::new(config.hidden_units)),
    }
}

/// The policy settings that can evaluate `genome`: its declared family, and
/// for networks the hidden width of its first layer.
#[must_use]
pub fn config_for_genome(genome: &Genome, base: &PolicyConfig) -> PolicyConfig {
    let hidden_units = match genome {
        Genome::Classical { layers } => layers
            .first()
            .map_or(base.hidden_units, DenseLayer::outputs),
        Genome::Quantum { .. } => base.hidden_units,
    };
    PolicyConfig {
        family: genome.family(),
        hidden_units,
        ..base.clone()
    }
}

/// Applies `delta` to each gene independently with probability `chance`.
pub fn perturb_genes<F>(genome: &mut Genome, chance: f64, rng: &mut dyn RngCore, mut delta: F)
where
    F: FnMut(&mut dyn RngCore) -> f64,
{
    genome.for_each_gene_mut(|gene| {
        if rng.gen::<f64>() < chance {
            *gene += delta(&mut *rng);
        }
    });
}
