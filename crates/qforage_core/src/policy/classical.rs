//! Small feed-forward network policy: 3 sight inputs, one tanh hidden layer,
//! 4 linear action logits.

use super::{perturb_genes, Policy};
use crate::error::{ForageError, Result};
use qforage_data::{Action, DenseLayer, Genome, PolicyFamily, Sight};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};

pub const INPUTS: usize = 3;
pub const OUTPUTS: usize = 4;
/// Sight values are divided by this before entering the network.
const INPUT_SCALE: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct ClassicalPolicy {
    hidden: usize,
}

impl Default for ClassicalPolicy {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ClassicalPolicy {
    #[must_use]
    pub fn new(hidden: usize) -> Self {
        Self {
            hidden: hidden.max(1),
        }
    }

    #[must_use]
    pub fn hidden_units(&self) -> usize {
        self.hidden
    }

    /// Raw output logits, one per action code.
    pub fn logits(&self, genome: &Genome, sight: Sight) -> Result<[f64; OUTPUTS]> {
        let layers = self.layers(genome)?;
        self.check_shapes(layers)?;
        let input = sight.as_array().map(|v| v / INPUT_SCALE);
        let hidden: Vec<f64> = forward(&layers[0], &input).map(f64::tanh).collect();
        let mut out = [0.0; OUTPUTS];
        for (slot, value) in out.iter_mut().zip(forward(&layers[1], &hidden)) {
            *slot = value;
        }
        Ok(out)
    }

    fn layers<'a>(&self, genome: &'a Genome) -> Result<&'a [DenseLayer]> {
        match genome {
            Genome::Classical { layers } => Ok(layers),
            Genome::Quantum { .. } => Err(ForageError::invalid_genome(
                "circuit angles given to the classical policy",
            )),
        }
    }

    fn check_shapes(&self, layers: &[DenseLayer]) -> Result<()> {
        let expected = [(INPUTS, self.hidden), (self.hidden, OUTPUTS)];
        if layers.len() != expected.len() {
            return Err(ForageError::invalid_genome(format!(
                "expected {} layers, got {}",
                expected.len(),
                layers.len()
            )));
        }
        for (i, (layer, (inputs, outputs))) in layers.iter().zip(expected).enumerate() {
            if layer.inputs() != inputs || layer.outputs() != outputs || !layer.is_well_formed() {
                return Err(ForageError::invalid_genome(format!(
                    "layer {i} should be {inputs}x{outputs}"
                )));
            }
        }
        Ok(())
    }
}

fn forward<'a>(layer: &'a DenseLayer, input: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
    layer.bias.iter().enumerate().map(move |(o, b)| {
        input
            .iter()
            .zip(&layer.weights)
            .map(|(x, row)| x * row[o])
            .sum::<f64>()
            + b
    })
}

impl Policy for ClassicalPolicy {
    fn family(&self) -> PolicyFamily {
        PolicyFamily::Classical
    }

    fn validate(&self, genome: &Genome) -> Result<()> {
        let layers = self.layers(genome)?;
        self.check_shapes(layers)?;
        if genome.genes().iter().any(|w| !w.is_finite()) {
            return Err(ForageError::invalid_genome("network weights must be finite"));
        }
        Ok(())
    }

    fn decide(&self, genome: &Genome, sight: Sight) -> Result<Action> {
        let logits = self.logits(genome, sight)?;
        let mut best = 0;
        for (code, &v) in logits.iter().enumerate().skip(1) {
            if v > logits[best] {
                best = code;
            }
        }
        Ok(Action::try_from(best as u8)?)
    }

    fn mutate(
        &self,
        genome: &Genome,
        chance: f64,
        sigma: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Genome> {
        self.layers(genome)?;
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| ForageError::invalid_config(format!("mutation sigma {sigma}: {e}")))?;
        let mut child = genome.clone();
        perturb_genes(&mut child, chance, rng, |rng| normal.sample(rng));
        Ok(child)
    }

    fn random_genome(&self, rng: &mut dyn RngCore) -> Genome {
        let mut layer = |inputs: usize, outputs: usize| {
            let mut l = DenseLayer::zeros(inputs, outputs);
            for w in l.weights.iter_mut().flatten().chain(l.bias.iter_mut()) {
                *w = rng.gen_range(-1.0..=1.0);
            }
            l
        };
        let first = layer(INPUTS, self.hidden);
        let second = layer(self.hidden, OUTPUTS);
        Genome::Classical {
            layers: vec![first, second],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn zeros(hidden: usize) -> Genome {
        Genome::Classical {
            layers: vec![
                DenseLayer::zeros(INPUTS, hidden),
                DenseLayer::zeros(hidden, OUTPUTS),
            ],
        }
    }

    #[test]
    fn test_zero_network_picks_first_action() {
        let policy = ClassicalPolicy::new(4);
        let action = policy.decide(&zeros(4), Sight::new(1.0, -1.0, 0.5));
        assert_eq!(action.ok(), Some(Action::Stay));
    }

    #[test]
    fn test_bias_drives_argmax() {
        let policy = ClassicalPolicy::new(2);
        let mut genome = zeros(2);
        if let Genome::Classical { layers } = &mut genome {
            layers[1].bias = vec![0.0, 0.1, 0.3, 0.3];
        }
        // Equal logits resolve to the lower code.
        assert_eq!(
            policy.decide(&genome, Sight::default()).ok(),
            Some(Action::TurnLeft)
        );
    }

    #[test]
    fn test_input_is_halved_before_tanh() {
        let policy = ClassicalPolicy::new(1);
        let mut genome = zeros(1);
        if let Genome::Classical { layers } = &mut genome {
            layers[0].weights[0][0] = 1.0;
            layers[1].weights[0] = vec![0.0, 1.0, 0.0, 0.0];
        }
        let logits = policy.logits(&genome, Sight::new(1.0, 0.0, 0.0)).expect("valid");
        assert!((logits[1] - 0.5f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch_is_invalid_genome() {
        let policy = ClassicalPolicy::new(8);
        assert!(matches!(
            policy.validate(&zeros(4)),
            Err(ForageError::InvalidGenome(_))
        ));
        let single = Genome::Classical {
            layers: vec![DenseLayer::zeros(INPUTS, OUTPUTS)],
        };
        assert!(policy.decide(&single, Sight::default()).is_err());
        let quantum = Genome::Quantum {
            angles: vec![0.0; 20],
        };
        assert!(policy.validate(&quantum).is_err());
    }

    #[test]
    fn test_random_genome_is_valid_and_bounded() {
        let policy = ClassicalPolicy::default();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let genome = policy.random_genome(&mut rng);
        assert!(policy.validate(&genome).is_ok());
        assert_eq!(genome.gene_count(), 3 * 8 + 8 + 8 * 4 + 4);
        assert!(genome.genes().iter().all(|w| (-1.0..=1.0).contains(w)));
    }

    #[test]
    fn test_gaussian_mutation_keeps_shape() {
        let policy = ClassicalPolicy::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let parent = policy.random_genome(&mut rng);
        let child = policy.mutate(&parent, 1.0, 0.1, &mut rng).expect("mutate");
        assert!(policy.validate(&child).is_ok());
        assert_ne!(child, parent);
        let untouched = policy.mutate(&parent, 0.0, 0.1, &mut rng).expect("mutate");
        assert_eq!(untouched, parent);
    }

    #[test]
    fn test_negative_sigma_is_rejected() {
        let policy = ClassicalPolicy::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let parent = policy.random_genome(&mut rng);
        assert!(matches!(
            policy.mutate(&parent, 0.5, -1.0, &mut rng),
            Err(ForageError::InvalidConfig(_))
        ));
    }
}
