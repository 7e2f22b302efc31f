//! Five-qubit variational circuit evaluated by exact state-vector simulation.
//!
//! Layout: vision angles RY on q0..q2, an RY layer and an RZ layer over all
//! qubits (angles 0..10), CX entanglers (0,3) (1,3) (2,4) (3,4), a second
//! RY/RZ layer (angles 10..20). Qubit 3 is the low action bit and qubit 4 the
//! high one. Probabilities are computed exactly, so the same angles and sight
//! always yield the same action.

use super::{perturb_genes, Policy};
use crate::config::QuantumMode;
use crate::error::{ForageError, Result};
use qforage_data::{Action, Genome, PolicyFamily, Sight};
use rand::{Rng, RngCore};
use std::f64::consts::{FRAC_PI_3, PI};

pub const TRAINABLE_ANGLES: usize = 20;
const QUBITS: usize = 5;
const DIM: usize = 1 << QUBITS;
const LOW_BIT: usize = 3;
const HIGH_BIT: usize = 4;
const ENTANGLERS: [(usize, usize); 4] = [(0, 3), (1, 3), (2, 4), (3, 4)];
/// Random angles are drawn from `[-INIT_SPAN, INIT_SPAN]`.
const INIT_SPAN: f64 = 12.0 * PI;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Amplitude {
    re: f64,
    im: f64,
}

impl Amplitude {
    fn scale(self, k: f64) -> Self {
        Self {
            re: self.re * k,
            im: self.im * k,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    /// Multiplies by `e^{i phi}`.
    fn rotate(self, phi: f64) -> Self {
        let (s, c) = phi.sin_cos();
        Self {
            re: self.re * c - self.im * s,
            im: self.re * s + self.im * c,
        }
    }

    fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

struct StateVector {
    amps: [Amplitude; DIM],
}

impl StateVector {
    fn zero() -> Self {
        let mut amps = [Amplitude::default(); DIM];
        amps[0].re = 1.0;
        Self { amps }
    }

    fn ry(&mut self, qubit: usize, theta: f64) {
        let (s, c) = (theta / 2.0).sin_cos();
        let mask = 1 << qubit;
        for i in (0..DIM).filter(|i| i & mask == 0) {
            let (a, b) = (self.amps[i], self.amps[i | mask]);
            self.amps[i] = a.scale(c).add(b.scale(-s));
            self.amps[i | mask] = a.scale(s).add(b.scale(c));
        }
    }

    fn rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        for (i, amp) in self.amps.iter_mut().enumerate() {
            let phi = if i & mask == 0 { -theta / 2.0 } else { theta / 2.0 };
            *amp = amp.rotate(phi);
        }
    }

    fn cx(&mut self, control: usize, target: usize) {
        let (c, t) = (1 << control, 1 << target);
        for i in (0..DIM).filter(|i| i & c != 0 && i & t == 0) {
            self.amps.swap(i, i | t);
        }
    }

    /// Probabilities of the four `(high, low)` readouts, indexed by action code.
    fn readout(&self) -> [f64; 4] {
        let mut probs = [0.0; 4];
        for (i, amp) in self.amps.iter().enumerate() {
            let code = ((i >> LOW_BIT) & 1) | (((i >> HIGH_BIT) & 1) << 1);
            probs[code] += amp.norm_sqr();
        }
        probs
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuantumPolicy {
    mode: QuantumMode,
}

impl QuantumPolicy {
    #[must_use]
    pub fn new(mode: QuantumMode) -> Self {
        Self { mode }
    }

    /// Outcome distribution for `angles` under `sight`, indexed by action code.
    pub fn outcome_probabilities(&self, angles: &[f64], sight: Sight) -> Result<[f64; 4]> {
        if angles.len() != TRAINABLE_ANGLES {
            return Err(ForageError::invalid_genome(format!(
                "expected {TRAINABLE_ANGLES} circuit angles, got {}",
                angles.len()
            )));
        }
        let mut state = StateVector::zero();
        for (qubit, signal) in sight.as_array().into_iter().enumerate() {
            state.ry(qubit, signal * FRAC_PI_3);
        }
        for (layer, block) in angles.chunks(2 * QUBITS).enumerate() {
            let (ry, rz) = block.split_at(QUBITS);
            for q in 0..QUBITS {
                state.ry(q, ry[q]);
            }
            for q in 0..QUBITS {
                state.rz(q, rz[q]);
            }
            if layer == 0 {
                for (control, target) in ENTANGLERS {
                    state.cx(control, target);
                }
            }
        }
        Ok(state.readout())
    }

    fn angles<'a>(&self, genome: &'a Genome) -> Result<&'a [f64]> {
        match genome {
            Genome::Quantum { angles } => Ok(angles),
            Genome::Classical { .. } => Err(ForageError::invalid_genome(
                "classical weights given to the quantum policy",
            )),
        }
    }
}

impl Policy for QuantumPolicy {
    fn family(&self) -> PolicyFamily {
        PolicyFamily::Quantum
    }

    fn validate(&self, genome: &Genome) -> Result<()> {
        let angles = self.angles(genome)?;
        if angles.len() != TRAINABLE_ANGLES {
            return Err(ForageError::invalid_genome(format!(
                "expected {TRAINABLE_ANGLES} circuit angles, got {}",
                angles.len()
            )));
        }
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(ForageError::invalid_genome("circuit angles must be finite"));
        }
        Ok(())
    }

    fn decide(&self, genome: &Genome, sight: Sight) -> Result<Action> {
        let probs = self.outcome_probabilities(self.angles(genome)?, sight)?;
        let code = match self.mode {
            QuantumMode::Strict => {
                let mut best = 0;
                for (code, &p) in probs.iter().enumerate().skip(1) {
                    if p > probs[best] {
                        best = code;
                    }
                }
                best as u8
            }
            QuantumMode::Expectation => {
                let mean: f64 = probs.iter().enumerate().map(|(k, p)| k as f64 * p).sum();
                mean.round().clamp(0.0, 3.0) as u8
            }
        };
        Ok(Action::try_from(code)?)
    }

    fn mutate(
        &self,
        genome: &Genome,
        chance: f64,
        sigma: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Genome> {
        self.angles(genome)?;
        if !(sigma >= 0.0 && sigma.is_finite()) {
            return Err(ForageError::invalid_config(format!(
                "mutation sigma must be finite and non-negative, got {sigma}"
            )));
        }
        let mut child = genome.clone();
        perturb_genes(&mut child, chance, rng, |rng| rng.gen_range(-sigma..=sigma));
        Ok(child)
    }

    fn random_genome(&self, rng: &mut dyn RngCore) -> Genome {
        Genome::Quantum {
            angles: (0..TRAINABLE_ANGLES)
                .map(|_| rng.gen_range(-INIT_SPAN..=INIT_SPAN))
                .collect(),
        }
    }
}
