use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which decision procedure a genome parameterises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFamily {
    /// Variational circuit angles.
    #[default]
    Quantum,
    /// Feed-forward network weights.
    Classical,
}

impl fmt::Display for PolicyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyFamily::Quantum => f.write_str("quantum"),
            PolicyFamily::Classical => f.write_str("classical"),
        }
    }
}

impl FromStr for PolicyFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantum" | "q" | "1" | "true" => Ok(PolicyFamily::Quantum),
            "classical" | "c" | "0" | "false" => Ok(PolicyFamily::Classical),
            other => Err(format!("unknown policy family: {other}")),
        }
    }
}

/// One dense layer. `weights[i][o]` connects input `i` to output `o`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    #[must_use]
    pub fn zeros(inputs: usize, outputs: usize) -> Self {
        Self {
            weights: vec![vec![0.0; outputs]; inputs],
            bias: vec![0.0; outputs],
        }
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    /// True when every weight row has one entry per bias.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.weights.iter().all(|row| row.len() == self.bias.len())
    }
}

/// The opaque parameter vector a policy is evaluated with.
///
/// Cloned genomes are independent; the optimizer and the replay loop share
/// them behind `Arc` and never mutate in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Genome {
    Quantum { angles: Vec<f64> },
    Classical { layers: Vec<DenseLayer> },
}

impl Genome {
    #[must_use]
    pub fn family(&self) -> PolicyFamily {
        match self {
            Genome::Quantum { .. } => PolicyFamily::Quantum,
            Genome::Classical { .. } => PolicyFamily::Classical,
        }
    }

    #[must_use]
    pub fn gene_count(&self) -> usize {
        match self {
            Genome::Quantum { angles } => angles.len(),
            Genome::Classical { layers } => layers
                .iter()
                .map(|l| l.weights.iter().map(Vec::len).sum::<usize>() + l.bias.len())
                .sum(),
        }
    }

    /// All scalar genes in a fixed order: angles as stored, or per layer the
    /// weights row by row followed by the bias.
    #[must_use]
    pub fn genes(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.gene_count());
        match self {
            Genome::Quantum { angles } => out.extend_from_slice(angles),
            Genome::Classical { layers } => {
                for layer in layers {
                    for row in &layer.weights {
                        out.extend_from_slice(row);
                    }
                    out.extend_from_slice(&layer.bias);
                }
            }
        }
        out
    }

    /// Visits every gene mutably, in the same order as [`Genome::genes`].
    pub fn for_each_gene_mut<F: FnMut(&mut f64)>(&mut self, mut f: F) {
        match self {
            Genome::Quantum { angles } => angles.iter_mut().for_each(f),
            Genome::Classical { layers } => {
                for layer in layers {
                    for w in layer.weights.iter_mut().flatten() {
                        f(w);
                    }
                    layer.bias.iter_mut().for_each(&mut f);
                }
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
