//! Elitist mutation-and-selection search.
//!
//! [`Evolution`] is a lazy iterator: each `next()` runs one generation, so a
//! caller can stop after any generation and everything published so far stays
//! valid. Candidates are scored on a dedicated rayon pool; the indexed
//! collect keeps pool order, which the stable sort then uses as tie-break.

use crate::config::{AppConfig, EvolutionConfig, SimulationConfig};
use crate::error::{ForageError, Result};
use crate::fitness::evaluate_average;
use crate::metrics::EvolutionMetrics;
use crate::policy::Policy;
use crate::shared::{Champion, SharedBest};
use crate::shutdown::Shutdown;
use qforage_data::Genome;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// 1-based.
    pub generation: usize,
    pub champion: Arc<Genome>,
    pub fitness: f64,
    /// Whether this generation's champion matched or beat the best so far.
    pub published: bool,
    /// Fitness of the surviving elites, best first.
    pub top: Vec<f64>,
}

pub struct Evolution {
    policy: Arc<dyn Policy>,
    simulation: SimulationConfig,
    settings: EvolutionConfig,
    elites: Vec<Arc<Genome>>,
    rng: ChaCha8Rng,
    pool: rayon::ThreadPool,
    generation: usize,
    best_ever: f64,
    best: Option<Champion>,
    shared: Option<Arc<SharedBest>>,
    shutdown: Option<Shutdown>,
    metrics: Arc<EvolutionMetrics>,
    finished: bool,
}

impl Evolution {
    /// Starts from `elites` freshly randomised genomes.
    pub fn new(policy: Arc<dyn Policy>, config: &AppConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let elites = policy
            .seed_population(config.evolution.elites.max(1), &mut rng)
            .into_iter()
            .map(Arc::new)
            .collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.evolution.workers)
            .thread_name(|i| format!("qforage-eval-{i}"))
            .build()
            .map_err(|e| ForageError::ThreadPool(e.to_string()))?;

        Ok(Self {
            policy,
            simulation: config.simulation.clone(),
            settings: config.evolution.clone(),
            elites,
            rng,
            pool,
            generation: 0,
            best_ever: f64::NEG_INFINITY,
            best: None,
            shared: None,
            shutdown: None,
            metrics: Arc::new(EvolutionMetrics::new()),
            finished: false,
        })
    }

    /// Replaces the starting elites with hand-picked genomes.
    pub fn with_seeds(mut self, seeds: Vec<Genome>) -> Result<Self> {
        if seeds.is_empty() {
            return Err(ForageError::invalid_config("at least one seed genome is required"));
        }
        for genome in &seeds {
            self.policy.validate(genome)?;
        }
        self.elites = seeds.into_iter().map(Arc::new).collect();
        Ok(self)
    }

    /// Publishes every best-or-tied champion into `shared`.
    #[must_use]
    pub fn with_shared(mut self, shared: Arc<SharedBest>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Stops before the next generation once `shutdown` is requested.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EvolutionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn best_ever(&self) -> f64 {
        self.best_ever
    }

    /// The most recently published champion.
    #[must_use]
    pub fn best(&self) -> Option<&Champion> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn elites(&self) -> &[Arc<Genome>] {
        &self.elites
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<EvolutionMetrics> {
        &self.metrics
    }

    fn cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(Shutdown::is_requested)
    }

    /// Parents first, then each parent's children in order.
    fn candidate_pool(&mut self) -> Result<Vec<Arc<Genome>>> {
        let EvolutionConfig {
            children,
            chance,
            sigma,
            ..
        } = self.settings;
        let mut pool = Vec::with_capacity(self.elites.len() * (children + 1));
        pool.extend(self.elites.iter().cloned());
        for parent in &self.elites {
            for _ in 0..children {
                let child = self.policy.mutate(parent, chance, sigma, &mut self.rng)?;
                pool.push(Arc::new(child));
            }
        }
        Ok(pool)
    }

    fn run_generation(&mut self) -> Result<GenerationReport> {
        let started = Instant::now();
        let generation = self.generation + 1;
        let pool = self.candidate_pool()?;

        let policy = self.policy.as_ref();
        let simulation = &self.simulation;
        let repeats = self.settings.repeats;
        let metrics = &self.metrics;
        let scores: Vec<f64> = self.pool.install(|| {
            pool.par_iter()
                .map(|genome| -> Result<f64> {
                    let fitness = evaluate_average(genome, policy, repeats, simulation)?;
                    metrics.record_evaluation(repeats);
                    Ok(fitness)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut ranked: Vec<(Arc<Genome>, f64)> = pool.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(self.settings.elites.max(1));

        let (champion, fitness) = (Arc::clone(&ranked[0].0), ranked[0].1);
        let top: Vec<f64> = ranked.iter().map(|(_, f)| *f).collect();
        self.elites = ranked.into_iter().map(|(g, _)| g).collect();
        self.generation = generation;

        let published = fitness >= self.best_ever;
        if published {
            self.best_ever = fitness;
            let best = Champion {
                genome: Arc::clone(&champion),
                fitness,
                generation,
            };
            if let Some(shared) = &self.shared {
                shared.publish(best.clone());
            }
            self.best = Some(best);
            self.metrics.record_publish();
            tracing::info!(generation, fitness, "New best champion");
        }
        self.metrics
            .record_generation(generation, &top, started.elapsed());

        Ok(GenerationReport {
            generation,
            champion,
            fitness,
            published,
            top,
        })
    }
}

impl Iterator for Evolution {
    type Item = Result<GenerationReport>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.generation >= self.settings.generations {
            return None;
        }
        if self.cancelled() {
            tracing::info!(generation = self.generation, "Evolution cancelled");
            self.finished = true;
            return None;
        }
        match self.run_generation() {
            Ok(report) => Some(Ok(report)),
            Err(e) => {
                tracing::error!(generation = self.generation + 1, error = %e, "Generation failed");
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Evolution {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ClassicalPolicy, QuantumPolicy};

    fn small_config(generations: usize) -> AppConfig {
        let mut config = AppConfig::default();
        config.seed = Some(17);
        config.evolution.generations = generations;
        config.evolution.children = 3;
        config.evolution.elites = 2;
        config.evolution.repeats = 2;
        config.evolution.workers = 2;
        config.simulation.steps = 20;
        config
    }

    #[test]
    fn test_runs_configured_generations() {
        let evo = Evolution::new(Arc::new(QuantumPolicy::default()), &small_config(3))
            .expect("evolution");
        let reports: Vec<_> = evo.collect::<Result<_>>().expect("all generations");
        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports.iter().map(|r| r.generation).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(reports[0].published);
        for r in &reports {
            assert_eq!(r.top.len(), 2);
            assert!(r.top.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_elites_never_regress() {
        // Elites are re-scored with the same seeds, so the top can only hold or improve.
        let evo = Evolution::new(Arc::new(ClassicalPolicy::default()), &small_config(4))
            .expect("evolution");
        let fitness: Vec<f64> = evo.map(|r| r.expect("generation").fitness).collect();
        assert!(fitness.windows(2).all(|w| w[1] >= w[0]), "{fitness:?}");
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            Evolution::new(Arc::new(QuantumPolicy::default()), &small_config(2))
                .expect("evolution")
                .map(|r| r.expect("generation").fitness)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_shutdown_stops_between_generations() {
        let shutdown = Shutdown::new();
        let mut evo = Evolution::new(Arc::new(QuantumPolicy::default()), &small_config(5))
            .expect("evolution")
            .with_shutdown(shutdown.clone());
        assert!(evo.next().is_some());
        shutdown.request();
        assert!(evo.next().is_none());
        assert_eq!(evo.generation(), 1);
    }

    #[test]
    fn test_invalid_seed_genome_rejected() {
        let evo = Evolution::new(Arc::new(QuantumPolicy::default()), &small_config(1))
            .expect("evolution");
        let result = evo.with_seeds(vec![Genome::Quantum {
            angles: vec![0.0; 3],
        }]);
        assert!(matches!(result, Err(ForageError::InvalidGenome(_))));
    }

    #[test]
    fn test_publishes_into_shared_best() {
        let shared = Arc::new(SharedBest::default());
        let evo = Evolution::new(Arc::new(QuantumPolicy::default()), &small_config(3))
            .expect("evolution")
            .with_shared(Arc::clone(&shared));
        let published = evo
            .map(|r| r.expect("generation"))
            .filter(|r| r.published)
            .count();
        assert_eq!(shared.version(), published as u64);
        assert!(shared.champion().is_some());
    }
}
