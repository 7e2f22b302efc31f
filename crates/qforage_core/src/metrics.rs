//! Run metrics and logging setup.
//!
//! Counters are atomics so the optimizer's worker threads and the replay task
//! can record without coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Counters for one optimisation/replay run.
pub struct EvolutionMetrics {
    generations: AtomicU64,
    evaluations: AtomicU64,
    episodes: AtomicU64,
    publishes: AtomicU64,
    replay_steps: AtomicU64,
    replay_rebuilds: AtomicU64,
    start_time: Instant,
}

impl Default for EvolutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EvolutionMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            episodes: AtomicU64::new(0),
            publishes: AtomicU64::new(0),
            replay_steps: AtomicU64::new(0),
            replay_rebuilds: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a finished generation and logs progress every 5th one.
    pub fn record_generation(&self, generation: usize, top: &[f64], duration: Duration) {
        let count = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        if generation % 5 == 1 || count == 1 {
            tracing::info!(
                generation = generation,
                best = top.first().copied().unwrap_or_default(),
                second = top.get(1).copied().unwrap_or_default(),
                third = top.get(2).copied().unwrap_or_default(),
                duration_ms = duration.as_millis() as u64,
                "Generation evaluated"
            );
        }
    }

    /// Records a scored candidate and the episodes averaged into it.
    pub fn record_evaluation(&self, repeats: usize) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.episodes.fetch_add(repeats as u64, Ordering::Relaxed);
    }

    pub fn record_publish(&self) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replay_step(&self) {
        self.replay_steps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replay_rebuild(&self) {
        self.replay_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn publishes(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn replay_steps(&self) -> u64 {
        self.replay_steps.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn replay_rebuilds(&self) -> u64 {
        self.replay_rebuilds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs a one-line summary of the run so far.
    pub fn log_summary(&self) {
        tracing::info!(
            generations = self.generations(),
            evaluations = self.evaluations(),
            episodes = self.episodes(),
            publishes = self.publishes(),
            replay_steps = self.replay_steps(),
            replay_rebuilds = self.replay_rebuilds(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Run summary"
        );
    }
}

/// Initialise the global tracing subscriber. `RUST_LOG` overrides `default_directive`.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}
