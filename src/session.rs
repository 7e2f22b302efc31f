//! One optimisation/replay run bound to an observer.
//!
//! A session owns the shared champion record, the shutdown token and the
//! replay task. The optimizer runs on a blocking worker and hands each
//! generation over a bounded channel, so a slow observer throttles the search
//! instead of letting reports pile up.

use qforage_core::config::AppConfig;
use qforage_core::error::{ForageError, Result};
use qforage_core::evolution::{Evolution, GenerationReport};
use qforage_core::metrics::EvolutionMetrics;
use qforage_core::policy::{config_for_genome, policy_for, Policy};
use qforage_core::replay::ReplayCoordinator;
use qforage_core::shared::{Champion, SharedBest};
use qforage_core::shutdown::Shutdown;
use qforage_data::Genome;
use qforage_observer::{Observer, ObserverEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct Session {
    run_id: Uuid,
    config: AppConfig,
    policy: Arc<dyn Policy>,
    shared: Arc<SharedBest>,
    shutdown: Shutdown,
    observer: Arc<dyn Observer>,
    metrics: Arc<EvolutionMetrics>,
    replay: Option<JoinHandle<Result<()>>>,
}

impl Session {
    pub fn new(config: AppConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        config.validate()?;
        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            family = %config.policy.family,
            grid_size = config.simulation.grid_size,
            "Session created"
        );
        Ok(Self {
            run_id,
            policy: policy_for(&config.policy),
            shared: Arc::new(SharedBest::new(config.replay.auto_restart)),
            shutdown: Shutdown::new(),
            observer,
            metrics: Arc::new(EvolutionMetrics::new()),
            replay: None,
            config,
        })
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn shared(&self) -> &Arc<SharedBest> {
        &self.shared
    }

    #[must_use]
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<EvolutionMetrics> {
        &self.metrics
    }

    /// True once the replay task has exited.
    #[must_use]
    pub fn replay_finished(&self) -> bool {
        self.replay.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Spawns the replay loop if it is not running yet.
    pub fn start_replay(&mut self) {
        if self.replay.is_some() {
            return;
        }
        let coordinator = ReplayCoordinator::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.policy),
            self.config.simulation.clone(),
            self.config.seed,
        )
        .with_metrics(Arc::clone(&self.metrics));
        let task = coordinator.run(
            Arc::clone(&self.observer),
            self.shutdown.clone(),
            self.config.replay.tick_interval(),
        );
        self.replay = Some(tokio::spawn(task));
    }

    /// Runs the configured number of generations alongside the replay loop.
    ///
    /// Each published champion goes to the observer. If the observer hangs
    /// up, both activities stop and the best champion so far is returned.
    pub async fn evolve(&mut self) -> Result<Option<Champion>> {
        self.start_replay();
        let evolution = Evolution::new(Arc::clone(&self.policy), &self.config)?
            .with_shared(Arc::clone(&self.shared))
            .with_shutdown(self.shutdown.clone())
            .with_metrics(Arc::clone(&self.metrics));

        let (tx, mut rx) = mpsc::channel::<Result<GenerationReport>>(1);
        let worker = tokio::task::spawn_blocking(move || {
            for report in evolution {
                if tx.blocking_send(report).is_err() {
                    break;
                }
            }
        });

        let mut failure = None;
        while let Some(item) = rx.recv().await {
            match item {
                Ok(report) if report.published => {
                    let event = ObserverEvent::Champion(qforage_data::ChampionUpdate {
                        generation: report.generation,
                        fitness: report.fitness,
                        genome: report.champion,
                    });
                    if self.observer.observe(&event).await.is_err() {
                        tracing::warn!(run_id = %self.run_id, "Observer disconnected, stopping evolution");
                        self.shutdown.request();
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(rx);
        worker
            .await
            .map_err(|e| ForageError::Join(e.to_string()))?;
        if let Some(e) = failure {
            return Err(e);
        }

        let best = self.shared.champion();
        if !self.shutdown.is_requested() {
            if let Some(best) = &best {
                let done = ObserverEvent::Done(best.update());
                if self.observer.observe(&done).await.is_err() {
                    self.shutdown.request();
                }
            }
        }
        self.metrics.log_summary();
        Ok(best.map(|c| Champion::clone(&c)))
    }

    /// Publishes an externally supplied genome as generation 0 and starts replaying it.
    ///
    /// The genome's declared family picks the policy; a running replay of
    /// another family is replaced.
    pub async fn import_genome(&mut self, genome: Genome) -> Result<Arc<Champion>> {
        let policy_config = config_for_genome(&genome, &self.config.policy);
        if policy_config == self.config.policy {
            self.policy.validate(&genome)?;
        } else {
            let policy = policy_for(&policy_config);
            policy.validate(&genome)?;
            tracing::info!(
                run_id = %self.run_id,
                family = %policy_config.family,
                hidden_units = policy_config.hidden_units,
                "Switching policy for imported genome"
            );
            self.policy = policy;
            self.config.policy = policy_config;
            if let Some(handle) = self.replay.take() {
                handle.abort();
            }
        }
        let champion = Champion {
            genome: Arc::new(genome),
            fitness: 0.0,
            generation: 0,
        };
        let update = champion.update();
        self.shared.publish(champion);
        tracing::info!(run_id = %self.run_id, "Genome imported");
        self.start_replay();
        if self
            .observer
            .observe(&ObserverEvent::Champion(update))
            .await
            .is_err()
        {
            self.shutdown.request();
        }
        self.shared
            .champion()
            .ok_or_else(|| ForageError::invalid_genome("imported genome was not published"))
    }

    /// Restarts the replay from the current champion.
    pub async fn reset(&self) {
        self.shared.reset();
        if self
            .observer
            .observe(&ObserverEvent::ResetAcknowledged)
            .await
            .is_err()
        {
            self.shutdown.request();
        }
    }

    /// Stops both activities and waits for the replay task.
    pub async fn close(mut self) -> Result<()> {
        self.shutdown.request();
        if let Some(handle) = self.replay.take() {
            handle
                .await
                .map_err(|e| ForageError::Join(e.to_string()))??;
        }
        tracing::info!(run_id = %self.run_id, "Session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.request();
    }
}
