//! Live replay of the current champion, paced for a human observer.
//!
//! The coordinator keeps its own episode and the last version it saw. A
//! version change (a new champion or a reset) throws the episode away and
//! builds a fresh one; nothing else does. Episode ends restart the same
//! champion on a new seed, or halt until a reset when auto-restart is off.

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::fitness::Episode;
use crate::metrics::EvolutionMetrics;
use crate::policy::Policy;
use crate::shared::{Champion, SharedBest};
use crate::shutdown::Shutdown;
use qforage_data::Frame;
use qforage_observer::{Observer, ObserverEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// What a single [`ReplayCoordinator::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Nothing published yet.
    Idle,
    /// The last episode ended and auto-restart is off.
    Halted,
    Stepped {
        frame: Box<Frame>,
        /// This tick started from a freshly built episode.
        rebuilt: bool,
        /// The episode ended on this step.
        finished: bool,
    },
}

struct Running {
    episode: Episode,
    champion: Arc<Champion>,
}

pub struct ReplayCoordinator {
    shared: Arc<SharedBest>,
    policy: Arc<dyn Policy>,
    simulation: SimulationConfig,
    rng: ChaCha8Rng,
    last_seen: u64,
    running: Option<Running>,
    rebuilds: u64,
    restarts: u64,
    metrics: Option<Arc<EvolutionMetrics>>,
}

impl ReplayCoordinator {
    pub fn new(
        shared: Arc<SharedBest>,
        policy: Arc<dyn Policy>,
        simulation: SimulationConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            shared,
            policy,
            simulation,
            rng,
            last_seen: 0,
            running: None,
            rebuilds: 0,
            restarts: 0,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<EvolutionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Episodes rebuilt because the shared version moved.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Episodes restarted after ending on their own.
    #[must_use]
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    #[must_use]
    pub fn last_seen_version(&self) -> u64 {
        self.last_seen
    }

    #[must_use]
    pub fn episode(&self) -> Option<&Episode> {
        self.running.as_ref().map(|r| &r.episode)
    }

    fn fresh_episode(&mut self, champion: Arc<Champion>) -> Result<Running> {
        let seed = self.rng.gen::<u64>();
        let episode = Episode::new(Arc::clone(&champion.genome), Some(seed), &self.simulation)?
            .without_step_limit();
        Ok(Running { episode, champion })
    }

    /// Advances the replay by one step.
    pub fn tick(&mut self) -> Result<Tick> {
        let snapshot = self.shared.snapshot();
        let halted = snapshot.halted;
        let mut rebuilt = false;
        if snapshot.version != self.last_seen {
            self.last_seen = snapshot.version;
            self.running = match snapshot.champion {
                Some(champion) => {
                    tracing::debug!(
                        version = snapshot.version,
                        generation = champion.generation,
                        "Rebuilding replay episode"
                    );
                    rebuilt = true;
                    self.rebuilds += 1;
                    if let Some(m) = &self.metrics {
                        m.record_replay_rebuild();
                    }
                    Some(self.fresh_episode(champion)?)
                }
                None => None,
            };
        }

        if halted {
            return Ok(Tick::Halted);
        }
        let Some(running) = self.running.as_mut() else {
            return Ok(Tick::Idle);
        };

        running.episode.advance(self.policy.as_ref())?;
        let generation = running.champion.generation;
        let frame = running.episode.frame(generation);
        self.shared.set_live_fitness(frame.fitness);
        if let Some(m) = &self.metrics {
            m.record_replay_step();
        }

        let finished = running.episode.is_finished();
        if finished {
            if self.shared.auto_restart() {
                let champion = Arc::clone(&running.champion);
                tracing::debug!(
                    fitness = frame.fitness,
                    age = frame.age,
                    "Replay episode ended, restarting"
                );
                let next = self.fresh_episode(champion)?;
                self.running = Some(next);
                self.restarts += 1;
            } else {
                tracing::debug!(fitness = frame.fitness, "Replay episode ended, halting");
                self.shared.halt(self.last_seen);
            }
        }

        Ok(Tick::Stepped {
            frame: Box::new(frame),
            rebuilt,
            finished,
        })
    }

    /// Steps once per `interval` and sends every frame to `observer`.
    ///
    /// While idle or halted it sleeps until the shared record changes. Returns
    /// when `shutdown` fires; an observer that stops accepting frames requests
    /// shutdown for everyone.
    pub async fn run(
        mut self,
        observer: Arc<dyn Observer>,
        shutdown: Shutdown,
        interval: Duration,
    ) -> Result<()> {
        let mut rx = self.shared.subscribe();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }
            rx.borrow_and_update();

            match self.tick() {
                Ok(Tick::Idle) | Ok(Tick::Halted) => {
                    tokio::select! {
                        _ = shutdown.wait() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                Ok(Tick::Stepped { frame, .. }) => {
                    if observer.observe(&ObserverEvent::Frame(*frame)).await.is_err() {
                        tracing::warn!("Observer disconnected, stopping replay");
                        shutdown.request();
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Replay step failed");
                    return Err(e);
                }
            }
        }
        tracing::debug!(
            rebuilds = self.rebuilds,
            restarts = self.restarts,
            "Replay loop stopped"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::QuantumPolicy;
    use qforage_data::Genome;
    use qforage_observer::RecordingObserver;

    fn coordinator(shared: &Arc<SharedBest>) -> ReplayCoordinator {
        ReplayCoordinator::new(
            Arc::clone(shared),
            Arc::new(QuantumPolicy::default()),
            SimulationConfig::default(),
            Some(5),
        )
    }

    fn champion(generation: usize) -> Champion {
        Champion {
            genome: Arc::new(Genome::Quantum {
                angles: vec![0.0; 20],
            }),
            fitness: 0.0,
            generation,
        }
    }

    #[test]
    fn test_idle_until_published() {
        let shared = Arc::new(SharedBest::default());
        let mut replay = coordinator(&shared);
        assert_eq!(replay.tick().ok(), Some(Tick::Idle));
        assert_eq!(replay.rebuilds(), 0);
    }

    #[test]
    fn test_rebuilds_only_on_version_change() {
        let shared = Arc::new(SharedBest::default());
        let mut replay = coordinator(&shared);
        shared.publish(champion(1));
        assert!(matches!(replay.tick(), Ok(Tick::Stepped { rebuilt: true, .. })));
        assert!(matches!(replay.tick(), Ok(Tick::Stepped { rebuilt: false, .. })));
        assert_eq!(replay.rebuilds(), 1);

        shared.reset();
        assert!(matches!(replay.tick(), Ok(Tick::Stepped { rebuilt: true, .. })));
        assert_eq!(replay.rebuilds(), 2);
        assert_eq!(replay.last_seen_version(), 2);
    }

    #[test]
    fn test_frame_carries_champion_generation() {
        let shared = Arc::new(SharedBest::default());
        let mut replay = coordinator(&shared);
        shared.publish(champion(7));
        match replay.tick() {
            Ok(Tick::Stepped { frame, .. }) => {
                assert_eq!(frame.generation, 7);
                assert_eq!(frame.grid.len(), 81);
                assert_eq!(shared.live_fitness(), frame.fitness);
            }
            other => panic!("expected a step, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let shared = Arc::new(SharedBest::default());
        shared.publish(champion(1));
        let observer = Arc::new(RecordingObserver::default());
        let shutdown = Shutdown::new();
        let task = tokio::spawn(coordinator(&shared).run(
            observer.clone(),
            shutdown.clone(),
            Duration::from_millis(10),
        ));
        tokio::time::sleep(Duration::from_millis(55)).await;
        shutdown.request();
        task.await.expect("join").expect("replay");
        let frames = observer.consume_events();
        assert!(!frames.is_empty());
        assert!(frames
            .iter()
            .all(|e| matches!(e, ObserverEvent::Frame(_))));
    }
}
