//! The versioned "current best" record between the optimizer and the replay loop.
//!
//! Every publish swaps in a whole new [`BestSnapshot`] through a `watch`
//! channel and bumps its version in the same write, so a reader never sees a
//! champion from one publish paired with the version of another. Readers
//! compare versions only. The replay halt lives in the same snapshot: a reset
//! lifts it and bumps the version in one write, and a halt only lands if no
//! reset or publish happened since the replay last looked.

use atomic_float::AtomicF64;
use qforage_data::{ChampionUpdate, Genome};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;

/// An immutable published champion.
#[derive(Debug, Clone, PartialEq)]
pub struct Champion {
    pub genome: Arc<Genome>,
    pub fitness: f64,
    pub generation: usize,
}

impl Champion {
    #[must_use]
    pub fn update(&self) -> ChampionUpdate {
        ChampionUpdate {
            generation: self.generation,
            fitness: self.fitness,
            genome: Arc::clone(&self.genome),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BestSnapshot {
    pub version: u64,
    pub champion: Option<Arc<Champion>>,
    /// The replay finished an episode and waits for a reset.
    pub halted: bool,
}

pub struct SharedBest {
    tx: watch::Sender<BestSnapshot>,
    /// Fitness of the replay episode currently on screen.
    live_fitness: AtomicF64,
    auto_restart: bool,
}

impl Default for SharedBest {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SharedBest {
    #[must_use]
    pub fn new(auto_restart: bool) -> Self {
        let (tx, _) = watch::channel(BestSnapshot::default());
        Self {
            tx,
            live_fitness: AtomicF64::new(0.0),
            auto_restart,
        }
    }

    /// Replaces the champion and returns the new version.
    pub fn publish(&self, champion: Champion) -> u64 {
        let champion = Arc::new(champion);
        let mut version = 0;
        self.tx.send_modify(|snap| {
            snap.version += 1;
            snap.champion = Some(champion);
            version = snap.version;
        });
        tracing::debug!(version, "Champion published");
        version
    }

    /// Forces the replay loop to rebuild and lifts a halt. The champion is kept.
    pub fn reset(&self) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|snap| {
            snap.version += 1;
            snap.halted = false;
            version = snap.version;
        });
        tracing::debug!(version, "Replay reset requested");
        version
    }

    #[must_use]
    pub fn snapshot(&self) -> BestSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    #[must_use]
    pub fn champion(&self) -> Option<Arc<Champion>> {
        self.tx.borrow().champion.clone()
    }

    /// A receiver that wakes on every publish or reset.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BestSnapshot> {
        self.tx.subscribe()
    }

    pub fn set_live_fitness(&self, fitness: f64) {
        self.live_fitness.store(fitness, Ordering::Relaxed);
    }

    #[must_use]
    pub fn live_fitness(&self) -> f64 {
        self.live_fitness.load(Ordering::Relaxed)
    }

    /// Halts the replay at `version`. Ignored when the version has moved on.
    pub(crate) fn halt(&self, version: u64) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.version != version || snap.halted {
                return false;
            }
            snap.halted = true;
            true
        })
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.tx.borrow().halted
    }

    #[must_use]
    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn champion(fitness: f64, generation: usize) -> Champion {
        Champion {
            genome: Arc::new(Genome::Quantum {
                angles: vec![fitness; 2],
            }),
            fitness,
            generation,
        }
    }

    #[test]
    fn test_starts_empty() {
        let shared = SharedBest::default();
        assert_eq!(shared.version(), 0);
        assert!(shared.champion().is_none());
        assert!(!shared.is_halted());
    }

    #[test]
    fn test_publish_bumps_version() {
        let shared = SharedBest::new(false);
        assert_eq!(shared.publish(champion(10.0, 1)), 1);
        assert_eq!(shared.publish(champion(10.0, 2)), 2);
        let snap = shared.snapshot();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.champion.map(|c| c.generation), Some(2));
    }

    #[test]
    fn test_reset_keeps_champion_and_clears_halt() {
        let shared = SharedBest::new(false);
        shared.publish(champion(42.0, 3));
        assert!(shared.halt(1));
        assert!(shared.is_halted());
        assert_eq!(shared.reset(), 2);
        assert!(!shared.is_halted());
        assert_eq!(shared.champion().map(|c| c.fitness), Some(42.0));
    }

    #[test]
    fn test_stale_halt_after_reset_is_ignored() {
        let shared = SharedBest::new(false);
        let seen = shared.publish(champion(5.0, 1));
        shared.reset();
        assert!(!shared.halt(seen));
        assert!(!shared.is_halted());
        assert_eq!(shared.version(), 2);
    }

    #[test]
    fn test_halt_survives_publish_until_reset() {
        let shared = SharedBest::new(false);
        let seen = shared.publish(champion(5.0, 1));
        assert!(shared.halt(seen));
        shared.publish(champion(6.0, 2));
        assert!(shared.is_halted());
        shared.reset();
        assert!(!shared.is_halted());
    }

    #[tokio::test]
    async fn test_subscriber_wakes_on_publish() {
        let shared = SharedBest::default();
        let mut rx = shared.subscribe();
        shared.publish(champion(1.0, 1));
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow_and_update().version, 1);
    }

    #[test]
    fn test_live_fitness_roundtrip() {
        let shared = SharedBest::default();
        shared.set_live_fitness(-30.0);
        assert_eq!(shared.live_fitness(), -30.0);
    }
}
