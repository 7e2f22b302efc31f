//! Observer sink for champions and live replay frames.
//!
//! A delivery failure is not an error condition for the simulation: it tells
//! the caller that nobody is listening any more and both activities should
//! wind down.

use async_trait::async_trait;
use qforage_data::{ChampionUpdate, Frame};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObserverEvent {
    /// A new best-or-tied champion was published.
    Champion(ChampionUpdate),
    /// One replay step of the current champion.
    Frame(Frame),
    /// A reset request was applied.
    ResetAcknowledged,
    /// Evolution finished; carries the best champion of the run.
    Done(ChampionUpdate),
}

/// The receiving side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("observer disconnected")]
pub struct Disconnected;

#[async_trait]
pub trait Observer: Send + Sync {
    async fn observe(&self, event: &ObserverEvent) -> Result<(), Disconnected>;
}

/// Writes every event to the tracing log. Never disconnects.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

#[async_trait]
impl Observer for LogObserver {
    async fn observe(&self, event: &ObserverEvent) -> Result<(), Disconnected> {
        match event {
            ObserverEvent::Champion(update) => tracing::info!(
                generation = update.generation,
                fitness = update.fitness,
                family = %update.genome.family(),
                "New champion"
            ),
            ObserverEvent::Frame(frame) => tracing::debug!(
                row = frame.position.row,
                col = frame.position.col,
                orientation = ?frame.orientation,
                energy = frame.energy,
                food_eaten = frame.food_eaten,
                fitness = frame.fitness,
                "Replay frame"
            ),
            ObserverEvent::ResetAcknowledged => tracing::info!("Replay reset acknowledged"),
            ObserverEvent::Done(update) => match update.genome.to_json() {
                Ok(genome) => tracing::info!(
                    generation = update.generation,
                    fitness = update.fitness,
                    genome = %genome,
                    "Evolution finished"
                ),
                Err(e) => tracing::error!(error = %e, "Failed to serialize final genome"),
            },
        }
        Ok(())
    }
}

/// Forwards events into a bounded channel; fails once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<ObserverEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ObserverEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Observer for ChannelObserver {
    async fn observe(&self, event: &ObserverEvent) -> Result<(), Disconnected> {
        self.tx.send(event.clone()).await.map_err(|_| Disconnected)
    }
}

/// Keeps the most recent events in memory.
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<ObserverEvent>>>,
    pub max_history: usize,
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl RecordingObserver {
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            max_history,
        }
    }

    pub fn consume_events(&self) -> Vec<ObserverEvent> {
        match self.events.lock() {
            Ok(mut list) => std::mem::take(&mut *list),
            Err(e) => std::mem::take(&mut *e.into_inner()),
        }
    }
}

#[async_trait]
impl Observer for RecordingObserver {
    async fn observe(&self, event: &ObserverEvent) -> Result<(), Disconnected> {
        let mut list = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if list.len() >= self.max_history {
            list.remove(0);
        }
        list.push(event.clone());
        Ok(())
    }
}
