//! qforage: evolve foraging policies for a grid creature and watch the
//! current champion replay live while the search runs.
//!
//! The engine lives in `qforage_core`; this crate wires it to an observer
//! through a [`session::Session`].

pub mod session;

pub use qforage_core::{
    config, creature, error, evolution, fitness, metrics, policy, replay, sensory, shared,
    shutdown, world,
};
pub use qforage_data as data;
pub use qforage_observer as observer;
pub use session::Session;
