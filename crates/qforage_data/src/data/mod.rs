//! Core data structures for the qforage simulation.

pub mod genome;
pub mod grid;
pub mod snapshot;
