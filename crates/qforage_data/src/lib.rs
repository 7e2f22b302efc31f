//! Plain data shared by every qforage crate: grid coordinates and cells,
//! actions, sight vectors, genomes and the snapshots handed to observers.

pub mod data;

pub use data::genome::{DenseLayer, Genome, PolicyFamily};
pub use data::grid::{Action, Cell, InvalidActionCode, Orientation, Position, StepResult};
pub use data::snapshot::{ChampionUpdate, Frame, Sight};
