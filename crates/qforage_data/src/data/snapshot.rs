use super::genome::Genome;
use super::grid::{Cell, Orientation, Position};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Orientation-relative proximity signals, each in `[-1, 1]`.
///
/// Positive values mean food, negative values mean a wall or the boundary,
/// and the magnitude shrinks with distance. Zero means nothing in range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sight {
    pub front: f64,
    pub left: f64,
    pub right: f64,
}

impl Sight {
    #[must_use]
    pub const fn new(front: f64, left: f64, right: f64) -> Self {
        Self { front, left, right }
    }

    #[must_use]
    pub fn as_array(&self) -> [f64; 3] {
        [self.front, self.left, self.right]
    }
}

/// One replay step as seen by an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub position: Position,
    pub orientation: Orientation,
    pub food_eaten: u32,
    pub energy: u32,
    pub max_energy: u32,
    pub age: u64,
    pub grid_size: usize,
    /// Row-major, `grid_size * grid_size` cells.
    pub grid: Vec<Cell>,
    pub fitness: f64,
    pub generation: usize,
}

/// A champion as announced to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionUpdate {
    pub generation: usize,
    pub fitness: f64,
    pub genome: Arc<Genome>,
}
