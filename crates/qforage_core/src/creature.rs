//! Mutable creature state carried through an episode.

use qforage_data::{Genome, Orientation, Position};
use std::collections::HashSet;
use std::sync::Arc;

/// Energy granted per food eaten. Not clamped to `max_energy`.
pub const FOOD_ENERGY: u32 = 5;
/// Energy spent per successful forward move.
pub const MOVE_COST: u32 = 1;

#[derive(Debug, Clone)]
pub struct Creature {
    pub position: Position,
    pub orientation: Orientation,
    /// Steps taken, including no-ops and blocked moves.
    pub age: u64,
    pub energy: u32,
    pub max_energy: u32,
    pub food_eaten: u32,
    /// Cells entered by a successful move. The spawn cell only counts once revisited.
    pub visited_positions: HashSet<Position>,
    /// Shared, read-only policy parameters.
    pub genome: Arc<Genome>,
}

impl Creature {
    #[must_use]
    pub fn new(genome: Arc<Genome>, max_energy: u32) -> Self {
        Self {
            position: Position::default(),
            orientation: Orientation::Up,
            age: 0,
            energy: max_energy,
            max_energy,
            food_eaten: 0,
            visited_positions: HashSet::new(),
            genome,
        }
    }

    #[must_use]
    pub fn forward_position(&self) -> Position {
        self.position.offset(self.orientation.delta(), 1)
    }

    pub fn turn_left(&mut self) {
        self.orientation = self.orientation.turned_left();
    }

    pub fn turn_right(&mut self) {
        self.orientation = self.orientation.turned_right();
    }

    pub(crate) fn eat(&mut self) {
        self.food_eaten += 1;
        self.energy = self.energy.saturating_add(FOOD_ENERGY);
    }

    /// Moves to `to`, records the visit and pays the move cost, floored at 0.
    pub(crate) fn move_to(&mut self, to: Position) {
        self.position = to;
        self.visited_positions.insert(to);
        self.energy = self.energy.saturating_sub(MOVE_COST);
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.energy == 0
    }

    /// Restores the initial state so the same creature can run another episode.
    pub fn reset(&mut self) {
        self.position = Position::default();
        self.orientation = Orientation::Up;
        self.age = 0;
        self.food_eaten = 0;
        self.visited_positions.clear();
        self.energy = self.max_energy;
    }
}
