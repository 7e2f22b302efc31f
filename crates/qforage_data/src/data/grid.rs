use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell coordinate, `(row, col)`, 0-indexed from the top-left corner.
///
/// Signed so that a neighbour one step past the boundary is representable and
/// can be rejected by a bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The position `distance` cells away along `(dr, dc)`.
    #[must_use]
    pub const fn offset(self, (dr, dc): (i32, i32), distance: i32) -> Self {
        Self {
            row: self.row + dr * distance,
            col: self.col + dc * distance,
        }
    }
}

/// Facing direction of the creature. Cyclic under turns (mod 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Orientation {
    const ALL: [Orientation; 4] = [
        Orientation::Up,
        Orientation::Right,
        Orientation::Down,
        Orientation::Left,
    ];

    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn turned_left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    #[must_use]
    pub fn turned_right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Row/column delta of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Orientation::Up => (-1, 0),
            Orientation::Right => (0, 1),
            Orientation::Down => (1, 0),
            Orientation::Left => (0, -1),
        }
    }

    /// Ray directions relative to this heading, in `(front, left, right)` order.
    #[must_use]
    pub fn sight_rays(self) -> [(i32, i32); 3] {
        [
            self.delta(),
            self.turned_left().delta(),
            self.turned_right().delta(),
        ]
    }
}

/// Contents of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Nothing here; transparent to sight.
    #[default]
    Empty,
    /// The creature's current cell.
    Creature,
    /// Edible food worth +5 energy.
    Food,
    /// Impassable; reads like the boundary in sight rays.
    Wall,
}

impl Cell {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Creature => 'C',
            Cell::Food => 'F',
            Cell::Wall => '#',
        }
    }
}

/// Rejected action code, i.e. anything outside `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid action code {0}, expected 0..=3")]
pub struct InvalidActionCode(pub u8);

/// One discrete creature action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Stay = 0,
    Forward = 1,
    TurnLeft = 2,
    TurnRight = 3,
}

impl Action {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Action {
    type Error = InvalidActionCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Stay),
            1 => Ok(Action::Forward),
            2 => Ok(Action::TurnLeft),
            3 => Ok(Action::TurnRight),
            other => Err(InvalidActionCode(other)),
        }
    }
}

/// Outcome of a single `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub action: Action,
    pub moved: bool,
    pub ate: bool,
    pub position: Position,
    pub orientation: Orientation,
    pub energy: u32,
    pub max_energy: u32,
}
