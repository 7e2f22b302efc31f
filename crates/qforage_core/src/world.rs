//! The bounded grid and the physics of a single discrete step.
//!
//! Each `GridWorld` owns its random source. Nothing here touches global
//! randomness, so many worlds can be simulated side by side on worker threads
//! and still reproduce exactly from their seeds.

use crate::creature::Creature;
use crate::error::{ForageError, Result};
use crate::sensory;
use qforage_data::{Action, Cell, Position, Sight, StepResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;

pub struct GridWorld {
    size: usize,
    cells: Vec<Cell>,
    creature: Creature,
    rng: ChaCha8Rng,
}

impl GridWorld {
    /// Builds a `size` x `size` grid with the creature at the centre cell.
    ///
    /// The creature's energy is reset to `max_energy`. With `seed == None`
    /// the world draws its random source from system entropy.
    pub fn new(
        mut creature: Creature,
        size: usize,
        seed: Option<u64>,
        max_energy: u32,
        wall_density: f64,
    ) -> Result<Self> {
        if size == 0 {
            return Err(ForageError::invalid_config("grid size must be at least 1"));
        }
        if !(0.0..1.0).contains(&wall_density) {
            return Err(ForageError::invalid_config(format!(
                "wall_density must be in [0, 1), got {wall_density}"
            )));
        }

        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let centre = (size / 2) as i32;
        creature.position = Position::new(centre, centre);
        creature.max_energy = max_energy;
        creature.energy = max_energy;

        let mut world = Self {
            size,
            cells: vec![Cell::Empty; size * size],
            creature,
            rng,
        };
        let start = world.creature.position;
        world.set(start, Cell::Creature);

        if wall_density > 0.0 {
            let empties = world.empty_positions();
            let count = (wall_density * empties.len() as f64).round() as usize;
            let chosen: Vec<Position> = empties
                .choose_multiple(&mut world.rng, count)
                .copied()
                .collect();
            for pos in chosen {
                world.set(pos, Cell::Wall);
            }
        }

        Ok(world)
    }

    /// Number of food cells `generate_food` places: `ceil(size² / 9)`.
    #[must_use]
    pub fn food_target(&self) -> usize {
        (self.size * self.size).div_ceil(9)
    }

    /// Marks `food_target()` distinct empty cells, sampled without replacement, as food.
    pub fn generate_food(&mut self) -> Result<usize> {
        let requested = self.food_target();
        let empties = self.empty_positions();
        if empties.len() < requested {
            return Err(ForageError::InsufficientSpace {
                requested,
                available: empties.len(),
            });
        }
        let chosen: Vec<Position> = empties
            .choose_multiple(&mut self.rng, requested)
            .copied()
            .collect();
        for pos in chosen {
            self.set(pos, Cell::Food);
        }
        Ok(requested)
    }

    /// Applies one action.
    ///
    /// A depleted creature still acts; ending the episode on zero energy is
    /// the caller's job.
    pub fn step(&mut self, action: Action) -> StepResult {
        let mut ate = false;
        let mut moved = false;

        match action {
            Action::Stay => {}
            Action::Forward => {
                let target = self.creature.forward_position();
                match self.cell(target) {
                    None | Some(Cell::Wall) => {}
                    Some(cell) => {
                        if cell == Cell::Food {
                            ate = true;
                            self.creature.eat();
                        }
                        let from = self.creature.position;
                        self.set(from, Cell::Empty);
                        self.set(target, Cell::Creature);
                        self.creature.move_to(target);
                        moved = true;
                    }
                }
            }
            Action::TurnLeft => self.creature.turn_left(),
            Action::TurnRight => self.creature.turn_right(),
        }

        self.creature.age += 1;

        StepResult {
            action,
            moved,
            ate,
            position: self.creature.position,
            orientation: self.creature.orientation,
            energy: self.creature.energy,
            max_energy: self.creature.max_energy,
        }
    }

    /// Like [`GridWorld::step`] for a raw action code.
    pub fn step_code(&mut self, code: u8) -> Result<StepResult> {
        let action = Action::try_from(code)?;
        Ok(self.step(action))
    }

    #[must_use]
    pub fn has_food(&self) -> bool {
        self.cells.contains(&Cell::Food)
    }

    #[must_use]
    pub fn food_remaining(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Food).count()
    }

    #[must_use]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.size && (pos.col as usize) < self.size
    }

    /// Cell contents, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.in_bounds(pos).then(|| self.cells[self.index(pos)])
    }

    /// Overwrites a cell. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx] = cell;
        }
    }

    /// Every empty cell in row-major order.
    #[must_use]
    pub fn empty_positions(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == Cell::Empty)
            .map(|(i, _)| Position::new((i / self.size) as i32, (i % self.size) as i32))
            .collect()
    }

    /// The `(front, left, right)` proximity signals over `range` cells.
    #[must_use]
    pub fn sight(&self, range: usize) -> Sight {
        sensory::encode(self, range)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Row-major cell contents.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn creature(&self) -> &Creature {
        &self.creature
    }

    #[must_use]
    pub fn into_creature(self) -> Creature {
        self.creature
    }

    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.size + pos.col as usize
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridWorld")
            .field("size", &self.size)
            .field("position", &self.creature.position)
            .field("orientation", &self.creature.orientation)
            .field("energy", &self.creature.energy)
            .finish_non_exhaustive()
    }
}
