//! Orientation-relative sight, the only view a policy gets of the grid.
//!
//! Each of the three rays (front, left, right) is scanned outward from the
//! creature. The first food or blocking cell ends the scan: food at 0-indexed
//! step `i` reads `+(n - i) / n`, a wall or the boundary reads `-(n - i) / n`,
//! and a ray with neither in range reads `0`.

use crate::world::GridWorld;
use qforage_data::{Cell, Position, Sight};

pub fn encode(world: &GridWorld, range: usize) -> Sight {
    if range == 0 {
        return Sight::default();
    }
    let creature = world.creature();
    let [front, left, right] = creature.orientation.sight_rays();
    Sight {
        front: scan_ray(world, creature.position, front, range),
        left: scan_ray(world, creature.position, left, range),
        right: scan_ray(world, creature.position, right, range),
    }
}

fn scan_ray(world: &GridWorld, origin: Position, direction: (i32, i32), range: usize) -> f64 {
    let n = range as f64;
    for i in 0..range {
        let proximity = (n - i as f64) / n;
        match world.cell(origin.offset(direction, i as i32 + 1)) {
            Some(Cell::Food) => return proximity,
            None | Some(Cell::Wall) => return -proximity,
            Some(Cell::Empty) | Some(Cell::Creature) => {}
        }
    }
    0.0
}
