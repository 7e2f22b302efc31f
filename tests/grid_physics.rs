mod common;

use common::EpisodeBuilder;
use qforage_lib::data::{Action, Cell, Orientation, Position};
use qforage_lib::error::ForageError;

#[test]
fn test_eating_food_ahead() {
    let mut world = EpisodeBuilder::new(9).with_energy(5).with_food(3, 4).build();
    assert_creature_at!(world, 4, 4);
    assert_eq!(world.creature().orientation, Orientation::Up);

    let result = world.step_code(1).expect("valid action");
    assert!(result.ate);
    assert_eq!(world.creature().food_eaten, 1);
    assert_eq!(world.creature().energy, 5 + 5 - 1);
    assert_creature_at!(world, 3, 4);
    assert_eq!(world.cell(Position::new(3, 4)), Some(Cell::Creature));
    assert_eq!(world.cell(Position::new(4, 4)), Some(Cell::Empty));
    assert!(world
        .creature()
        .visited_positions
        .contains(&Position::new(3, 4)));
}

#[test]
fn test_energy_depletes_and_stays_floored() {
    let mut world = EpisodeBuilder::new(9)
        .with_energy(5)
        .facing(Orientation::Right)
        .build();
    // Moving right from (4,4) has four cells of room; turn at the edge.
    let script = [
        Action::Forward,
        Action::Forward,
        Action::Forward,
        Action::Forward,
        Action::TurnRight,
        Action::Forward,
    ];
    for action in script {
        world.step(action);
    }
    assert_eq!(world.creature().energy, 0);
    assert!(world.creature().is_depleted());
    assert_creature_at!(world, 5, 8);

    // A depleted creature still acts; energy stays at zero.
    let result = world.step(Action::Forward);
    assert!(result.moved);
    assert_eq!(result.energy, 0);
    assert_creature_at!(world, 6, 8);
    assert_eq!(world.creature().age, 7);
}

#[test]
fn test_boundary_blocks_only_ages() {
    let mut world = EpisodeBuilder::new(3).build();
    world.step(Action::Forward);
    assert_creature_at!(world, 0, 1);
    let energy = world.creature().energy;
    let visited = world.creature().visited_positions.clone();

    for expected_age in 2..6u64 {
        let result = world.step(Action::Forward);
        assert!(!result.moved);
        assert_creature_at!(world, 0, 1);
        assert_eq!(world.creature().energy, energy);
        assert_eq!(world.creature().visited_positions, visited);
        assert_eq!(world.creature().age, expected_age);
    }
}

#[test]
fn test_walls_block_like_the_boundary() {
    let mut world = EpisodeBuilder::new(9).with_wall(3, 4).build();
    let result = world.step(Action::Forward);
    assert!(!result.moved);
    assert_creature_at!(world, 4, 4);
    assert_eq!(world.creature().energy, 5);
    assert_eq!(world.creature().age, 1);
}

#[test]
fn test_revisiting_does_not_grow_visited_set() {
    let mut world = EpisodeBuilder::new(9).with_energy(20).build();
    for action in [
        Action::Forward,
        Action::TurnLeft,
        Action::TurnLeft,
        Action::Forward,
        Action::TurnLeft,
        Action::TurnLeft,
        Action::Forward,
    ] {
        world.step(action);
    }
    assert_creature_at!(world, 3, 4);
    // (3,4) and the spawn cell (4,4) once walked back onto.
    assert_eq!(world.creature().visited_positions.len(), 2);
}

#[test]
fn test_food_generation_count() {
    for size in 2..=12usize {
        let world = EpisodeBuilder::new(size)
            .with_seed(size as u64)
            .with_random_food()
            .build();
        assert_eq!(world.food_remaining(), (size * size).div_ceil(9), "size {size}");
        assert_eq!(world.cell(world.creature().position), Some(Cell::Creature));
    }
}

#[test]
fn test_invalid_action_code() {
    let mut world = EpisodeBuilder::new(9).build();
    for code in [4u8, 7, 255] {
        assert!(matches!(
            world.step_code(code),
            Err(ForageError::InvalidAction(_))
        ));
    }
    assert_eq!(world.creature().age, 0);
}

#[test]
fn test_has_food_tracks_consumption() {
    let mut world = EpisodeBuilder::new(5).with_food(0, 2).build();
    assert!(world.has_food());
    world.step(Action::Forward);
    assert!(world.has_food());
    world.step(Action::Forward);
    assert!(!world.has_food());
    assert_in_bounds!(world);
}
