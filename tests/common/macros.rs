/// Asserts that the creature is inside the grid.
#[macro_export]
macro_rules! assert_in_bounds {
    ($world:expr) => {
        let pos = $world.creature().position;
        assert!(
            $world.in_bounds(pos),
            "Creature at ({}, {}) left the grid:\n{}",
            pos.row,
            pos.col,
            $world
        );
    };
}

/// Asserts that the creature sits at `(row, col)`, printing the grid otherwise.
#[macro_export]
macro_rules! assert_creature_at {
    ($world:expr, $row:expr, $col:expr) => {
        assert_eq!(
            $world.creature().position,
            qforage_lib::data::Position::new($row, $col),
            "Creature misplaced:\n{}",
            $world
        );
    };
}

/// Asserts that a sequence of fitness values never decreases.
#[macro_export]
macro_rules! assert_non_decreasing {
    ($values:expr) => {
        let values: &[f64] = &$values;
        for pair in values.windows(2) {
            assert!(
                pair[1] >= pair[0],
                "Fitness dropped from {} to {} in {:?}",
                pair[0],
                pair[1],
                values
            );
        }
    };
}
