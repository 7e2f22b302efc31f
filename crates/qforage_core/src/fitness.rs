//! Episodes and the scalar reward used for selection.
//!
//! An [`Episode`] owns its world outright. The optimizer builds one per
//! evaluated repeat and the replay loop builds one per restart; nothing is
//! shared between them except the read-only genome.

use crate::config::SimulationConfig;
use crate::creature::Creature;
use crate::error::Result;
use crate::policy::Policy;
use crate::world::GridWorld;
use qforage_data::{Frame, Genome, StepResult};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const FOOD_REWARD: f64 = 100.0;
pub const CLEAR_BONUS: f64 = 1000.0;
pub const SURVIVAL_BONUS: f64 = 20.0;
pub const DEPLETION_PENALTY: f64 = -50.0;

/// One bounded run of the grid under a fixed genome and seed.
#[derive(Debug)]
pub struct Episode {
    world: GridWorld,
    vision_range: usize,
    step_budget: Option<usize>,
    steps_taken: usize,
}

impl Episode {
    /// Builds a fresh world for `genome`, places food and arms a step budget of `config.steps`.
    pub fn new(genome: Arc<Genome>, seed: Option<u64>, config: &SimulationConfig) -> Result<Self> {
        let creature = Creature::new(genome, config.max_moves);
        let mut world = GridWorld::new(
            creature,
            config.grid_size,
            seed,
            config.max_moves,
            config.wall_density,
        )?;
        world.generate_food()?;
        Ok(Self {
            world,
            vision_range: config.vision_range,
            step_budget: Some(config.steps),
            steps_taken: 0,
        })
    }

    /// Drops the step budget; the episode then ends only on depletion or a cleared grid.
    #[must_use]
    pub fn without_step_limit(mut self) -> Self {
        self.step_budget = None;
        self
    }

    /// Senses, asks `policy` for an action and applies it.
    pub fn advance(&mut self, policy: &dyn Policy) -> Result<StepResult> {
        let sight = self.world.sight(self.vision_range);
        let genome = Arc::clone(&self.world.creature().genome);
        let action = policy.decide(&genome, sight)?;
        self.steps_taken += 1;
        Ok(self.world.step(action))
    }

    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.step_budget.is_some_and(|b| self.steps_taken >= b)
    }

    /// Evaluation end: budget spent or energy gone.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.budget_exhausted() || self.world.creature().is_depleted()
    }

    /// Replay end: energy gone or nothing left to eat.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.world.creature().is_depleted() || !self.world.has_food()
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        score(self.world.creature(), self.world.food_remaining())
    }

    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    #[must_use]
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    #[must_use]
    pub fn creature(&self) -> &Creature {
        self.world.creature()
    }

    /// Snapshot for observers, tagged with the champion's generation.
    #[must_use]
    pub fn frame(&self, generation: usize) -> Frame {
        let c = self.world.creature();
        Frame {
            position: c.position,
            orientation: c.orientation,
            food_eaten: c.food_eaten,
            energy: c.energy,
            max_energy: c.max_energy,
            age: c.age,
            grid_size: self.world.size(),
            grid: self.world.cells().to_vec(),
            fitness: self.fitness(),
            generation,
        }
    }

    #[must_use]
    pub fn into_creature(self) -> Creature {
        self.world.into_creature()
    }
}

/// Reward for a creature given how much food is still on the grid.
///
/// `food * 100 + |visited|`, plus 1000 when everything that was ever on the
/// grid got eaten, plus 20 while energy remains or minus 50 once depleted.
#[must_use]
pub fn score(creature: &Creature, food_remaining: usize) -> f64 {
    let eaten = u64::from(creature.food_eaten);
    let total_food = eaten + food_remaining as u64;
    let mut fitness = eaten as f64 * FOOD_REWARD + creature.visited_positions.len() as f64;
    if eaten >= total_food {
        fitness += CLEAR_BONUS;
    }
    fitness += if creature.is_depleted() {
        DEPLETION_PENALTY
    } else {
        SURVIVAL_BONUS
    };
    fitness
}

/// Runs one evaluation episode and returns the terminal creature with its fitness.
pub fn simulate(
    genome: Arc<Genome>,
    policy: &dyn Policy,
    seed: Option<u64>,
    config: &SimulationConfig,
) -> Result<(Creature, f64)> {
    let mut episode = Episode::new(genome, seed, config)?;
    while !episode.is_over() {
        episode.advance(policy)?;
    }
    let fitness = episode.fitness();
    Ok((episode.into_creature(), fitness))
}

/// Seed for repeat `repeat` of `genome`.
///
/// Derived only from the gene values, so equal genomes always replay the same
/// worlds. Truncated to 32 bits.
#[must_use]
pub fn genome_seed(genome: &Genome, repeat: usize) -> u64 {
    let mut hasher = Sha256::new();
    for gene in genome.genes() {
        hasher.update(gene.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head).wrapping_add(repeat as u64) & 0xFFFF_FFFF
}

/// Mean fitness over `repeats` episodes seeded by [`genome_seed`].
pub fn evaluate_average(
    genome: &Arc<Genome>,
    policy: &dyn Policy,
    repeats: usize,
    config: &SimulationConfig,
) -> Result<f64> {
    let repeats = repeats.max(1);
    let mut total = 0.0;
    for r in 0..repeats {
        let seed = genome_seed(genome, r);
        let (_, fitness) = simulate(Arc::clone(genome), policy, Some(seed), config)?;
        total += fitness;
    }
    Ok(total / repeats as f64)
}
