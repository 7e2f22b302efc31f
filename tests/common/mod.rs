pub mod macros;

use qforage_lib::config::AppConfig;
use qforage_lib::data::{Action, Cell, Genome, Orientation, PolicyFamily, Position, Sight};
use qforage_lib::error::{ForageError, Result};
use qforage_lib::creature::Creature;
use qforage_lib::policy::Policy;
use qforage_lib::world::GridWorld;
use rand::RngCore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type CellMod = Box<dyn FnOnce(&mut GridWorld)>;

/// Builds grids with hand-placed food and walls.
#[allow(dead_code)]
pub struct EpisodeBuilder {
    size: usize,
    max_energy: u32,
    seed: u64,
    orientation: Orientation,
    random_food: bool,
    cell_mods: Vec<CellMod>,
}

#[allow(dead_code)]
impl EpisodeBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            max_energy: 5,
            seed: 42,
            orientation: Orientation::Up,
            random_food: false,
            cell_mods: Vec::new(),
        }
    }

    pub fn with_energy(mut self, max_energy: u32) -> Self {
        self.max_energy = max_energy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn facing(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_random_food(mut self) -> Self {
        self.random_food = true;
        self
    }

    pub fn with_food(mut self, row: i32, col: i32) -> Self {
        self.cell_mods
            .push(Box::new(move |w| w.set(Position::new(row, col), Cell::Food)));
        self
    }

    pub fn with_wall(mut self, row: i32, col: i32) -> Self {
        self.cell_mods
            .push(Box::new(move |w| w.set(Position::new(row, col), Cell::Wall)));
        self
    }

    pub fn build(self) -> GridWorld {
        let mut creature = Creature::new(zero_quantum(), self.max_energy);
        creature.orientation = self.orientation;
        let mut world = GridWorld::new(creature, self.size, Some(self.seed), self.max_energy, 0.0)
            .expect("valid grid");
        if self.random_food {
            world.generate_food().expect("room for food");
        }
        for m in self.cell_mods {
            m(&mut world);
        }
        world
    }
}

#[allow(dead_code)]
pub fn zero_quantum() -> Arc<Genome> {
    Arc::new(Genome::Quantum {
        angles: vec![0.0; 20],
    })
}

/// A config small enough for integration tests to run quickly.
#[allow(dead_code)]
pub fn quick_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.seed = Some(seed);
    config.simulation.steps = 25;
    config.evolution.generations = 3;
    config.evolution.children = 3;
    config.evolution.elites = 2;
    config.evolution.repeats = 2;
    config.evolution.workers = 2;
    config.replay.tick_interval_ms = 5;
    config
}

/// Plays a fixed action sequence, cycling, ignoring the genome and sight.
#[allow(dead_code)]
pub struct ScriptedPolicy {
    script: Vec<Action>,
    cursor: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedPolicy {
    pub fn new(script: Vec<Action>) -> Self {
        assert!(!script.is_empty());
        Self {
            script,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn always(action: Action) -> Self {
        Self::new(vec![action])
    }
}

impl Policy for ScriptedPolicy {
    fn family(&self) -> PolicyFamily {
        PolicyFamily::Quantum
    }

    fn validate(&self, _genome: &Genome) -> Result<()> {
        Ok(())
    }

    fn decide(&self, _genome: &Genome, _sight: Sight) -> Result<Action> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(self.script[i % self.script.len()])
    }

    fn mutate(&self, genome: &Genome, _: f64, _: f64, _: &mut dyn RngCore) -> Result<Genome> {
        Ok(genome.clone())
    }

    fn random_genome(&self, _rng: &mut dyn RngCore) -> Genome {
        Genome::Quantum {
            angles: vec![0.0; 20],
        }
    }
}

/// Always stays put, so every genome scores the same.
#[allow(dead_code)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn family(&self) -> PolicyFamily {
        PolicyFamily::Quantum
    }

    fn validate(&self, _genome: &Genome) -> Result<()> {
        Ok(())
    }

    fn decide(&self, _genome: &Genome, _sight: Sight) -> Result<Action> {
        Ok(Action::Stay)
    }

    fn mutate(&self, genome: &Genome, _: f64, sigma: f64, rng: &mut dyn RngCore) -> Result<Genome> {
        let mut child = genome.clone();
        child.for_each_gene_mut(|g| *g += sigma * (rng.next_u32() as f64 / u32::MAX as f64));
        Ok(child)
    }

    fn random_genome(&self, rng: &mut dyn RngCore) -> Genome {
        Genome::Quantum {
            angles: vec![rng.next_u32() as f64],
        }
    }
}

/// Fails every decision, standing in for a broken evaluator backend.
#[allow(dead_code)]
pub struct FailingPolicy;

impl Policy for FailingPolicy {
    fn family(&self) -> PolicyFamily {
        PolicyFamily::Quantum
    }

    fn validate(&self, _genome: &Genome) -> Result<()> {
        Ok(())
    }

    fn decide(&self, _genome: &Genome, _sight: Sight) -> Result<Action> {
        Err(ForageError::policy("backend offline"))
    }

    fn mutate(&self, genome: &Genome, _: f64, _: f64, _: &mut dyn RngCore) -> Result<Genome> {
        Ok(genome.clone())
    }

    fn random_genome(&self, _rng: &mut dyn RngCore) -> Genome {
        Genome::Quantum {
            angles: vec![0.0; 20],
        }
    }
}
