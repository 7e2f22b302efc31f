//! Error types for the qforage engine.
//!
//! Precondition failures (bad action codes, overfull grids) and recoverable
//! conditions (invalid genomes, bad configuration) share one enum so callers
//! can match on what happened.

use qforage_data::InvalidActionCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForageError {
    /// An action code outside `0..=3` reached the grid.
    #[error(transparent)]
    InvalidAction(#[from] InvalidActionCode),

    /// Not enough empty cells to place the requested food.
    #[error("cannot place {requested} food on {available} empty cells")]
    InsufficientSpace { requested: usize, available: usize },

    /// Parameters do not fit the declared policy family.
    #[error("Invalid genome: {0}")]
    InvalidGenome(String),

    /// Configuration values out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The policy backend failed while deciding.
    #[error("Policy evaluation failed: {0}")]
    Policy(String),

    /// The evaluation worker pool could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// A background task panicked or was aborted.
    #[error("Task join error: {0}")]
    Join(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ForageError>;

impl ForageError {
    #[must_use]
    pub fn invalid_genome<S: Into<String>>(msg: S) -> Self {
        Self::InvalidGenome(msg.into())
    }

    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    #[must_use]
    pub fn policy<S: Into<String>>(msg: S) -> Self {
        Self::Policy(msg.into())
    }
}
