//! World configuration and validation.

use std::error::Error;
use std::fmt;

/// Construction parameters for a simulation world.
///
/// Validated once at engine construction; the grid is resized only by
/// building a new world from a new config.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Seed for the simulation RNG. Identical seeds and identical command
    /// sequences produce identical tick outcomes.
    pub seed: u64,
    /// Capacity of the session's inbound command queue.
    pub max_queue: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 100,
            seed: 0,
            max_queue: 1024,
        }
    }
}

impl WorldConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dims(self.width, self.height)?;
        if self.max_queue == 0 {
            return Err(ConfigError::QueueCapacityZero);
        }
        Ok(())
    }
}

/// Shared dimension checks for [`WorldConfig`] and direct grid construction.
pub(crate) fn validate_dims(width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::EmptyGrid);
    }
    let cells = u64::from(width) * u64::from(height);
    if cells > u64::from(u32::MAX) {
        return Err(ConfigError::GridTooLarge { cells });
    }
    Ok(())
}

/// Errors detected during [`WorldConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Either grid dimension is zero.
    EmptyGrid,
    /// The cell count does not fit the wire snapshot format.
    GridTooLarge {
        /// The offending cell count.
        cells: u64,
    },
    /// The inbound command queue capacity is zero.
    QueueCapacityZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => write!(f, "grid dimensions must be non-zero"),
            Self::GridTooLarge { cells } => {
                write!(f, "grid has {cells} cells, exceeding the u32 limit")
            }
            Self::QueueCapacityZero => write!(f, "command queue capacity must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
