//! Simulation engine for the Silt falling-sand world.
//!
//! Owns the grid and the tick loop: per-kind behaviour updates, movement
//! arbitration with tick-stamps, burn accumulation and ignition, and the
//! bounded impact/conductive propagation passes. The engine is strictly
//! single-threaded; concurrent front-ends queue commands and apply them
//! between ticks from the one thread that owns the [`TickEngine`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod behaviour;
pub mod config;
pub mod grid;
pub mod propagate;
pub mod region;
pub mod tick;

pub use behaviour::{Direction, NeighbourView};
pub use config::{ConfigError, WorldConfig};
pub use grid::Grid;
pub use propagate::{conduct, impact, IMPACT_BUDGET, IMPACT_POWER};
pub use region::RegionSnapshot;
pub use tick::{TickEngine, TickReport};
