//! The tick engine: one synchronous grid pass per call.
//!
//! Cells are visited in a fixed raster order (all x, inner loop all y) and
//! swapped in place, so a cell that has already moved may be re-visited
//! later in the same pass at its new location; the tick-stamp check is what
//! prevents a double move, not the ordering. Each visit runs the sequence:
//! behaviour update, neighbour view, dead-cell reap, fire replacement,
//! pending destruction transform, grounded update, movement arbitration.
//!
//! The engine is single-threaded by design: in a replicated session all
//! remote mutations are queued and applied between ticks by the session
//! thread, which is the grid's only writer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use silt_core::{Command, Material, PlaceMode};

use crate::behaviour::{self, Effect};
use crate::config::{ConfigError, WorldConfig};
use crate::grid::Grid;
use crate::propagate;

/// Result of one tick.
#[derive(Debug)]
pub struct TickReport {
    /// Cells affected this tick, in visit order (swap destinations
    /// precede their sources). The renderer redraws these.
    pub touched: Vec<(i32, i32)>,
    /// Grid mutations performed by the tick, for replication fan-out.
    pub mutations: Vec<Command>,
}

/// Owns the grid and drives the simulation.
///
/// All stochastic rules draw from a single ChaCha8 RNG seeded from the
/// world config, so a fixed seed and command sequence replays identically.
pub struct TickEngine {
    grid: Grid,
    rng: ChaCha8Rng,
    tick_id: u64,
}

impl TickEngine {
    /// Build an engine from a validated config.
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: Grid::new(config.width, config.height)?,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick_id: 0,
        })
    }

    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access to the grid, for the session's command entry points.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Number of completed ticks.
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Run one full grid pass.
    pub fn tick(&mut self) -> TickReport {
        self.grid.advance_stamp();
        self.grid.begin_journal();
        self.tick_id += 1;

        let mut touched = Vec::new();
        let (width, height) = (self.grid.width() as i32, self.grid.height() as i32);
        for x in 0..width {
            for y in 0..height {
                if self.grid.at(x, y).is_empty() {
                    continue;
                }
                self.visit(x, y, &mut touched);
            }
        }

        TickReport {
            touched,
            mutations: self.grid.take_journal(),
        }
    }

    fn visit(&mut self, x: i32, y: i32, touched: &mut Vec<(i32, i32)>) {
        // Behaviour update over a copy of the cell; the view serves both
        // the update rule and the engine's own checks below.
        let view = self.grid.neighbour_view(x, y);
        let mut cell = *self.grid.at(x, y);
        let outcome = behaviour::update(&mut cell, &view, &mut self.rng);
        *self.grid.at_mut(x, y) = cell;

        // Side effects may loop back into this cell (an impact burst can
        // re-enter through a different direction), so re-read afterwards.
        self.apply_effects(x, y, &outcome.effects);
        let cell = *self.grid.at(x, y);

        if cell.dead {
            self.grid.set_material(x, y, Material::Air, PlaceMode::Force);
            touched.push((x, y));
            return;
        }

        if cell.on_fire {
            let replacement = if self.rng.gen::<f64>() < cell.def().ignition_chance {
                Material::Fire
            } else {
                Material::Air
            };
            self.grid.set_material(x, y, replacement, PlaceMode::Force);
        }

        if let Some(target) = self.grid.at(x, y).pending_transform {
            self.grid.set_material(x, y, target, PlaceMode::Force);
        }

        // Grounded: the cell below is out of bounds or at least as dense.
        let priority = self.grid.at(x, y).def().move_priority;
        let grounded = match self.grid.cell(x, y + 1) {
            None => true,
            Some(below) => below.def().move_priority >= priority,
        };
        self.grid.at_mut(x, y).grounded = grounded;

        let (dx, dy) = (outcome.dx, outcome.dy);
        if self.grid.can_move(x, y, dx, dy) {
            self.grid.swap(x, y, x + dx, y + dy);
            touched.push((x + dx, y + dy));
        } else {
            // Anti-jitter against walls: halve the dominant velocity axis.
            let cell = self.grid.at_mut(x, y);
            if dx.abs() > dy.abs() {
                cell.vx *= 0.5;
            } else {
                cell.vy *= 0.5;
            }
        }
        touched.push((x, y));
    }

    fn apply_effects(&mut self, x: i32, y: i32, effects: &[Effect]) {
        for effect in effects {
            match *effect {
                Effect::Burn(dir) => {
                    let (dx, dy) = dir.delta();
                    if let Some(cell) = self.grid.cell_mut(x + dx, y + dy) {
                        if cell.def().flammable {
                            cell.burn_level += 1;
                        }
                    }
                }
                Effect::Burst {
                    dir,
                    vx,
                    vy,
                    budget,
                } => {
                    let (dx, dy) = dir.delta();
                    propagate::impact(
                        &mut self.grid,
                        x + dx,
                        y + dy,
                        budget,
                        vx,
                        vy,
                        dir.opposite(),
                    );
                }
            }
        }
    }
}
