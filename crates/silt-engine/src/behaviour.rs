//! Per-kind update rules.
//!
//! Each material's rule is the composition of a base motion component
//! (static, granular, liquid, rising) with an orthogonal flammability
//! post-step, dispatched on the kind's [`Motion`] tag. The update mutates
//! the cell's own state (velocity, flags, lifetime) and returns the desired
//! displacement for this tick plus any side effects on neighbouring cells,
//! which the engine applies through the grid.

use rand::Rng;
use smallvec::SmallVec;

use silt_core::{Cell, Material, Motion};

use crate::propagate::{IMPACT_BUDGET, IMPACT_POWER};

/// The four cardinal directions, y growing downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Toward negative y.
    Up,
    /// Toward positive x.
    Right,
    /// Toward positive y.
    Down,
    /// Toward negative x.
    Left,
}

impl Direction {
    /// All directions, in up/right/down/left order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// The unit offset of this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// The opposing direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

/// What an update rule needs to know about one neighbour.
#[derive(Clone, Copy, Debug)]
pub struct NeighbourInfo {
    /// The neighbour's kind.
    pub material: Material,
    /// The neighbour's move priority.
    pub move_priority: f32,
    /// Whether the neighbour accumulates burn.
    pub flammable: bool,
}

/// Transient view of a cell's four neighbours, recomputed every visit.
/// `None` slots are out of bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeighbourView {
    slots: [Option<NeighbourInfo>; 4],
}

impl NeighbourView {
    /// The neighbour in the given direction, if in bounds.
    pub fn get(&self, dir: Direction) -> Option<&NeighbourInfo> {
        self.slots[dir.index()].as_ref()
    }

    /// Record a neighbour.
    pub fn set(&mut self, dir: Direction, info: NeighbourInfo) {
        self.slots[dir.index()] = Some(info);
    }
}

/// A side effect on a neighbouring cell, applied by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    /// Raise the burn accumulation of the flammable neighbour in `0`.
    Burn(Direction),
    /// Launch an impact burst into the neighbour in `dir`.
    Burst {
        /// Direction of the targeted neighbour.
        dir: Direction,
        /// Velocity imparted to every cell the shock reaches.
        vx: f32,
        /// See `vx`.
        vy: f32,
        /// Hop budget of the shock.
        budget: u32,
    },
}

/// Result of one cell update: desired displacement plus side effects.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// Desired x displacement.
    pub dx: i32,
    /// Desired y displacement.
    pub dy: i32,
    /// Side effects for the engine to apply.
    pub effects: SmallVec<[Effect; 4]>,
}

/// Run one kind-dispatched update over the cell.
pub fn update<R: Rng>(cell: &mut Cell, view: &NeighbourView, rng: &mut R) -> UpdateOutcome {
    let def = cell.def();
    let mut effects: SmallVec<[Effect; 4]> = SmallVec::new();
    let (dx, dy) = match def.motion {
        Motion::Static => (0, 0),
        Motion::Granular => granular(cell, view),
        Motion::Liquid => liquid(cell, rng),
        Motion::Rising => rising(cell, view, rng, &mut effects),
    };

    // Flammability is layered on any base motion: once burn accumulation
    // reaches the threshold the cell ignites, and gunpowder additionally
    // detonates before catching fire.
    if def.flammable && cell.burn_level >= def.burn_threshold {
        if cell.material == Material::Gunpowder {
            for dir in Direction::ALL {
                let (ox, oy) = dir.delta();
                effects.push(Effect::Burst {
                    dir,
                    vx: ox as f32 * IMPACT_POWER,
                    vy: oy as f32 * IMPACT_POWER,
                    budget: IMPACT_BUDGET,
                });
            }
        }
        cell.on_fire = true;
    }

    UpdateOutcome { dx, dy, effects }
}

/// Granular motion: decay velocity, fall, and slide off a resting pile
/// toward a strictly lower-priority horizontal neighbour (right bias).
fn granular(cell: &mut Cell, view: &NeighbourView) -> (i32, i32) {
    let def = cell.def();
    cell.vx *= def.velocity_decay;
    cell.vy *= def.velocity_decay;
    let mut mvx = cell.vx;
    let mvy = cell.vy + def.gravity;
    if cell.grounded {
        let mine = def.move_priority;
        let lower = |info: Option<&NeighbourInfo>| {
            info.is_some_and(|n| n.move_priority < mine)
        };
        if lower(view.get(Direction::Right)) {
            mvx += 1.0;
        } else if lower(view.get(Direction::Left)) {
            mvx -= 1.0;
        }
    }
    (mvx as i32, mvy as i32)
}

/// Liquid motion: fall while airborne, spread randomly sideways when
/// grounded.
fn liquid<R: Rng>(cell: &mut Cell, rng: &mut R) -> (i32, i32) {
    let def = cell.def();
    cell.vx *= def.velocity_decay;
    cell.vy *= def.velocity_decay;
    let mut mvx = cell.vx;
    let mut mvy = cell.vy;
    if cell.grounded {
        if rng.gen::<f64>() < 0.5 {
            mvx -= 1.0;
        } else {
            mvx += 1.0;
        }
    } else {
        mvy += def.gravity;
    }
    (mvx as i32, mvy as i32)
}

/// Fire: upward-biased random walk with a finite lifetime, raising burn
/// accumulation on every flammable neighbour each tick.
fn rising<R: Rng>(
    cell: &mut Cell,
    view: &NeighbourView,
    rng: &mut R,
    effects: &mut SmallVec<[Effect; 4]>,
) -> (i32, i32) {
    let def = cell.def();
    cell.vx *= def.velocity_decay;
    cell.vy *= def.velocity_decay;
    let mut mvx = cell.vx;
    let mut mvy = cell.vy;
    cell.lifetime = cell.lifetime.saturating_sub(1);

    for dir in Direction::ALL {
        if view.get(dir).is_some_and(|n| n.flammable) {
            effects.push(Effect::Burn(dir));
        }
    }

    let r = rng.gen::<f64>();
    if r < 0.4 {
        mvy -= 1.0;
    } else if r < 0.7 {
        mvx += 1.0;
    } else if r < 0.98 {
        mvx -= 1.0;
    } else {
        cell.dead = true;
    }
    if cell.lifetime == 0 {
        cell.dead = true;
    }
    (mvx as i32, mvy as i32)
}
