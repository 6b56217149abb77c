//! Interaction propagation across the live neighbour graph.
//!
//! Impact (shock/explosion) and conductive (electric) spread are both
//! depth-limited traversals over the 4-neighbour graph. The graph can
//! re-enter a previously visited cell through a different direction, so
//! both traversals run on an explicit work stack carrying the remaining
//! budget and arrival direction — bounded and cycle-safe by construction,
//! never unbounded recursion.

use crate::behaviour::Direction;
use crate::grid::Grid;

/// Hop budget of a gunpowder detonation burst.
pub const IMPACT_BUDGET: u32 = 4;

/// Velocity magnitude imparted along each axis of a detonation burst.
pub const IMPACT_POWER: f32 = 5.0;

struct Hop {
    x: i32,
    y: i32,
    budget: u32,
    /// Direction pointing back toward the cell the shock arrived from;
    /// excluded when expanding, preventing immediate backtracking.
    from: Direction,
}

/// Propagate a shock outward from `(x, y)`.
///
/// Every reached cell has its velocity set to `(vx, vy)` and its
/// durability reduced by the Euclidean magnitude of that velocity; a cell
/// whose durability is depleted and whose kind defines a destruction
/// transform gets its pending transform armed (applied at the next engine
/// visit). Cells may be reached more than once via different paths; the
/// hop budget bounds the traversal.
pub fn impact(grid: &mut Grid, x: i32, y: i32, budget: u32, vx: f32, vy: f32, from: Direction) {
    let magnitude = (vx * vx + vy * vy).sqrt();
    let mut stack = vec![Hop {
        x,
        y,
        budget,
        from,
    }];
    while let Some(hop) = stack.pop() {
        if hop.budget == 0 || !grid.in_bounds(hop.x, hop.y) {
            continue;
        }
        if let Some(cell) = grid.cell_mut(hop.x, hop.y) {
            cell.vx = vx;
            cell.vy = vy;
            cell.durability -= magnitude;
            if cell.durability <= 0.0 {
                if let Some(target) = cell.def().breaks_into {
                    cell.pending_transform = Some(target);
                }
            }
        }
        for dir in Direction::ALL {
            if dir == hop.from {
                continue;
            }
            let (dx, dy) = dir.delta();
            stack.push(Hop {
                x: hop.x + dx,
                y: hop.y + dy,
                budget: hop.budget - 1,
                from: dir.opposite(),
            });
        }
    }
}

/// Spread a conductive charge outward from `(x, y)`.
///
/// Restricted to conductive kinds: a cell's stored charge is raised to at
/// most `level`, and the spread short-circuits wherever the cell is
/// non-conductive or already at or above the requested level. No material
/// consumes the stored charge yet; this is the extension seam for powered
/// kinds.
pub fn conduct(grid: &mut Grid, x: i32, y: i32, level: u32) {
    let mut stack = vec![(x, y, level)];
    while let Some((cx, cy, level)) = stack.pop() {
        if level == 0 {
            continue;
        }
        let Some(cell) = grid.cell_mut(cx, cy) else {
            continue;
        };
        if !cell.def().conductive || cell.charge >= level {
            continue;
        }
        cell.charge = level;
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            stack.push((cx + dx, cy + dy, level - 1));
        }
    }
}
