//! The cell grid: storage, bounded mutation entry points, and the
//! tick-stamp bookkeeping used for movement arbitration.

use silt_core::{Cell, Command, Material, PlaceMode, Rgb};

use crate::behaviour::{Direction, NeighbourInfo, NeighbourView};
use crate::config::{validate_dims, ConfigError};
use crate::region::RegionSnapshot;

/// Fixed-size 2D container of [`Cell`]s.
///
/// Cells are stored row-major with x outer and y inner, matching the wire
/// ordering of `sync_world` snapshots. All mutation entry points are
/// bounds-checked: out-of-range coordinates are silently ignored, never
/// read or written.
///
/// When journalling is enabled (see [`Grid::begin_journal`]), every
/// `set_material` and `swap` is also recorded as a [`Command`] so that a
/// replicated session can fan the tick's mutations out to its peers.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    stamp: u8,
    journal: Option<Vec<Command>>,
}

impl Grid {
    /// Create a grid filled with air.
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        validate_dims(width, height)?;
        let cells = vec![Cell::default(); (width as usize) * (height as usize)];
        Ok(Self {
            width,
            height,
            cells,
            stamp: 0,
            journal: None,
        })
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `(x, y)` lies inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (x as usize) * (self.height as usize) + (y as usize)
    }

    /// The cell at `(x, y)`, or `None` when out of bounds.
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.idx(x, y)])
        } else {
            None
        }
    }

    /// Mutable access to the cell at `(x, y)`, or `None` when out of bounds.
    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let i = self.idx(x, y);
            Some(&mut self.cells[i])
        } else {
            None
        }
    }

    /// In-bounds cell access for the engine's scan loop.
    pub(crate) fn at(&self, x: i32, y: i32) -> &Cell {
        &self.cells[self.idx(x, y)]
    }

    /// In-bounds mutable cell access for the engine's scan loop.
    pub(crate) fn at_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let i = self.idx(x, y);
        &mut self.cells[i]
    }

    /// The material at `(x, y)`; out-of-range reads as [`Material::Air`].
    pub fn material_at(&self, x: i32, y: i32) -> Material {
        self.cell(x, y).map_or(Material::Air, |c| c.material)
    }

    /// Place a material at `(x, y)`.
    ///
    /// `IfEmpty` mode only replaces air. The new cell is stamped with the
    /// current tick stamp, so it cannot also move in the tick that placed
    /// it. Out-of-range placements are ignored.
    pub fn set_material(&mut self, x: i32, y: i32, material: Material, mode: PlaceMode) {
        if let Some(journal) = &mut self.journal {
            journal.push(Command::SetBlock {
                x,
                y,
                material,
                mode,
            });
        }
        if !self.in_bounds(x, y) {
            return;
        }
        if mode == PlaceMode::IfEmpty && self.material_at(x, y) != Material::Air {
            return;
        }
        let stamp = self.stamp;
        let i = self.idx(x, y);
        let mut cell = Cell::new(material);
        cell.stamp = stamp;
        self.cells[i] = cell;
    }

    /// Exchange the contents of two cells, stamping both with the current
    /// tick stamp. Ignored if either coordinate is out of bounds.
    pub fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        if let Some(journal) = &mut self.journal {
            journal.push(Command::SwapBlock { x1, y1, x2, y2 });
        }
        if !self.in_bounds(x1, y1) || !self.in_bounds(x2, y2) {
            return;
        }
        let stamp = self.stamp;
        let (i, j) = (self.idx(x1, y1), self.idx(x2, y2));
        self.cells.swap(i, j);
        self.cells[i].stamp = stamp;
        self.cells[j].stamp = stamp;
    }

    /// Whether a move from `(x, y)` by `(dx, dy)` is permitted this tick:
    /// both cells in bounds, neither already touched this tick, and the
    /// destination strictly lower-priority than the source.
    pub fn can_move(&self, x: i32, y: i32, dx: i32, dy: i32) -> bool {
        let (tx, ty) = (x + dx, y + dy);
        if !self.in_bounds(x, y) || !self.in_bounds(tx, ty) {
            return false;
        }
        let src = self.at(x, y);
        let dst = self.at(tx, ty);
        src.stamp != self.stamp
            && dst.stamp != self.stamp
            && dst.def().move_priority < src.def().move_priority
    }

    /// Reset every cell to air.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    /// The current tick stamp.
    pub fn stamp(&self) -> u8 {
        self.stamp
    }

    /// Advance the tick stamp. Called once at the start of every tick; the
    /// only property relied upon is that the new stamp differs from every
    /// stamp written during the previous tick.
    pub(crate) fn advance_stamp(&mut self) -> u8 {
        self.stamp = self.stamp.wrapping_add(1);
        self.stamp
    }

    /// Start recording mutations. Any previously recorded commands are
    /// discarded.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Stop recording and return the mutations recorded since
    /// [`begin_journal`](Grid::begin_journal).
    pub fn take_journal(&mut self) -> Vec<Command> {
        self.journal.take().unwrap_or_default()
    }

    /// The render colour of `(x, y)`, or `None` when the cell is invisible
    /// or out of bounds. This is the sole interface the external renderer
    /// consumes.
    pub fn render(&self, x: i32, y: i32) -> Option<Rgb> {
        let cell = self.cell(x, y)?;
        let def = cell.def();
        def.visible.then_some(def.color)
    }

    /// Transient view of the four neighbours of `(x, y)`, in
    /// up/right/down/left order. Recomputed from current grid contents on
    /// every engine visit; never persisted.
    pub(crate) fn neighbour_view(&self, x: i32, y: i32) -> NeighbourView {
        let mut view = NeighbourView::default();
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            if let Some(cell) = self.cell(x + dx, y + dy) {
                let def = cell.def();
                view.set(
                    dir,
                    NeighbourInfo {
                        material: cell.material,
                        move_priority: def.move_priority,
                        flammable: def.flammable,
                    },
                );
            }
        }
        view
    }

    // ── snapshots ────────────────────────────────────────────────

    /// Snapshot the whole grid's material layout.
    pub fn export(&self) -> RegionSnapshot {
        self.copy_region(0, 0, self.width, self.height)
    }

    /// Re-apply a full-grid snapshot. Cells outside the snapshot's extent
    /// are left untouched; air cells in the snapshot clear their targets.
    pub fn import(&mut self, snapshot: &RegionSnapshot) {
        for x in 0..snapshot.width as i32 {
            for y in 0..snapshot.height as i32 {
                self.set_material(x, y, snapshot.get(x, y), PlaceMode::Force);
            }
        }
    }

    /// Copy a `width` × `height` rectangle anchored at `(x, y)`.
    /// Out-of-range source cells read as air.
    pub fn copy_region(&self, x: i32, y: i32, width: u32, height: u32) -> RegionSnapshot {
        let mut ids = Vec::with_capacity((width as usize) * (height as usize));
        for dx in 0..width as i32 {
            for dy in 0..height as i32 {
                ids.push(self.material_at(x + dx, y + dy));
            }
        }
        RegionSnapshot { width, height, ids }
    }

    /// Paste a snapshot with its centre anchored at `(x, y)`. Air cells in
    /// the source are skipped, leaving prior content untouched (additive
    /// paste).
    pub fn paste_region(&mut self, x: i32, y: i32, snapshot: &RegionSnapshot) {
        let start_x = x - snapshot.width as i32 / 2;
        let start_y = y - snapshot.height as i32 / 2;
        for dx in 0..snapshot.width as i32 {
            for dy in 0..snapshot.height as i32 {
                let material = snapshot.get(dx, dy);
                if material != Material::Air {
                    self.set_material(start_x + dx, start_y + dy, material, PlaceMode::Force);
                }
            }
        }
    }
}
