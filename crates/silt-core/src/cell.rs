//! Mutable per-cell particle state.

use crate::material::{Material, MaterialDef};

/// One grid slot: a material kind plus its dynamic sub-state.
///
/// A cell never changes its implementing type at runtime; destruction and
/// ignition replace the slot's kind and reset the dynamic fields (see
/// [`Cell::new`]). Neighbour references are not stored here — they are a
/// transient view recomputed by the engine on every visit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// The material kind occupying this slot.
    pub material: Material,
    /// Horizontal velocity, positive rightward.
    pub vx: f32,
    /// Vertical velocity, positive downward.
    pub vy: f32,
    /// Remaining impact budget; depletion arms `pending_transform`.
    pub durability: f32,
    /// Burn accumulation; compared against the kind's burn threshold.
    pub burn_level: u32,
    /// Remaining ticks for transient kinds; unused otherwise.
    pub lifetime: u32,
    /// Marked for removal at the next engine visit.
    pub dead: bool,
    /// Ignited; the next engine visit replaces this cell with fire or air.
    pub on_fire: bool,
    /// Whether the cell rests on something at least as dense as itself.
    pub grounded: bool,
    /// Tick stamp of the last mutation, for the one-swap-per-tick check.
    pub stamp: u8,
    /// Destruction transform armed by impact propagation, applied in place
    /// at the next engine visit.
    pub pending_transform: Option<Material>,
    /// Conductive charge level left by conductive propagation.
    pub charge: u32,
}

impl Cell {
    /// A fresh cell of the given kind, with dynamic state reset from the
    /// kind's [`MaterialDef`].
    pub fn new(material: Material) -> Self {
        let def = material.def();
        Self {
            material,
            vx: 0.0,
            vy: 0.0,
            durability: def.durability,
            burn_level: 0,
            lifetime: def.lifetime.unwrap_or(0),
            dead: false,
            on_fire: false,
            grounded: false,
            stamp: 0,
            pending_transform: None,
            charge: 0,
        }
    }

    /// Whether this slot holds the empty kind.
    pub fn is_empty(&self) -> bool {
        self.material == Material::Air
    }

    /// Shorthand for the kind's static parameters.
    pub fn def(&self) -> &'static MaterialDef {
        self.material.def()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(Material::Air)
    }
}
