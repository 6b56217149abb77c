//! The material registry: particle kinds and their immutable parameters.
//!
//! Every cell in the grid carries a [`Material`] tag; all per-kind rule
//! parameters live in a single static [`MaterialDef`] table shared by every
//! cell of that kind. Behaviour is decomposed into an orthogonal capability
//! set — a base [`Motion`] component plus flammability and conductivity
//! flags — rather than a kind hierarchy.

use std::fmt;

/// An opaque 8-bit RGB colour, consumed by the external renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// Base motion component of a material kind.
///
/// Granular and liquid motion share the velocity/gravity core and differ
/// only in their grounded behaviour; `Rising` is the transient fire walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    /// Never moves on its own.
    Static,
    /// Falls under gravity; slides toward a displaceable horizontal
    /// neighbour when grounded (sand-like).
    Granular,
    /// Falls under gravity; spreads randomly left/right when grounded.
    Liquid,
    /// Random walk biased upward, with a finite lifetime (fire).
    Rising,
}

/// A material kind. The discriminant is the wire id used by the
/// replication protocol and region snapshots.
///
/// # Examples
///
/// ```
/// use silt_core::Material;
///
/// assert_eq!(Material::Sand.id(), 2);
/// assert_eq!(Material::from_id(2), Material::Sand);
/// // Unknown ids resolve to the empty kind.
/// assert_eq!(Material::from_id(200), Material::Air);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Material {
    /// The empty kind. Invisible, always displaceable.
    Air = 0,
    /// Static solid; shatters into sand under enough impact.
    Stone = 1,
    /// Granular solid.
    Sand = 2,
    /// Liquid.
    Water = 3,
    /// Transient flame.
    Fire = 4,
    /// Static flammable solid; burns down to wood dust.
    Wood = 5,
    /// Flammable liquid; ignites on contact.
    Oil = 6,
    /// Granular explosive; detonates an impact burst on ignition.
    Gunpowder = 7,
    /// Hair-trigger static flammable (burn threshold 1).
    Fuse = 8,
    /// Inert conductive solid.
    Iron = 9,
    /// Flammable granular solid.
    WoodDust = 10,
}

/// Immutable per-kind parameters, shared by all cells of that kind.
#[derive(Clone, Copy, Debug)]
pub struct MaterialDef {
    /// Base render colour.
    pub color: Rgb,
    /// Whether the renderer should draw cells of this kind at all.
    pub visible: bool,
    /// Density-like scalar arbitrating displacement: a cell may move into
    /// a neighbour only if the neighbour's priority is strictly lower.
    pub move_priority: f32,
    /// Downward acceleration added per tick while falling.
    pub gravity: f32,
    /// Multiplicative velocity decay applied at the start of each update.
    pub velocity_decay: f32,
    /// Base motion component.
    pub motion: Motion,
    /// Whether adjacency to fire accumulates burn on this kind.
    pub flammable: bool,
    /// Burn accumulation at which the cell catches fire.
    pub burn_threshold: u32,
    /// Probability that an on-fire cell is replaced by fire rather than
    /// vanishing.
    pub ignition_chance: f64,
    /// Whether conductive propagation passes through this kind.
    pub conductive: bool,
    /// Impact budget; depletion triggers the destruction transform.
    pub durability: f32,
    /// Kind this cell turns into when its durability is depleted.
    pub breaks_into: Option<Material>,
    /// Tick lifetime for transient kinds.
    pub lifetime: Option<u32>,
}

const BASE: MaterialDef = MaterialDef {
    color: rgb(0, 0, 0),
    visible: true,
    move_priority: 100.0,
    gravity: 1.0,
    velocity_decay: 0.99,
    motion: Motion::Static,
    flammable: false,
    burn_threshold: 10,
    ignition_chance: 0.0,
    conductive: false,
    durability: 10_000.0,
    breaks_into: None,
    lifetime: None,
};

/// Static parameter table, indexed by wire id.
const DEFS: [MaterialDef; 11] = [
    // Air
    MaterialDef {
        color: rgb(255, 255, 255),
        visible: false,
        move_priority: 0.0,
        ..BASE
    },
    // Stone
    MaterialDef {
        color: rgb(100, 100, 100),
        durability: 200.0,
        breaks_into: Some(Material::Sand),
        ..BASE
    },
    // Sand
    MaterialDef {
        color: rgb(220, 200, 170),
        move_priority: 3.0,
        motion: Motion::Granular,
        ..BASE
    },
    // Water
    MaterialDef {
        color: rgb(0, 0, 255),
        move_priority: 2.0,
        motion: Motion::Liquid,
        ..BASE
    },
    // Fire
    MaterialDef {
        color: rgb(255, 0, 0),
        move_priority: 1.0,
        motion: Motion::Rising,
        lifetime: Some(120),
        ..BASE
    },
    // Wood
    MaterialDef {
        color: rgb(150, 75, 0),
        flammable: true,
        burn_threshold: 10,
        ignition_chance: 0.4,
        durability: 10.0,
        breaks_into: Some(Material::WoodDust),
        ..BASE
    },
    // Oil
    MaterialDef {
        color: rgb(200, 200, 0),
        move_priority: 1.5,
        motion: Motion::Liquid,
        flammable: true,
        burn_threshold: 5,
        ignition_chance: 1.0,
        ..BASE
    },
    // Gunpowder
    MaterialDef {
        color: rgb(200, 200, 200),
        move_priority: 3.0,
        motion: Motion::Granular,
        flammable: true,
        burn_threshold: 1,
        ignition_chance: 1.0,
        ..BASE
    },
    // Fuse
    MaterialDef {
        color: rgb(200, 50, 0),
        flammable: true,
        burn_threshold: 1,
        ignition_chance: 1.0,
        durability: 10.0,
        ..BASE
    },
    // Iron
    MaterialDef {
        color: rgb(150, 150, 150),
        conductive: true,
        ..BASE
    },
    // WoodDust
    MaterialDef {
        color: rgb(200, 125, 0),
        move_priority: 3.0,
        motion: Motion::Granular,
        flammable: true,
        burn_threshold: 3,
        ignition_chance: 0.6,
        ..BASE
    },
];

impl Material {
    /// The full palette, in wire-id order.
    pub const ALL: [Material; 11] = [
        Material::Air,
        Material::Stone,
        Material::Sand,
        Material::Water,
        Material::Fire,
        Material::Wood,
        Material::Oil,
        Material::Gunpowder,
        Material::Fuse,
        Material::Iron,
        Material::WoodDust,
    ];

    /// Resolve a wire id to a kind. Unknown ids resolve to [`Material::Air`].
    pub fn from_id(id: u8) -> Self {
        Self::ALL
            .get(id as usize)
            .copied()
            .unwrap_or(Material::Air)
    }

    /// The wire id of this kind.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// The static parameters for this kind.
    pub fn def(self) -> &'static MaterialDef {
        &DEFS[self as usize]
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Material::Air => "air",
            Material::Stone => "stone",
            Material::Sand => "sand",
            Material::Water => "water",
            Material::Fire => "fire",
            Material::Wood => "wood",
            Material::Oil => "oil",
            Material::Gunpowder => "gunpowder",
            Material::Fuse => "fuse",
            Material::Iron => "iron",
            Material::WoodDust => "wood dust",
        };
        write!(f, "{name}")
    }
}
