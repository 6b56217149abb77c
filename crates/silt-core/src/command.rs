//! Grid mutation commands.
//!
//! [`Command`] is the shared vocabulary of the replication protocol and the
//! session's ingress queue: every mutation that can cross the wire is one
//! of these three operations, and inbound frames are re-applied through the
//! same entry points used locally.

use crate::material::Material;

/// Placement mode for [`Command::SetBlock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceMode {
    /// Replace whatever occupies the target cell.
    Force,
    /// Only place if the target cell is currently empty ("soft place").
    IfEmpty,
}

impl PlaceMode {
    /// Decode the wire representation: `1` forces, anything else is soft.
    pub fn from_wire(value: i32) -> Self {
        if value == 1 {
            PlaceMode::Force
        } else {
            PlaceMode::IfEmpty
        }
    }

    /// The wire representation of this mode.
    pub fn wire(self) -> u8 {
        match self {
            PlaceMode::Force => 1,
            PlaceMode::IfEmpty => 0,
        }
    }
}

/// A single grid mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Place a material at a coordinate. Out-of-range coordinates are
    /// silently ignored by the grid.
    SetBlock {
        /// Target x coordinate.
        x: i32,
        /// Target y coordinate.
        y: i32,
        /// Kind to place.
        material: Material,
        /// Overwrite or soft-place.
        mode: PlaceMode,
    },
    /// Exchange the contents of two cells.
    SwapBlock {
        /// First cell x.
        x1: i32,
        /// First cell y.
        y1: i32,
        /// Second cell x.
        x2: i32,
        /// Second cell y.
        y2: i32,
    },
    /// Full grid snapshot, row-major with x outer and y inner. Sent once
    /// per new connection by the host.
    SyncWorld(Vec<Material>),
}
