//! Core types for the Silt falling-sand simulation.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! material registry (the fixed catalog of particle kinds and their static
//! parameters), the per-cell dynamic state layered on top of a kind, and
//! the command vocabulary shared by the ingress queue and the wire protocol.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod command;
pub mod material;

pub use cell::Cell;
pub use command::{Command, PlaceMode};
pub use material::{Material, MaterialDef, Motion, Rgb};
