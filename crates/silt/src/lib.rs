//! Silt: a replicated falling-sand simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Silt sub-crates. For most users, adding `silt` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use silt::prelude::*;
//!
//! // A 32×24 local world.
//! let config = WorldConfig {
//!     width: 32,
//!     height: 24,
//!     seed: 42,
//!     ..Default::default()
//! };
//! let mut session = Session::solo(&config).unwrap();
//!
//! // Pour some sand and let it fall.
//! session.set_block(16, 0, Material::Sand, PlaceMode::Force);
//! for _ in 0..30 {
//!     session.pump();
//! }
//! assert_eq!(session.material_at(16, 23), Material::Sand);
//! ```
//!
//! To replicate, swap [`net::Session::solo`] for [`net::Session::host`]
//! on one machine and [`net::Session::join`] on the others; edits and
//! physics flow through the host automatically.
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `silt-core` | Materials, cells, commands |
//! | [`engine`] | `silt-engine` | Grid, tick engine, behaviours, propagation |
//! | [`net`] | `silt-net` | Wire protocol, peer registry, sessions |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Materials, cell state, and commands (`silt-core`).
///
/// The [`types::Material`] palette and its static parameter table, the
/// per-cell dynamic state, and the shared mutation vocabulary.
pub use silt_core as types;

/// Grid and simulation engine (`silt-engine`).
///
/// [`engine::Grid`] storage, the [`engine::TickEngine`], per-kind
/// behaviours, and the bounded impact/conductive propagation passes.
pub use silt_engine as engine;

/// Replication layer (`silt-net`).
///
/// The ASCII wire protocol, the peer registry, and the
/// host-authoritative [`net::Session`] front-end.
pub use silt_net as net;

/// Common imports for typical Silt usage.
///
/// ```rust
/// use silt::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use silt_core::{Cell, Command, Material, PlaceMode, Rgb};

    // Engine
    pub use silt_engine::{Grid, RegionSnapshot, TickEngine, WorldConfig};

    // Errors
    pub use silt_engine::ConfigError;
    pub use silt_net::{NetError, ProtocolError, SessionError};

    // Sessions
    pub use silt_net::{Session, SessionMode};
}
