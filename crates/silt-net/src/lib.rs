//! Peer replication for the Silt sandbox.
//!
//! Implements the ASCII wire protocol, the peer registry, and the
//! host-authoritative [`Session`] front-end that ties the tick engine to
//! the network. The host simulates; replicas apply the host's command
//! stream between render passes. Edits made anywhere propagate through
//! the host to every peer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod peer;
pub mod protocol;
pub mod session;

pub use error::{NetError, ProtocolError, SessionError};
pub use peer::{PeerId, PeerRegistry};
pub use protocol::FrameBuffer;
pub use session::{Session, SessionMode};
