//! The peer registry: connected remote endpoints and fan-out.
//!
//! Shared between the session thread and the per-connection receive
//! threads behind a mutex; insertion order is preserved so broadcast
//! fan-out is deterministic. Writing to a peer that fails marks it dead,
//! and dead peers are removed after the fan-out loop completes, never
//! mid-iteration.

use std::fmt;
use std::io::Write;
use std::net::TcpStream;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::NetError;

/// Opaque handle for a connected peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

struct Inner {
    peers: IndexMap<PeerId, TcpStream>,
    next_id: u64,
}

/// Connected peers, keyed by [`PeerId`] in connection order.
pub struct PeerRegistry {
    inner: Mutex<Inner>,
}

impl PeerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                peers: IndexMap::new(),
                next_id: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock means a writer panicked mid-send; the map itself
        // is still structurally sound, so keep serving the survivors.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection, keeping an independent write handle.
    ///
    /// The caller retains `stream` for its read loop; the registry's clone
    /// shares the socket, so writes here interleave with reads there.
    pub fn register(&self, stream: &TcpStream) -> Result<PeerId, NetError> {
        let clone = stream.try_clone().map_err(NetError::CloneStream)?;
        let mut inner = self.lock();
        let id = PeerId(inner.next_id);
        inner.next_id += 1;
        inner.peers.insert(id, clone);
        debug!(peer = %id, "peer registered");
        Ok(id)
    }

    /// Drop a peer, closing the registry's write handle.
    pub fn remove(&self, id: PeerId) {
        if self.lock().peers.shift_remove(&id).is_some() {
            debug!(peer = %id, "peer removed");
        }
    }

    /// Number of connected peers.
    pub fn len(&self) -> usize {
        self.lock().peers.len()
    }

    /// Whether no peers are connected.
    pub fn is_empty(&self) -> bool {
        self.lock().peers.is_empty()
    }

    /// Send bytes to a single peer. Returns false (and removes the peer)
    /// if the write failed.
    pub fn send_to(&self, id: PeerId, bytes: &[u8]) -> bool {
        let mut inner = self.lock();
        let Some(stream) = inner.peers.get_mut(&id) else {
            return false;
        };
        match stream.write_all(bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!(peer = %id, error = %e, "dropping peer after failed send");
                inner.peers.shift_remove(&id);
                false
            }
        }
    }

    /// Send bytes to every peer except `except`.
    ///
    /// Failed peers are collected during the loop and removed afterwards,
    /// so fan-out always reaches every live peer exactly once.
    pub fn broadcast(&self, bytes: &[u8], except: Option<PeerId>) {
        let mut inner = self.lock();
        let mut dead = Vec::new();
        for (&id, stream) in &mut inner.peers {
            if Some(id) == except {
                continue;
            }
            if let Err(e) = stream.write_all(bytes) {
                warn!(peer = %id, error = %e, "dropping peer after failed broadcast");
                dead.push(id);
            }
        }
        for id in dead {
            inner.peers.shift_remove(&id);
        }
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
