//! Replicated simulation sessions.
//!
//! A [`Session`] wraps the tick engine behind one of three modes:
//!
//! - **Solo** — no networking, just the local engine.
//! - **Hosting** — authoritative. Binds a listener, accepts any number of
//!   peers, broadcasts every local edit and every physics mutation, relays
//!   peer edits to the other peers, and sends each new connection a full
//!   `sync_world` snapshot.
//! - **Joined** — subordinate. Connects to a host, sends local edits
//!   there, and applies whatever the host's stream says. A joined session
//!   never ticks; the grid is a replica driven entirely by inbound frames.
//!
//! # Concurrency
//!
//! The grid has exactly one writer: the thread calling [`Session::pump`].
//! Receive threads never touch the grid — they parse frames and push them
//! onto a bounded channel, and `pump` drains that channel before ticking.
//! When the channel is full the frame is logged and dropped; the next
//! `sync_world` heals any divergence this causes.
//!
//! Receive threads exit when their socket closes. The host's accept
//! thread blocks in `accept()` for the life of the process; dropping the
//! session closes the peer write handles but leaves the listener thread
//! parked, which is acceptable for the intended one-session-per-process
//! use.

use std::io::Read;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};

use silt_core::{Command, Material, PlaceMode, Rgb};
use silt_engine::{RegionSnapshot, TickEngine, WorldConfig};

use crate::error::{NetError, SessionError};
use crate::peer::{PeerId, PeerRegistry};
use crate::protocol::{self, FrameBuffer};

/// Socket read chunk size.
const READ_CHUNK: usize = 1024;

/// How a session participates in replication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    /// Local-only simulation.
    Solo,
    /// Authoritative host.
    Hosting,
    /// Replica of a remote host.
    Joined,
}

/// A message from a receive or accept thread to the session thread.
enum Inbound {
    /// A decoded frame from a peer.
    Frame {
        from: PeerId,
        command: Command,
    },
    /// A new peer finished connecting and needs a world snapshot.
    PeerConnected { peer: PeerId },
}

/// A running simulation session. See the module docs for the mode matrix.
pub struct Session {
    engine: TickEngine,
    mode: SessionMode,
    registry: Arc<PeerRegistry>,
    inbound_rx: Receiver<Inbound>,
    local_port: Option<u16>,
}

impl Session {
    /// Start a local-only session.
    pub fn solo(config: &WorldConfig) -> Result<Self, SessionError> {
        let (_, inbound_rx) = bounded(config.max_queue);
        Ok(Self {
            engine: TickEngine::new(config)?,
            mode: SessionMode::Solo,
            registry: Arc::new(PeerRegistry::new()),
            inbound_rx,
            local_port: None,
        })
    }

    /// Start an authoritative session listening on `bind` (use port 0 for
    /// an ephemeral port, then read it back via
    /// [`local_port`](Session::local_port)).
    pub fn host(config: &WorldConfig, bind: impl ToSocketAddrs) -> Result<Self, SessionError> {
        let engine = TickEngine::new(config)?;
        let listener = TcpListener::bind(bind).map_err(NetError::Bind)?;
        let local_port = listener.local_addr().map_err(NetError::Bind)?.port();
        let registry = Arc::new(PeerRegistry::new());
        let (inbound_tx, inbound_rx) = bounded(config.max_queue);

        {
            let registry = Arc::clone(&registry);
            thread::Builder::new()
                .name("silt-accept".into())
                .spawn(move || accept_loop(listener, registry, inbound_tx))
                .map_err(NetError::Spawn)?;
        }

        info!(port = local_port, "hosting session");
        Ok(Self {
            engine,
            mode: SessionMode::Hosting,
            registry,
            inbound_rx,
            local_port: Some(local_port),
        })
    }

    /// Connect to a host at `addr` as a replica.
    pub fn join(config: &WorldConfig, addr: impl ToSocketAddrs) -> Result<Self, SessionError> {
        let engine = TickEngine::new(config)?;
        let stream = TcpStream::connect(addr).map_err(NetError::Connect)?;
        let registry = Arc::new(PeerRegistry::new());
        let (inbound_tx, inbound_rx) = bounded(config.max_queue);

        let peer = registry.register(&stream)?;
        spawn_recv_loop(
            stream,
            peer,
            Arc::clone(&registry),
            inbound_tx,
            false,
        )?;

        info!("joined session");
        Ok(Self {
            engine,
            mode: SessionMode::Joined,
            registry,
            inbound_rx,
            local_port: None,
        })
    }

    // ── accessors ────────────────────────────────────────────────

    /// How this session participates in replication.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// The port a hosting session is listening on.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Number of connected peers.
    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.engine.grid().width()
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.engine.grid().height()
    }

    /// Number of completed ticks.
    pub fn tick_id(&self) -> u64 {
        self.engine.tick_id()
    }

    /// The material at `(x, y)`; out-of-range reads as air.
    pub fn material_at(&self, x: i32, y: i32) -> Material {
        self.engine.grid().material_at(x, y)
    }

    /// The render colour of `(x, y)`, or `None` for invisible cells.
    pub fn render(&self, x: i32, y: i32) -> Option<Rgb> {
        self.engine.grid().render(x, y)
    }

    // ── the session loop ─────────────────────────────────────────

    /// Advance the session one step and return the cells that changed.
    ///
    /// Drains all queued inbound traffic first, then (for Solo and
    /// Hosting) runs one engine tick and fans the tick's mutations out to
    /// the peers. Joined sessions never tick; their step is the drain.
    pub fn pump(&mut self) -> Vec<(i32, i32)> {
        let mut touched = Vec::new();
        while let Ok(message) = self.inbound_rx.try_recv() {
            match message {
                Inbound::Frame { from, command } => {
                    debug!(peer = %from, "applying inbound command");
                    self.apply(command, false, &mut touched);
                }
                Inbound::PeerConnected { peer } => self.greet(peer),
            }
        }

        if self.mode == SessionMode::Joined {
            return touched;
        }

        let report = self.engine.tick();
        if self.mode == SessionMode::Hosting && !report.mutations.is_empty() {
            let mut frames = String::new();
            for mutation in &report.mutations {
                frames.push_str(&protocol::encode(mutation));
            }
            self.registry.broadcast(frames.as_bytes(), None);
        }
        touched.extend(report.touched);
        touched
    }

    /// Send a freshly connected peer the full world state.
    fn greet(&mut self, peer: PeerId) {
        let snapshot = self.engine.grid().export();
        let frame = protocol::encode(&Command::SyncWorld(snapshot.ids));
        if self.registry.send_to(peer, frame.as_bytes()) {
            info!(peer = %peer, "sent world snapshot");
        }
    }

    /// Apply a command to the grid. Locally originated commands
    /// (`is_self`) are also forwarded to the peers; inbound ones are not,
    /// which is what prevents echo loops.
    fn apply(&mut self, command: Command, is_self: bool, touched: &mut Vec<(i32, i32)>) {
        match &command {
            Command::SetBlock {
                x,
                y,
                material,
                mode,
            } => {
                self.engine.grid_mut().set_material(*x, *y, *material, *mode);
                touched.push((*x, *y));
            }
            Command::SwapBlock { x1, y1, x2, y2 } => {
                self.engine.grid_mut().swap(*x1, *y1, *x2, *y2);
                touched.push((*x1, *y1));
                touched.push((*x2, *y2));
            }
            Command::SyncWorld(ids) => {
                let (width, height) = (self.width(), self.height());
                let expected = (width as usize) * (height as usize);
                if ids.len() != expected {
                    warn!(
                        got = ids.len(),
                        expected, "sync_world length mismatch; frame dropped"
                    );
                    return;
                }
                self.engine.grid_mut().import(&RegionSnapshot {
                    width,
                    height,
                    ids: ids.clone(),
                });
                for x in 0..width as i32 {
                    for y in 0..height as i32 {
                        touched.push((x, y));
                    }
                }
            }
        }
        if is_self && self.mode != SessionMode::Solo {
            self.forward(&command);
        }
    }

    fn forward(&self, command: &Command) {
        let frame = protocol::encode(command);
        self.registry.broadcast(frame.as_bytes(), None);
    }

    // ── edit surface ─────────────────────────────────────────────

    /// Place a material at `(x, y)`, replicating to peers.
    pub fn set_block(&mut self, x: i32, y: i32, material: Material, mode: PlaceMode) {
        let mut touched = Vec::new();
        self.apply(
            Command::SetBlock {
                x,
                y,
                material,
                mode,
            },
            true,
            &mut touched,
        );
    }

    /// Exchange two cells, replicating to peers.
    pub fn swap_block(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let mut touched = Vec::new();
        self.apply(Command::SwapBlock { x1, y1, x2, y2 }, true, &mut touched);
    }

    /// Soft-place a `size`×`size` brush whose top-left corner sits half a
    /// brush up-left of `(x, y)`. Existing non-air cells are left alone.
    pub fn place(&mut self, x: i32, y: i32, material: Material, size: u32) {
        let size = size as i32;
        let (start_x, start_y) = (x - size / 2, y - size / 2);
        for dx in 0..size {
            for dy in 0..size {
                self.set_block(start_x + dx, start_y + dy, material, PlaceMode::IfEmpty);
            }
        }
    }

    /// Erase a `size`×`size` brush anchored like [`place`](Session::place).
    pub fn erase(&mut self, x: i32, y: i32, size: u32) {
        let size = size as i32;
        let (start_x, start_y) = (x - size / 2, y - size / 2);
        for dx in 0..size {
            for dy in 0..size {
                self.set_block(start_x + dx, start_y + dy, Material::Air, PlaceMode::Force);
            }
        }
    }

    /// Reset the whole grid to air, replicating the empty state.
    pub fn clear(&mut self) {
        self.engine.grid_mut().clear();
        if self.mode != SessionMode::Solo {
            self.forward(&Command::SyncWorld(self.engine.grid().export().ids));
        }
    }

    /// Snapshot a rectangle of the grid.
    pub fn copy_region(&self, x: i32, y: i32, width: u32, height: u32) -> RegionSnapshot {
        self.engine.grid().copy_region(x, y, width, height)
    }

    /// Paste a snapshot with its centre at `(x, y)`, replicating each
    /// placed cell. Air cells in the source are skipped.
    pub fn paste_region(&mut self, x: i32, y: i32, snapshot: &RegionSnapshot) {
        let start_x = x - snapshot.width as i32 / 2;
        let start_y = y - snapshot.height as i32 / 2;
        for dx in 0..snapshot.width as i32 {
            for dy in 0..snapshot.height as i32 {
                let material = snapshot.get(dx, dy);
                if material != Material::Air {
                    self.set_block(start_x + dx, start_y + dy, material, PlaceMode::Force);
                }
            }
        }
    }

    /// Snapshot the full grid.
    pub fn export(&self) -> RegionSnapshot {
        self.engine.grid().export()
    }

    /// Replace the full grid from a snapshot, replicating to peers.
    pub fn import(&mut self, snapshot: &RegionSnapshot) {
        let mut touched = Vec::new();
        self.apply(Command::SyncWorld(snapshot.ids.clone()), true, &mut touched);
    }
}

/// Accept connections forever, wiring each one into the registry and a
/// receive loop.
fn accept_loop(
    listener: TcpListener,
    registry: Arc<PeerRegistry>,
    inbound_tx: Sender<Inbound>,
) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let peer = match registry.register(&stream) {
            Ok(peer) => peer,
            Err(e) => {
                warn!(error = %e, "rejecting connection");
                continue;
            }
        };
        if inbound_tx
            .send(Inbound::PeerConnected { peer })
            .is_err()
        {
            // Session dropped; stop accepting.
            return;
        }
        if let Err(e) = spawn_recv_loop(
            stream,
            peer,
            Arc::clone(&registry),
            inbound_tx.clone(),
            true,
        ) {
            warn!(peer = %peer, error = %e, "failed to start receive loop");
            registry.remove(peer);
        }
    }
}

/// Read frames from one peer until the socket closes.
///
/// On a hosting session (`relay` set) every completed frame is forwarded
/// verbatim to the other peers before parsing, so replicas converge even
/// on frames this version cannot decode. Frames are relayed whole, never
/// as raw chunks, to keep one peer's partial frame from interleaving with
/// the host's own broadcasts.
fn spawn_recv_loop(
    mut stream: TcpStream,
    peer: PeerId,
    registry: Arc<PeerRegistry>,
    inbound_tx: Sender<Inbound>,
    relay: bool,
) -> Result<(), NetError> {
    thread::Builder::new()
        .name(format!("silt-recv-{peer}"))
        .spawn(move || {
            let mut buffer = FrameBuffer::new();
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                let n = match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        debug!(peer = %peer, error = %e, "read failed");
                        break;
                    }
                };
                for frame in buffer.push(&chunk[..n]) {
                    let body = match frame {
                        Ok(body) => body,
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "dropping frame");
                            continue;
                        }
                    };
                    if relay {
                        let mut wire = body.clone();
                        wire.push(';');
                        registry.broadcast(wire.as_bytes(), Some(peer));
                    }
                    let command = match protocol::parse(&body) {
                        Ok(command) => command,
                        Err(e) => {
                            warn!(peer = %peer, error = %e, "dropping malformed frame");
                            continue;
                        }
                    };
                    match inbound_tx.try_send(Inbound::Frame {
                        from: peer,
                        command,
                    }) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            warn!(peer = %peer, "inbound queue full; frame dropped");
                        }
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
            }
            registry.remove(peer);
            debug!(peer = %peer, "connection closed");
        })
        .map_err(NetError::Spawn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: u32, height: u32) -> WorldConfig {
        WorldConfig {
            width,
            height,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn solo_session_ticks_without_peers() {
        let mut session = Session::solo(&config(8, 8)).unwrap();
        session.set_block(4, 0, Material::Sand, PlaceMode::Force);
        let touched = session.pump();
        assert!(!touched.is_empty());
        assert_eq!(session.material_at(4, 1), Material::Sand);
        assert_eq!(session.peer_count(), 0);
        assert_eq!(session.tick_id(), 1);
    }

    #[test]
    fn host_reports_its_ephemeral_port() {
        let session = Session::host(&config(8, 8), "127.0.0.1:0").unwrap();
        assert_eq!(session.mode(), SessionMode::Hosting);
        assert!(session.local_port().unwrap() > 0);
    }

    #[test]
    fn place_is_soft_and_erase_is_forced() {
        let mut session = Session::solo(&config(9, 9)).unwrap();
        session.set_block(4, 4, Material::Stone, PlaceMode::Force);
        session.place(4, 4, Material::Sand, 3);
        // The brush skipped the stone at its centre.
        assert_eq!(session.material_at(4, 4), Material::Stone);
        assert_eq!(session.material_at(3, 3), Material::Sand);

        session.erase(4, 4, 3);
        for dx in -1..=1 {
            for dy in -1..=1 {
                assert_eq!(session.material_at(4 + dx, 4 + dy), Material::Air);
            }
        }
    }

    #[test]
    fn brush_covers_exactly_size_squared_cells() {
        // An even brush must not round up: size 2 fills 4 cells, anchored
        // half a brush up-left of the cursor.
        let mut session = Session::solo(&config(9, 9)).unwrap();
        session.place(5, 5, Material::Iron, 2);
        let mut filled = 0;
        for x in 0..9 {
            for y in 0..9 {
                if session.material_at(x, y) == Material::Iron {
                    filled += 1;
                }
            }
        }
        assert_eq!(filled, 4);
        assert_eq!(session.material_at(4, 4), Material::Iron);
        assert_eq!(session.material_at(5, 5), Material::Iron);
        assert_eq!(session.material_at(6, 6), Material::Air);

        session.erase(5, 5, 2);
        for x in 0..9 {
            for y in 0..9 {
                assert_eq!(session.material_at(x, y), Material::Air);
            }
        }
    }

    #[test]
    fn copy_paste_round_trips_a_shape() {
        let mut session = Session::solo(&config(16, 16)).unwrap();
        session.set_block(2, 2, Material::Iron, PlaceMode::Force);
        session.set_block(3, 3, Material::Iron, PlaceMode::Force);
        let snapshot = session.copy_region(2, 2, 2, 2);
        session.paste_region(10, 10, &snapshot);
        assert_eq!(session.material_at(9, 9), Material::Iron);
        assert_eq!(session.material_at(10, 10), Material::Iron);
    }

    #[test]
    fn import_replaces_the_grid() {
        let mut session = Session::solo(&config(4, 4)).unwrap();
        session.set_block(0, 0, Material::Stone, PlaceMode::Force);
        let mut ids = vec![Material::Air; 16];
        ids[5] = Material::Iron;
        session.import(&RegionSnapshot {
            width: 4,
            height: 4,
            ids,
        });
        assert_eq!(session.material_at(0, 0), Material::Air);
        assert_eq!(session.material_at(1, 1), Material::Iron);
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = Session::solo(&config(6, 6)).unwrap();
        session.place(3, 3, Material::Sand, 5);
        session.clear();
        for x in 0..6 {
            for y in 0..6 {
                assert_eq!(session.material_at(x, y), Material::Air);
            }
        }
    }
}
