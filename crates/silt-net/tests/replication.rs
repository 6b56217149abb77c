//! Loopback replication integration tests.
//!
//! Each test wires real TCP sessions over 127.0.0.1 and polls `pump()` on
//! every participant until the replicas converge (or a deadline passes).
//! Static materials (iron, stone) are used wherever a test needs cells
//! that hold still across host ticks.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use silt_core::{Material, PlaceMode};
use silt_engine::WorldConfig;
use silt_net::Session;

const DEADLINE: Duration = Duration::from_secs(5);

fn config(width: u32, height: u32) -> WorldConfig {
    WorldConfig {
        width,
        height,
        seed: 11,
        ..Default::default()
    }
}

fn host(width: u32, height: u32) -> Session {
    // Surfaces warn-level protocol drops when a test fails.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Session::host(&config(width, height), "127.0.0.1:0").unwrap()
}

fn join(host: &Session, width: u32, height: u32) -> Session {
    let addr = format!("127.0.0.1:{}", host.local_port().unwrap());
    Session::join(&config(width, height), addr).unwrap()
}

/// Pump every session until `done` holds. Panics on deadline.
fn converge(sessions: &mut [&mut Session], done: impl Fn(&[&mut Session]) -> bool, what: &str) {
    let deadline = Instant::now() + DEADLINE;
    loop {
        for session in sessions.iter_mut() {
            session.pump();
        }
        if done(sessions) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn new_peer_receives_the_world_snapshot() {
    let mut host = host(12, 10);
    host.set_block(3, 3, Material::Iron, PlaceMode::Force);
    host.set_block(7, 2, Material::Stone, PlaceMode::Force);

    let mut client = join(&host, 12, 10);
    converge(
        &mut [&mut host, &mut client],
        |s| {
            s[1].material_at(3, 3) == Material::Iron && s[1].material_at(7, 2) == Material::Stone
        },
        "initial snapshot",
    );
}

#[test]
fn host_edits_propagate_to_the_client() {
    let mut host = host(10, 10);
    let mut client = join(&host, 10, 10);
    converge(
        &mut [&mut host, &mut client],
        |s| s[0].peer_count() == 1,
        "connection",
    );

    host.set_block(5, 5, Material::Iron, PlaceMode::Force);
    converge(
        &mut [&mut host, &mut client],
        |s| s[1].material_at(5, 5) == Material::Iron,
        "host edit",
    );
}

#[test]
fn client_edits_reach_the_host_and_other_clients() {
    let mut host = host(10, 10);
    let mut alice = join(&host, 10, 10);
    let mut bob = join(&host, 10, 10);
    converge(
        &mut [&mut host, &mut alice, &mut bob],
        |s| s[0].peer_count() == 2,
        "connections",
    );

    alice.set_block(2, 2, Material::Iron, PlaceMode::Force);
    converge(
        &mut [&mut host, &mut alice, &mut bob],
        |s| {
            s[0].material_at(2, 2) == Material::Iron && s[2].material_at(2, 2) == Material::Iron
        },
        "client edit relay",
    );
}

#[test]
fn physics_mutations_replicate_to_the_client() {
    // Sand dropped down a stone shaft must come to rest identically on
    // the replica, carried entirely by the host's mutation broadcasts.
    // The shaft keeps the pile from spreading, so the world reaches a
    // fixed point and the comparison is stable.
    let mut host = host(8, 12);
    let mut client = join(&host, 8, 12);
    converge(
        &mut [&mut host, &mut client],
        |s| s[0].peer_count() == 1,
        "connection",
    );

    for y in 0..12 {
        host.set_block(3, y, Material::Stone, PlaceMode::Force);
        host.set_block(5, y, Material::Stone, PlaceMode::Force);
    }
    for y in 0..4 {
        host.set_block(4, y, Material::Sand, PlaceMode::Force);
    }
    converge(
        &mut [&mut host, &mut client],
        |s| {
            // Settled on the host and mirrored on the client.
            (8..12).all(|y| s[0].material_at(4, y) == Material::Sand)
                && s[0].export() == s[1].export()
        },
        "sand settling replication",
    );
}

#[test]
fn clear_replicates_an_empty_world() {
    let mut host = host(8, 8);
    let mut client = join(&host, 8, 8);
    converge(
        &mut [&mut host, &mut client],
        |s| s[0].peer_count() == 1,
        "connection",
    );

    host.set_block(3, 3, Material::Iron, PlaceMode::Force);
    converge(
        &mut [&mut host, &mut client],
        |s| s[1].material_at(3, 3) == Material::Iron,
        "edit before clear",
    );

    host.clear();
    converge(
        &mut [&mut host, &mut client],
        |s| s[1].material_at(3, 3) == Material::Air,
        "clear replication",
    );
}

#[test]
fn inbound_frames_are_applied_but_never_echoed_upstream() {
    // A bare listener stands in for the host, so any byte the joined
    // session writes back is visible as an echo.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let mut client = Session::join(&config(8, 8), addr).unwrap();
    let (mut upstream, _) = listener.accept().unwrap();

    upstream.write_all(b"set_block,1,1,1,1;").unwrap();
    let deadline = Instant::now() + DEADLINE;
    loop {
        client.pump();
        if client.material_at(1, 1) == Material::Stone {
            break;
        }
        assert!(Instant::now() < deadline, "inbound frame never applied");
        std::thread::sleep(Duration::from_millis(5));
    }

    // The frame was applied with remote origin, so nothing may flow back.
    upstream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = [0u8; 64];
    match upstream.read(&mut buf) {
        Err(e) => assert!(
            matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            "unexpected read error: {e}"
        ),
        Ok(0) => panic!("client closed the upstream connection"),
        Ok(n) => panic!("client echoed {n} bytes upstream"),
    }

    // The connection still works for deliberate local edits.
    client.set_block(2, 2, Material::Iron, PlaceMode::Force);
    let mut frame = Vec::new();
    upstream
        .set_read_timeout(Some(DEADLINE))
        .unwrap();
    let mut byte = [0u8; 1];
    while upstream.read_exact(&mut byte).is_ok() {
        frame.push(byte[0]);
        if byte[0] == b';' {
            break;
        }
    }
    assert_eq!(frame, b"set_block,2,2,9,1;");
}

#[test]
fn malformed_traffic_does_not_poison_the_session() {
    let mut host = host(8, 8);
    let addr = format!("127.0.0.1:{}", host.local_port().unwrap());
    let mut raw = TcpStream::connect(addr).unwrap();

    // Garbage verbs, bad arity, bare terminators, then one valid frame.
    raw.write_all(b"warp_block,1,2;;set_block,1,banana,2,1;")
        .unwrap();
    raw.write_all(b"set_block,6,6,9,1;").unwrap();
    raw.flush().unwrap();

    let deadline = Instant::now() + DEADLINE;
    loop {
        host.pump();
        if host.material_at(6, 6) == Material::Iron {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "valid frame lost among malformed ones"
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn unknown_material_ids_apply_as_air() {
    let mut host = host(8, 8);
    host.set_block(2, 2, Material::Stone, PlaceMode::Force);
    let addr = format!("127.0.0.1:{}", host.local_port().unwrap());
    let mut raw = TcpStream::connect(addr).unwrap();
    // Id 42 is not in the palette; a forced place of it must clear the cell.
    raw.write_all(b"set_block,2,2,42,1;set_block,5,5,9,1;")
        .unwrap();

    let deadline = Instant::now() + DEADLINE;
    loop {
        host.pump();
        if host.material_at(5, 5) == Material::Iron {
            break;
        }
        assert!(Instant::now() < deadline, "sentinel frame never applied");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(host.material_at(2, 2), Material::Air);
}
