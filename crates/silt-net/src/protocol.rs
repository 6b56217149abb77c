//! The ASCII wire protocol.
//!
//! Frames are comma-separated fields terminated by `;`:
//!
//! ```text
//! set_block,<x>,<y>,<material_id>,<mode>;
//! swap_block,<x1>,<y1>,<x2>,<y2>;
//! sync_world,<id0>,<id1>,...;
//! ```
//!
//! `sync_world` carries the full grid row-major with x outer and y inner;
//! its length is not validated here — the session checks it against its own
//! grid dimensions. Unknown material ids decode to air, so a newer peer can
//! talk to an older one without desynchronising the rest of the grid.
//!
//! TCP gives a byte stream, not frames; [`FrameBuffer`] reassembles frames
//! across read boundaries by splitting on the terminator and carrying the
//! tail over to the next read.

use silt_core::{Command, Material, PlaceMode};

use crate::error::ProtocolError;

/// Frame terminator.
pub const FRAME_END: u8 = b';';

/// Encode a command as a terminated wire frame.
pub fn encode(command: &Command) -> String {
    match command {
        Command::SetBlock { x, y, material, mode } => {
            format!("set_block,{x},{y},{},{};", material.id(), mode.wire())
        }
        Command::SwapBlock { x1, y1, x2, y2 } => {
            format!("swap_block,{x1},{y1},{x2},{y2};")
        }
        Command::SyncWorld(ids) => {
            use std::fmt::Write;
            // Pre-sized for the common case: a 160x100 grid is 16k ids.
            let mut frame = String::with_capacity(11 + ids.len() * 3);
            frame.push_str("sync_world");
            for id in ids {
                let _ = write!(frame, ",{}", id.id());
            }
            frame.push(';');
            frame
        }
    }
}

/// Decode one unterminated frame body into a command.
pub fn parse(frame: &str) -> Result<Command, ProtocolError> {
    let frame = frame.trim();
    if frame.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let mut fields = frame.split(',');
    let verb = fields.next().unwrap_or("");
    let fields: Vec<&str> = fields.collect();
    match verb {
        "set_block" => {
            check_arity("set_block", &fields, 4)?;
            Ok(Command::SetBlock {
                x: int_field("set_block", &fields, 0)?,
                y: int_field("set_block", &fields, 1)?,
                material: Material::from_id(id_field("set_block", &fields, 2)?),
                mode: PlaceMode::from_wire(int_field("set_block", &fields, 3)?),
            })
        }
        "swap_block" => {
            check_arity("swap_block", &fields, 4)?;
            Ok(Command::SwapBlock {
                x1: int_field("swap_block", &fields, 0)?,
                y1: int_field("swap_block", &fields, 1)?,
                x2: int_field("swap_block", &fields, 2)?,
                y2: int_field("swap_block", &fields, 3)?,
            })
        }
        "sync_world" => {
            let mut ids = Vec::with_capacity(fields.len());
            for (index, _) in fields.iter().enumerate() {
                ids.push(Material::from_id(id_field("sync_world", &fields, index)?));
            }
            Ok(Command::SyncWorld(ids))
        }
        _ => Err(ProtocolError::UnknownVerb {
            verb: verb.to_owned(),
        }),
    }
}

fn check_arity(
    verb: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ProtocolError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::WrongArity {
            verb,
            expected,
            actual: fields.len(),
        })
    }
}

fn int_field(verb: &'static str, fields: &[&str], index: usize) -> Result<i32, ProtocolError> {
    fields[index]
        .trim()
        .parse()
        .map_err(|_| ProtocolError::BadField {
            verb,
            index,
            text: fields[index].to_owned(),
        })
}

fn id_field(verb: &'static str, fields: &[&str], index: usize) -> Result<u8, ProtocolError> {
    // Ids outside u8 range are as malformed as non-numeric text; in-range
    // ids beyond the palette decode to air in `Material::from_id`.
    fields[index]
        .trim()
        .parse()
        .map_err(|_| ProtocolError::BadField {
            verb,
            index,
            text: fields[index].to_owned(),
        })
}

/// Reassembles `;`-terminated frames from a TCP byte stream.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes and return every frame body completed by them, in
    /// arrival order. Incomplete trailing bytes stay buffered. A frame
    /// that is not valid UTF-8 yields `Err(ProtocolError::NotUtf8)` in
    /// its slot; later frames are unaffected.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, ProtocolError>> {
        self.pending.extend_from_slice(bytes);
        let mut frames = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == FRAME_END) {
            let rest = self.pending.split_off(end + 1);
            self.pending.pop();
            let body = std::mem::replace(&mut self.pending, rest);
            frames.push(String::from_utf8(body).map_err(|_| ProtocolError::NotUtf8));
        }
        frames
    }

    /// Bytes buffered while waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── encoding ──

    #[test]
    fn set_block_encodes_with_terminator() {
        let frame = encode(&Command::SetBlock {
            x: 3,
            y: -2,
            material: Material::Sand,
            mode: PlaceMode::Force,
        });
        assert_eq!(frame, "set_block,3,-2,2,1;");
    }

    #[test]
    fn swap_block_encodes_both_coordinates() {
        let frame = encode(&Command::SwapBlock {
            x1: 1,
            y1: 2,
            x2: 3,
            y2: 4,
        });
        assert_eq!(frame, "swap_block,1,2,3,4;");
    }

    #[test]
    fn sync_world_encodes_ids_in_order() {
        let frame = encode(&Command::SyncWorld(vec![
            Material::Air,
            Material::WoodDust,
            Material::Stone,
        ]));
        assert_eq!(frame, "sync_world,0,10,1;");
    }

    // ── parsing ──

    #[test]
    fn parse_round_trips_every_command() {
        let commands = [
            Command::SetBlock {
                x: 7,
                y: 9,
                material: Material::Oil,
                mode: PlaceMode::IfEmpty,
            },
            Command::SwapBlock {
                x1: 0,
                y1: 0,
                x2: -1,
                y2: 5,
            },
            Command::SyncWorld(vec![Material::Fire, Material::Fuse]),
        ];
        for command in commands {
            let frame = encode(&command);
            let body = frame.strip_suffix(';').unwrap();
            assert_eq!(parse(body).unwrap(), command);
        }
    }

    #[test]
    fn unknown_material_id_decodes_to_air() {
        let command = parse("set_block,1,1,99,1").unwrap();
        assert_eq!(
            command,
            Command::SetBlock {
                x: 1,
                y: 1,
                material: Material::Air,
                mode: PlaceMode::Force,
            }
        );
    }

    #[test]
    fn non_force_mode_is_soft_place() {
        let command = parse("set_block,1,1,2,0").unwrap();
        assert!(matches!(
            command,
            Command::SetBlock {
                mode: PlaceMode::IfEmpty,
                ..
            }
        ));
    }

    #[test]
    fn malformed_frames_are_rejected_with_context() {
        assert_eq!(
            parse("warp_block,1,2,3,4"),
            Err(ProtocolError::UnknownVerb {
                verb: "warp_block".into()
            })
        );
        assert_eq!(
            parse("swap_block,1,2"),
            Err(ProtocolError::WrongArity {
                verb: "swap_block",
                expected: 4,
                actual: 2,
            })
        );
        assert_eq!(
            parse("set_block,1,two,2,1"),
            Err(ProtocolError::BadField {
                verb: "set_block",
                index: 1,
                text: "two".into(),
            })
        );
        assert_eq!(parse("   "), Err(ProtocolError::Empty));
    }

    #[test]
    fn out_of_range_material_id_is_malformed() {
        assert!(matches!(
            parse("set_block,1,1,300,1"),
            Err(ProtocolError::BadField { index: 2, .. })
        ));
    }

    // ── framing ──

    #[test]
    fn frames_split_across_reads_are_reassembled() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"set_block,1,2").is_empty());
        let frames = buffer.push(b",2,1;swap_bl");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_deref().unwrap(), "set_block,1,2,2,1");
        let frames = buffer.push(b"ock,0,0,1,1;");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_deref().unwrap(), "swap_block,0,0,1,1");
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn multiple_frames_in_one_read() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"set_block,1,1,2,1;set_block,2,2,3,0;tail");
        assert_eq!(frames.len(), 2);
        assert_eq!(buffer.pending_len(), 4);
    }

    #[test]
    fn invalid_utf8_poisons_only_its_own_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(b"\xff\xfe;set_block,1,1,2,1;");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Err(ProtocolError::NotUtf8));
        assert!(frames[1].is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_command() -> impl Strategy<Value = Command> {
            let coord = -1000i32..1000;
            let material = (0u8..=10).prop_map(Material::from_id);
            prop_oneof![
                (coord.clone(), coord.clone(), material.clone(), prop::bool::ANY).prop_map(
                    |(x, y, material, force)| Command::SetBlock {
                        x,
                        y,
                        material,
                        mode: if force { PlaceMode::Force } else { PlaceMode::IfEmpty },
                    }
                ),
                (coord.clone(), coord.clone(), coord.clone(), coord).prop_map(
                    |(x1, y1, x2, y2)| Command::SwapBlock { x1, y1, x2, y2 }
                ),
                prop::collection::vec(material, 0..64).prop_map(Command::SyncWorld),
            ]
        }

        proptest! {
            #[test]
            fn encode_parse_round_trip(command in arb_command()) {
                let frame = encode(&command);
                prop_assert!(frame.ends_with(';'));
                let body = frame.strip_suffix(';').unwrap();
                prop_assert_eq!(parse(body).unwrap(), command);
            }

            // Arbitrary bytes never panic the parser and never silently
            // produce a command from garbage verbs.
            #[test]
            fn parser_is_total(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
                let mut buffer = FrameBuffer::new();
                for frame in buffer.push(&bytes).into_iter().flatten() {
                    let _ = parse(&frame);
                }
            }
        }
    }
}
