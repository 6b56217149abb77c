//! Error types for the wire protocol and session layer.
//!
//! Hand-rolled enums per subsystem: frame parsing, peer transport, and
//! session lifecycle. Protocol errors are recoverable (the offending frame
//! is logged and dropped); transport and session errors surface to the
//! caller.

use std::error::Error;
use std::fmt;
use std::io;

use silt_engine::ConfigError;

/// Errors from decoding a single wire frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame's verb is not part of the command vocabulary.
    UnknownVerb {
        /// The unrecognised verb.
        verb: String,
    },
    /// The frame has the wrong number of comma-separated fields.
    WrongArity {
        /// The frame's verb.
        verb: &'static str,
        /// Fields expected after the verb.
        expected: usize,
        /// Fields actually present after the verb.
        actual: usize,
    },
    /// A numeric field failed to parse.
    BadField {
        /// The frame's verb.
        verb: &'static str,
        /// Zero-based index of the field after the verb.
        index: usize,
        /// The unparseable text.
        text: String,
    },
    /// The frame is not valid UTF-8.
    NotUtf8,
    /// The frame is empty (a bare terminator).
    Empty,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVerb { verb } => write!(f, "unknown verb '{verb}'"),
            Self::WrongArity {
                verb,
                expected,
                actual,
            } => write!(
                f,
                "'{verb}' expects {expected} fields, got {actual}"
            ),
            Self::BadField { verb, index, text } => {
                write!(f, "'{verb}' field {index} is not a number: '{text}'")
            }
            Self::NotUtf8 => write!(f, "frame is not valid UTF-8"),
            Self::Empty => write!(f, "empty frame"),
        }
    }
}

impl Error for ProtocolError {}

/// Errors from the peer transport layer.
#[derive(Debug)]
pub enum NetError {
    /// Binding the host listener failed.
    Bind(io::Error),
    /// Connecting to a host failed.
    Connect(io::Error),
    /// Duplicating a stream handle for the registry failed.
    CloneStream(io::Error),
    /// Spawning a receive or accept thread failed.
    Spawn(io::Error),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(e) => write!(f, "failed to bind listener: {e}"),
            Self::Connect(e) => write!(f, "failed to connect to host: {e}"),
            Self::CloneStream(e) => write!(f, "failed to clone peer stream: {e}"),
            Self::Spawn(e) => write!(f, "failed to spawn thread: {e}"),
        }
    }
}

impl Error for NetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind(e) | Self::Connect(e) | Self::CloneStream(e) | Self::Spawn(e) => Some(e),
        }
    }
}

/// Errors from constructing a session.
#[derive(Debug)]
pub enum SessionError {
    /// The world configuration is invalid.
    Config(ConfigError),
    /// The transport could not be set up.
    Net(NetError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid world config: {e}"),
            Self::Net(e) => write!(f, "transport setup failed: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Net(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<NetError> for SessionError {
    fn from(e: NetError) -> Self {
        Self::Net(e)
    }
}
