//! Error types and protocol error handling
//!
//! X errors come in two flavours. Errors on a single request are expected
//! (a client can destroy its window between the event and our reply) and
//! are only logged. Everything else ends the process.

use std::fmt;

use thiserror::Error;
use tracing::{trace, warn};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

/// An X error reported for one of our requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub kind: ErrorKind,
    /// Resource id or value the server rejected
    pub bad_value: u32,
    pub major_opcode: u8,
    pub request: Option<&'static str>,
}

impl ProtocolError {
    #[cfg(test)]
    pub fn new(kind: ErrorKind, bad_value: u32) -> Self {
        Self {
            kind,
            bad_value,
            major_opcode: 0,
            request: None,
        }
    }
}

impl From<X11Error> for ProtocolError {
    fn from(e: X11Error) -> Self {
        Self {
            kind: e.error_kind,
            bad_value: e.bad_value,
            major_opcode: e.major_opcode,
            request: e.request_name,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} on {} (opcode {}, value 0x{:x})",
            self.kind,
            self.request.unwrap_or("unknown request"),
            self.major_opcode,
            self.bad_value
        )
    }
}

/// Failure of a single display gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("X protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("display connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("display server ran out of resource ids")]
    IdsExhausted,
}

impl From<X11Error> for GatewayError {
    fn from(e: X11Error) -> Self {
        Self::Protocol(e.into())
    }
}

impl From<ReplyError> for GatewayError {
    fn from(e: ReplyError) -> Self {
        match e {
            ReplyError::ConnectionError(e) => Self::Connection(e),
            ReplyError::X11Error(e) => e.into(),
        }
    }
}

impl From<ReplyOrIdError> for GatewayError {
    fn from(e: ReplyOrIdError) -> Self {
        match e {
            ReplyOrIdError::IdsExhausted => Self::IdsExhausted,
            ReplyOrIdError::ConnectionError(e) => Self::Connection(e),
            ReplyOrIdError::X11Error(e) => e.into(),
        }
    }
}

/// Window manager failure
///
/// Only `Gateway(GatewayError::Protocol(_))` is recoverable, see
/// [`WmError::protocol`].
#[derive(Debug, Error)]
pub enum WmError {
    #[error("failed to open X display {display}")]
    DisplayUnavailable {
        display: String,
        #[source]
        source: ConnectError,
    },

    #[error("another window manager is already running on display {0}")]
    RivalWindowManager(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl WmError {
    /// The protocol error behind this failure, if it is one.
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Gateway(GatewayError::Protocol(e)) => Some(e),
            _ => None,
        }
    }
}

/// Which protocol error policy is in force
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEra {
    /// Startup handshake: only `Access` matters, it means another process
    /// already holds substructure redirection on the root.
    Detection { rival_detected: bool },
    /// Rest of the process lifetime: log and carry on.
    SteadyState,
}

impl ErrorEra {
    pub fn detection() -> Self {
        Self::Detection {
            rival_detected: false,
        }
    }

    /// Apply the current policy to one error. Never fails.
    pub fn observe(&mut self, error: &ProtocolError) {
        match self {
            Self::Detection { rival_detected } => {
                if error.kind == ErrorKind::Access {
                    *rival_detected = true;
                } else {
                    trace!("Ignoring protocol error during startup: {}", error);
                }
            }
            Self::SteadyState => {
                warn!("X11 error: {}", error);
            }
        }
    }

    pub fn rival_detected(&self) -> bool {
        matches!(
            self,
            Self::Detection {
                rival_detected: true
            }
        )
    }
}
