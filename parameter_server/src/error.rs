use std::{error::Error, fmt, io};

use comms::{MessageKind, Rank};

use crate::model::SizeMismatchErr;

/// The handler module's result type.
pub type Result<T> = std::result::Result<T, HandlerErr>;

/// Failures of a server handler, all of them are fatal for the handler.
///
/// Duplicate contributions are not errors, they are logged and dropped.
#[derive(Debug)]
pub enum HandlerErr {
    /// A message kind the active handler does not accept.
    ProtocolViolation {
        sender: Rank,
        kind: MessageKind,
    },
    /// An operation the handler deliberately does not provide.
    Unimplemented(&'static str),
    /// A sender outside of `[1, client_count]`.
    RankOutOfBounds {
        rank: Rank,
        client_count: usize,
    },
    /// A payload whose length doesn't match the global model.
    LengthMismatch {
        sender: Rank,
        got: usize,
        expected: usize,
    },
    /// Construction parameters out of their domain.
    InvalidConfig(String),
    /// The model handle refused the new parameters.
    Model(SizeMismatchErr),
}

impl fmt::Display for HandlerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation { sender, kind } => {
                write!(f, "protocol violation: unexpected {kind} from rank {sender}")
            }
            Self::Unimplemented(op) => write!(f, "operation not implemented: {op}"),
            Self::RankOutOfBounds { rank, client_count } => {
                write!(f, "rank {rank} is outside of the clients [1, {client_count}]")
            }
            Self::LengthMismatch {
                sender,
                got,
                expected,
            } => write!(
                f,
                "payload length mismatch from rank {sender}: got {got}, expected {expected}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid handler config: {msg}"),
            Self::Model(e) => write!(f, "model error: {e}"),
        }
    }
}

impl Error for HandlerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SizeMismatchErr> for HandlerErr {
    fn from(value: SizeMismatchErr) -> Self {
        Self::Model(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<HandlerErr> for io::Error {
    fn from(value: HandlerErr) -> Self {
        let kind = match value {
            HandlerErr::Unimplemented(_) => io::ErrorKind::Unsupported,
            HandlerErr::InvalidConfig(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, value)
    }
}
