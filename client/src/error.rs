use std::{error::Error, fmt, io};

/// The client module's result type.
pub type Result<T> = std::result::Result<T, ClientErr>;

/// Local training failures.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainErr {
    ShapeMismatch { got: usize, expected: usize },
    Diverged { step: usize },
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::ShapeMismatch { got, expected } => {
                write!(f, "trainer shape mismatch: got {got}, expected {expected}")
            }
            TrainErr::Diverged { step } => {
                write!(f, "parameters stopped being finite at local step {step}")
            }
        }
    }
}

impl Error for TrainErr {}

/// Client runtime failures.
#[derive(Debug)]
pub enum ClientErr {
    Io(io::Error),
    Train(TrainErr),
    LengthMismatch {
        round: usize,
        got: usize,
        expected: usize,
    },
}

impl fmt::Display for ClientErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErr::Io(e) => write!(f, "io error: {e}"),
            ClientErr::Train(e) => write!(f, "training error: {e}"),
            ClientErr::LengthMismatch {
                round,
                got,
                expected,
            } => write!(
                f,
                "parameters length mismatch at round {round}: got {got}, expected {expected}"
            ),
        }
    }
}

impl Error for ClientErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientErr::Io(e) => Some(e),
            ClientErr::Train(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ClientErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TrainErr> for ClientErr {
    fn from(value: TrainErr) -> Self {
        Self::Train(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<ClientErr> for io::Error {
    fn from(value: ClientErr) -> Self {
        match value {
            ClientErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
