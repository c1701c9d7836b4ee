use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ndarray::ShapeError;
use rand_distr::uniform::Error as UniformError;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, OfeErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum OfeErr {
    UnknownActivation(String),
    UnknownBlock(String),
    InvalidConfig(String),
    SparsityExceedsWidth {
        k: usize,
        width: usize,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    BackwardBeforeForward {
        what: &'static str,
    },
    EmptyReplayBuffer,
    Shape(ShapeError),
    Init(UniformError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for OfeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfeErr::UnknownActivation(name) => write!(f, "unknown activation function {name:?}"),
            OfeErr::UnknownBlock(name) => write!(f, "unknown block style {name:?}"),
            OfeErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            OfeErr::SparsityExceedsWidth { k, width } => write!(
                f,
                "sparsification keeps {k} winners but the feature width is only {width}"
            ),
            OfeErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            OfeErr::BackwardBeforeForward { what } => {
                write!(f, "{what}: backward called without a preceding forward pass")
            }
            OfeErr::EmptyReplayBuffer => write!(f, "can't sample from an empty replay buffer"),
            OfeErr::Shape(e) => write!(f, "shape error: {e}"),
            OfeErr::Init(e) => write!(f, "parameter initialization error: {e}"),
            OfeErr::Io(e) => write!(f, "io error: {e}"),
            OfeErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for OfeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OfeErr::Shape(e) => Some(e),
            OfeErr::Init(e) => Some(e),
            OfeErr::Io(e) => Some(e),
            OfeErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for OfeErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<UniformError> for OfeErr {
    fn from(value: UniformError) -> Self {
        Self::Init(value)
    }
}

impl From<io::Error> for OfeErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for OfeErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
