//! Crate-wide error type.
//!
//! A single hand-rolled enum (std only, no thiserror/anyhow) covering the
//! run taxonomy, with manual `Display`/`Error` impls and a `From<io::Error>`
//! conversion so the `?` operator works across the fs-touching paths.

use std::fmt;

/// Errors produced anywhere in the crate.
#[derive(Debug)]
pub enum EvoError {
    /// A requested network topology is structurally invalid (empty input
    /// or output layer, a hidden layer with zero nodes, ...).
    InvalidTopology(String),
    /// Two networks that must share a shape do not (e.g. crossover parents).
    TopologyMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
    /// A flat slice or input vector did not match the expected length.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },
    /// A sampling distribution had no positive weight to draw from.
    DegenerateDistribution,
    /// A serialized network stream was too short, corrupt, or miscounted.
    EncodingLength(String),
    /// A configuration value was missing or out of bounds.
    Configuration(String),
    /// An external scoring command failed or produced unparseable output.
    ExternalScore(String),
    /// An underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for EvoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvoError::InvalidTopology(msg) => write!(f, "invalid topology: {}", msg),
            EvoError::TopologyMismatch { left, right } => {
                write!(f, "topology mismatch: {:?} vs {:?}", left, right)
            }
            EvoError::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {}, found {}", expected, found)
            }
            EvoError::DegenerateDistribution => {
                write!(f, "degenerate distribution: no positive weights to sample")
            }
            EvoError::EncodingLength(msg) => write!(f, "encoding error: {}", msg),
            EvoError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            EvoError::ExternalScore(msg) => write!(f, "external score error: {}", msg),
            EvoError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for EvoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EvoError {
    fn from(e: std::io::Error) -> Self {
        EvoError::Io(e)
    }
}
