//! Error types
//!
//! Everything here is raised at construction or load time. The world step
//! itself never fails.

use thiserror::Error;

/// Invalid shape or body parameters passed to a constructor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A polygon needs at least three corners
    #[error("polygon has {count} vertices, need at least 3")]
    TooFewVertices {
        /// Number of vertices supplied
        count: usize,
    },

    /// Two consecutive vertices coincide
    #[error("edge {index} has zero length")]
    ZeroLengthEdge {
        /// Index of the edge's first vertex
        index: usize,
    },

    /// A vertex coordinate is NaN or infinite
    #[error("vertex {index} is not finite")]
    NonFiniteVertex {
        /// Offending vertex index
        index: usize,
    },

    /// Mass must be positive and finite for a movable part
    #[error("invalid mass {mass} for a movable part")]
    InvalidMass {
        /// Mass supplied
        mass: f64,
    },

    /// A car needs at least one part to act as its chassis
    #[error("car has no parts")]
    NoParts,
}

/// Failure loading physics settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings JSON did not parse
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
