//! Error types for ttsobol-grids

use thiserror::Error;

/// Result type for grid operations
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur while describing or discretizing input axes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// A catalog needs at least one axis
    #[error("Axis catalog must contain at least one axis")]
    EmptyCatalog,

    /// Axis names must be unique
    #[error("Axis names must be unique, found duplicate: {0}")]
    DuplicateAxisName(String),

    /// Malformed axis description
    #[error("Invalid axis '{axis}': {message}")]
    InvalidAxis { axis: String, message: String },

    /// All probability mass sits on a single value
    #[error("Axis '{axis}' has zero variance over its grid")]
    DegenerateAxis { axis: String },

    /// Grid point has the wrong number of entries
    #[error("Grid point must have length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Grid index out of bounds
    #[error("Grid index {value} for dimension {dim} out of bounds [0, {max})")]
    GridIndexOutOfBounds { dim: usize, value: usize, max: usize },
}
