//! Error types for CSG cells.

use cellgeom_track::ObjectId;
use thiserror::Error;

/// Errors raised while parsing, resolving or configuring a cell.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgError {
    /// A `(` without its `)` or a `)` without its `(`.
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses {
        /// Byte offset of the offending parenthesis.
        position: usize,
    },

    /// A character or token that cannot appear here.
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The token text.
        token: String,
        /// Byte offset of the token.
        position: usize,
    },

    /// An operator with nothing to apply to, or an empty group.
    #[error("missing operand at position {position}")]
    MissingOperand {
        /// Byte offset where an operand was expected.
        position: usize,
    },

    /// A surface reference that is zero or out of range.
    #[error("invalid surface key '{token}'")]
    InvalidSurfaceKey {
        /// The offending text.
        token: String,
    },

    /// The expression has no content.
    #[error("empty expression")]
    Empty,

    /// A referenced surface is not in the table.
    #[error("surface {0} not found")]
    SurfaceNotFound(i32),

    /// A `#N` reference names an unknown object.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// A `#N` reference leads back to itself.
    #[error("object {0} complements itself")]
    CyclicComplement(ObjectId),

    /// The cell has not been populated with surfaces.
    #[error("object has not been populated with surfaces")]
    NotPopulated,

    /// A user-defined bounding box with `max < min`.
    #[error("invalid bounding box on {axis} axis: min {min} > max {max}")]
    InvalidBoundingBox {
        /// Axis name.
        axis: char,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Result type for CSG operations.
pub type Result<T> = std::result::Result<T, CsgError>;
