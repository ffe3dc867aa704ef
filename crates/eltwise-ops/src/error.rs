//! Static validation errors raised while inferring a node's output.

use eltwise_core::{ElementType, Shape};

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Error returned when a node's inputs are invalid for its operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("shape mismatch without broadcasting: {lhs} vs {rhs}")]
    ShapeMismatch { lhs: Shape, rhs: Shape },

    #[error("cannot broadcast {lhs} with {rhs}: dimension {axis} is incompatible")]
    IncompatibleDims { lhs: Shape, rhs: Shape, axis: usize },

    #[error("invalid broadcast axis {axis} for shapes {lhs} and {rhs}")]
    InvalidAxis { axis: i64, lhs: Shape, rhs: Shape },

    #[error("element type mismatch: {lhs} vs {rhs}")]
    ElementTypeMismatch { lhs: ElementType, rhs: ElementType },

    #[error("{op} does not accept element type {element_type}")]
    UnsupportedElementType {
        op: &'static str,
        element_type: ElementType,
    },

    #[error("expected {expected} inputs, got {got}")]
    Arity { expected: usize, got: usize },
}
