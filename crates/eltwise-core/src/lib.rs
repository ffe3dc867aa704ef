//! Foundational types for typed elementwise evaluation.
//!
//! `eltwise-core` provides the element-type tags (`ElementType`), shapes
//! (`Shape`), externally owned typed buffers (`Tensor`) and the static graph
//! metadata (`TensorMeta`, `ValueRef`) that operator nodes are built from.

pub mod graph;
pub mod tensor;
pub mod types;

pub use graph::{NodeId, TensorMeta, ValueRef};
pub use tensor::{Element, Tensor, TensorData};
pub use types::{ElementType, Shape};

pub type Result<T> = std::result::Result<T, TensorError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("data length {len} does not match shape {shape} (expected {expected})")]
    LengthMismatch {
        len: usize,
        shape: Shape,
        expected: usize,
    },

    #[error("element type mismatch: tensor holds {actual}, requested {requested}")]
    TypeMismatch {
        actual: ElementType,
        requested: ElementType,
    },
}
