//! Static graph metadata.
//!
//! Operator nodes do not hold tensor data. They refer to the outputs of other
//! nodes through [`ValueRef`], which carries the declared shape and element
//! type used for static inference.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{ElementType, Shape};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a node in the computation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Allocate a fresh, process-unique id.
    pub fn fresh() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Metadata about a tensor (known before materialization).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorMeta {
    pub shape: Shape,
    pub element_type: ElementType,
}

impl TensorMeta {
    pub fn new(shape: impl Into<Shape>, element_type: ElementType) -> Self {
        Self {
            shape: shape.into(),
            element_type,
        }
    }
}

/// Reference to one output port of a producer node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueRef {
    pub producer: NodeId,
    pub port: usize,
    pub meta: TensorMeta,
}

impl ValueRef {
    pub fn new(producer: NodeId, port: usize, meta: TensorMeta) -> Self {
        Self {
            producer,
            port,
            meta,
        }
    }

    /// A graph input: a value produced by a fresh parameter node.
    pub fn parameter(shape: impl Into<Shape>, element_type: ElementType) -> Self {
        Self::new(NodeId::fresh(), 0, TensorMeta::new(shape, element_type))
    }

    pub fn shape(&self) -> &Shape {
        &self.meta.shape
    }

    pub fn element_type(&self) -> ElementType {
        self.meta.element_type
    }
}
