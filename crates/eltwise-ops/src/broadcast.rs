//! Broadcasting rules for binary elementwise ops.
//!
//! Three policies are supported:
//! - `None`: shapes must be identical.
//! - `Numpy`: align from the trailing dimension; a missing or size-1
//!   dimension stretches to the other operand's size.
//! - `ExplicitAxis(axis)`: the lower-rank shape is placed inside the
//!   higher-rank one starting at `axis` (`-1` aligns trailing dimensions),
//!   then NumPy rules apply.

use eltwise_core::Shape;

use crate::error::{Result, ValidationError};

/// Broadcasting policy declared on a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BroadcastSpec {
    None,
    #[default]
    Numpy,
    ExplicitAxis(i64),
}

impl std::fmt::Display for BroadcastSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastSpec::None => f.write_str("none"),
            BroadcastSpec::Numpy => f.write_str("numpy"),
            BroadcastSpec::ExplicitAxis(axis) => write!(f, "axis({axis})"),
        }
    }
}

/// Compute the broadcast output shape of `lhs` and `rhs` under `spec`.
pub fn broadcast_shape(lhs: &Shape, rhs: &Shape, spec: &BroadcastSpec) -> Result<Shape> {
    let (a, b) = align(lhs, rhs, spec)?;
    merge(lhs, rhs, &a, &b)
}

/// Output shape plus the element strides that map each output index back to
/// the two inputs. Broadcast dimensions have stride 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastPlan {
    pub shape: Shape,
    pub lhs_strides: Vec<usize>,
    pub rhs_strides: Vec<usize>,
}

impl BroadcastPlan {
    pub fn new(lhs: &Shape, rhs: &Shape, spec: &BroadcastSpec) -> Result<Self> {
        let (a, b) = align(lhs, rhs, spec)?;
        let shape = merge(lhs, rhs, &a, &b)?;
        Ok(Self {
            lhs_strides: broadcast_strides(&a),
            rhs_strides: broadcast_strides(&b),
            shape,
        })
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }
}

/// Pad both shapes to a common rank according to `spec`.
fn align(lhs: &Shape, rhs: &Shape, spec: &BroadcastSpec) -> Result<(Vec<usize>, Vec<usize>)> {
    match spec {
        BroadcastSpec::None => {
            if lhs != rhs {
                return Err(ValidationError::ShapeMismatch {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                });
            }
            Ok((lhs.0.clone(), rhs.0.clone()))
        }
        BroadcastSpec::Numpy => {
            let rank = lhs.ndim().max(rhs.ndim());
            Ok((
                place(&lhs.0, rank, rank - lhs.ndim()),
                place(&rhs.0, rank, rank - rhs.ndim()),
            ))
        }
        BroadcastSpec::ExplicitAxis(axis) => {
            let rank = lhs.ndim().max(rhs.ndim());
            let short_rank = lhs.ndim().min(rhs.ndim());
            let invalid = || ValidationError::InvalidAxis {
                axis: *axis,
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            };
            let offset = match *axis {
                -1 => rank - short_rank,
                a if a < 0 => return Err(invalid()),
                a => usize::try_from(a).map_err(|_| invalid())?,
            };
            if offset + short_rank > rank {
                return Err(invalid());
            }
            let pad = |s: &Shape| {
                if s.ndim() == rank {
                    s.0.clone()
                } else {
                    place(&s.0, rank, offset)
                }
            };
            Ok((pad(lhs), pad(rhs)))
        }
    }
}

/// Place `dims` into a rank-`rank` shape of ones starting at `offset`.
fn place(dims: &[usize], rank: usize, offset: usize) -> Vec<usize> {
    let mut out = vec![1usize; rank];
    out[offset..offset + dims.len()].copy_from_slice(dims);
    out
}

fn merge(lhs: &Shape, rhs: &Shape, a: &[usize], b: &[usize]) -> Result<Shape> {
    let mut result = Vec::with_capacity(a.len());
    for (axis, (&da, &db)) in a.iter().zip(b).enumerate() {
        let d = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(ValidationError::IncompatibleDims {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
                axis,
            });
        };
        result.push(d);
    }
    Ok(Shape::new(result))
}

fn broadcast_strides(aligned: &[usize]) -> Vec<usize> {
    let strides = Shape::from(aligned).strides();
    aligned
        .iter()
        .zip(strides)
        .map(|(&d, s)| if d == 1 { 0 } else { s })
        .collect()
}
