//! Element-type specialized broadcasting kernels.
//!
//! A kernel is a plain function monomorphized over the scalar type `T` and
//! the arithmetic op. It owns nothing: the caller allocates and owns both
//! inputs and the output.

use eltwise_core::{Element, Shape, Tensor};

use crate::broadcast::{BroadcastPlan, BroadcastSpec};
use crate::error::Result;

/// Scalar types with native arithmetic usable by kernels.
pub trait Numeric: Element {
    /// Multiplication with the type's native semantics: wraparound for
    /// integers, IEEE 754 for floats.
    fn mul(self, rhs: Self) -> Self;
}

macro_rules! impl_numeric_int {
    ($($ty:ty),*) => {
        $(impl Numeric for $ty {
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
        })*
    };
}

macro_rules! impl_numeric_float {
    ($($ty:ty),*) => {
        $(impl Numeric for $ty {
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }
        })*
    };
}

impl_numeric_int!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_numeric_float!(f32, f64);

/// An elementwise binary arithmetic operation.
pub trait BinaryArithmetic: Send + Sync + 'static {
    /// Operator name, used in errors and trace scopes.
    const NAME: &'static str;

    fn apply<T: Numeric>(lhs: T, rhs: T) -> T;

    /// The op's dispatch table, built once per process.
    fn kernels() -> &'static crate::dispatch::KernelTable;
}

/// Elementwise multiplication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mul;

impl BinaryArithmetic for Mul {
    const NAME: &'static str = "Multiply";

    #[inline]
    fn apply<T: Numeric>(lhs: T, rhs: T) -> T {
        lhs.mul(rhs)
    }

    fn kernels() -> &'static crate::dispatch::KernelTable {
        static TABLE: std::sync::LazyLock<crate::dispatch::KernelTable> =
            std::sync::LazyLock::new(crate::dispatch::KernelTable::for_op::<Mul>);
        &TABLE
    }
}

/// Apply `Op` elementwise over raw buffers with broadcasting.
///
/// `out` must hold at least as many elements as the broadcast output shape.
/// When that shape has a zero dimension nothing is read or written.
pub fn binary_broadcast<Op: BinaryArithmetic, T: Numeric>(
    lhs: &[T],
    rhs: &[T],
    out: &mut [T],
    shape0: &Shape,
    shape1: &Shape,
    spec: &BroadcastSpec,
) -> Result<Shape> {
    let plan = BroadcastPlan::new(shape0, shape1, spec)?;
    run_plan::<Op, T>(lhs, rhs, out, &plan);
    Ok(plan.shape)
}

/// Walk the output in row-major order, carrying the input offsets along.
fn run_plan<Op: BinaryArithmetic, T: Numeric>(
    lhs: &[T],
    rhs: &[T],
    out: &mut [T],
    plan: &BroadcastPlan,
) {
    let total = plan.numel();
    if total == 0 {
        return;
    }
    let dims = plan.shape.dims();
    let mut coord = vec![0usize; dims.len()];
    let (mut li, mut ri) = (0usize, 0usize);

    for o in &mut out[..total] {
        *o = Op::apply(lhs[li], rhs[ri]);
        for d in (0..dims.len()).rev() {
            coord[d] += 1;
            li += plan.lhs_strides[d];
            ri += plan.rhs_strides[d];
            if coord[d] < dims[d] {
                break;
            }
            li -= plan.lhs_strides[d] * dims[d];
            ri -= plan.rhs_strides[d] * dims[d];
            coord[d] = 0;
        }
    }
}

/// Tensor-level kernel entry stored in the dispatch table.
///
/// The output tensor must already be shaped to the broadcast result and
/// hold elements of type `T`; inputs must both hold `T`. Those are contract
/// violations and panic.
pub fn evaluate<Op: BinaryArithmetic, T: Numeric>(
    arg0: &Tensor,
    arg1: &Tensor,
    out: &mut Tensor,
    spec: &BroadcastSpec,
) -> bool {
    let plan = BroadcastPlan::new(arg0.shape(), arg1.shape(), spec).unwrap_or_else(|e| {
        panic!("{} kernel called with unvalidated shapes: {e}", Op::NAME)
    });
    assert_eq!(
        out.shape(),
        &plan.shape,
        "{} output must be shaped before the kernel runs",
        Op::NAME
    );
    let (Ok(lhs), Ok(rhs), Ok(dst)) = (arg0.data::<T>(), arg1.data::<T>(), out.data_mut::<T>())
    else {
        panic!("{} {} kernel called with mismatched element types", Op::NAME, T::ELEMENT_TYPE);
    };
    run_plan::<Op, T>(lhs, rhs, dst, &plan);
    true
}
