//! Run-time element type → specialized kernel dispatch.
//!
//! Each op owns a closed table indexed by [`ElementType::index`]. An entry is
//! a function pointer to the kernel monomorphized for that element type, or
//! `None` when interpreted evaluation does not support the type. Capability
//! queries and evaluation both read the same table.

use eltwise_core::{Element, ElementType, Tensor};

use crate::broadcast::BroadcastSpec;
use crate::kernels::{self, BinaryArithmetic};

/// Kernel signature stored in the dispatch table.
pub type KernelFn = fn(&Tensor, &Tensor, &mut Tensor, &BroadcastSpec) -> bool;

/// Expand `$m!` with the scalar types that have interpreted kernels.
macro_rules! with_evaluate_types {
    ($m:ident) => {
        $m!(f32, f64, i32, i64, u32, u64)
    };
}

macro_rules! element_types {
    ($($ty:ty),*) => {
        &[$(<$ty as Element>::ELEMENT_TYPE),*]
    };
}

/// Element types with an interpreted kernel.
pub const EVALUATE_TYPES: &[ElementType] = with_evaluate_types!(element_types);

/// Element types accepted by static type inference. Wider than
/// [`EVALUATE_TYPES`]: nodes over these types type-check, but only the
/// evaluate set runs on the interpreted path.
pub const TYPECHECK_TYPES: &[ElementType] = &ElementType::ALL;

/// Closed dispatch table for one arithmetic op.
pub struct KernelTable {
    op: &'static str,
    entries: [Option<KernelFn>; ElementType::COUNT],
}

impl KernelTable {
    /// Build the table for `Op` from the evaluate type list.
    pub fn for_op<Op: BinaryArithmetic>() -> Self {
        let mut entries: [Option<KernelFn>; ElementType::COUNT] = [None; ElementType::COUNT];
        macro_rules! register {
            ($($ty:ty),*) => {
                $(
                    entries[<$ty as Element>::ELEMENT_TYPE.index()] =
                        Some(kernels::evaluate::<Op, $ty> as KernelFn);
                )*
            };
        }
        with_evaluate_types!(register);
        tracing::trace!(op = Op::NAME, "built kernel dispatch table");
        Self {
            op: Op::NAME,
            entries,
        }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn lookup(&self, element_type: ElementType) -> Option<KernelFn> {
        self.entries[element_type.index()]
    }

    pub fn supports(&self, element_type: ElementType) -> bool {
        self.lookup(element_type).is_some()
    }

    /// Element types with an entry, in index order.
    pub fn supported_types(&self) -> impl Iterator<Item = ElementType> + '_ {
        ElementType::ALL
            .into_iter()
            .filter(|&et| self.supports(et))
    }

    /// Run the kernel for `element_type`. Returns `false` without touching
    /// `out` when no kernel is registered.
    pub fn dispatch(
        &self,
        element_type: ElementType,
        arg0: &Tensor,
        arg1: &Tensor,
        out: &mut Tensor,
        spec: &BroadcastSpec,
    ) -> bool {
        match self.lookup(element_type) {
            Some(kernel) => kernel(arg0, arg1, out, spec),
            None => {
                tracing::debug!(op = self.op, %element_type, "no interpreted kernel");
                false
            }
        }
    }
}

impl std::fmt::Debug for KernelTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelTable")
            .field("op", &self.op)
            .field("supported", &self.supported_types().collect::<Vec<_>>())
            .finish()
    }
}
