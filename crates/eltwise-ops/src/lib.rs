//! Broadcasting rules, element-type dispatch and typed evaluation for
//! elementwise binary arithmetic nodes.

pub mod broadcast;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod kernels;
pub mod node;
pub mod scope;

pub use broadcast::{BroadcastPlan, BroadcastSpec, broadcast_shape};
pub use dispatch::{EVALUATE_TYPES, KernelFn, KernelTable, TYPECHECK_TYPES};
pub use error::ValidationError;
pub use exec::{CompiledBackend, ExecError, ExecMode, ExecPath, Executor};
pub use kernels::{BinaryArithmetic, Mul, Numeric};
pub use node::{ArithmeticNode, Multiply};
pub use scope::{NoopScope, OpScope, ScopeGuard, TracingScope};
