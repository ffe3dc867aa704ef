//! Reference executor: interpreted evaluation with a compiled fallback.
//!
//! The executor owns output allocation. For each node it asks
//! `has_evaluate()`, runs the interpreted kernel when possible and otherwise
//! hands the node to a [`CompiledBackend`].

use std::sync::Arc;

use eltwise_core::{ElementType, Tensor, TensorError};

use crate::broadcast::BroadcastSpec;
use crate::kernels::BinaryArithmetic;
use crate::node::ArithmeticNode;
use crate::scope::{NoopScope, OpScope};

/// Environment variable selecting the execution mode.
pub const EXEC_MODE_ENV: &str = "ELTWISE_EXEC";

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("no kernel for {op} on {element_type}")]
    NoKernel {
        op: &'static str,
        element_type: ElementType,
    },

    #[error("{op} expects {expected} inputs, got {got}")]
    InputCount {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{op} declared {expected} but got inputs {lhs} and {rhs}")]
    ElementType {
        op: &'static str,
        expected: ElementType,
        lhs: ElementType,
        rhs: ElementType,
    },

    #[error("backend {backend} failed: {message}")]
    Backend { backend: String, message: String },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Which execution paths the executor may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Interpreted when `has_evaluate()`, compiled otherwise.
    #[default]
    Auto,
    Interpreted,
    Compiled,
}

impl ExecMode {
    /// Parse a mode name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(ExecMode::Auto),
            "interpreted" | "interp" => Some(ExecMode::Interpreted),
            "compiled" => Some(ExecMode::Compiled),
            _ => None,
        }
    }

    /// Read the mode from `ELTWISE_EXEC`, falling back to `Auto` when unset
    /// or unrecognized.
    pub fn from_env() -> Self {
        match std::env::var(EXEC_MODE_ENV) {
            Ok(val) => Self::parse(&val).unwrap_or_else(|| {
                tracing::warn!(value = %val, "unrecognized {EXEC_MODE_ENV}, using auto");
                ExecMode::Auto
            }),
            Err(_) => ExecMode::Auto,
        }
    }

    fn allows_interpreted(self) -> bool {
        self != ExecMode::Compiled
    }

    fn allows_compiled(self) -> bool {
        self != ExecMode::Interpreted
    }
}

/// The path that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPath {
    Interpreted,
    Compiled,
}

/// Compiled-kernel execution path used when interpreted evaluation is not
/// available.
pub trait CompiledBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this backend can run `op` over `element_type`.
    fn supports(&self, op: &'static str, element_type: ElementType) -> bool;

    /// Run `op` over `inputs` into `output`. `output` arrives shaped to the
    /// node's inferred output.
    fn run(
        &self,
        op: &'static str,
        spec: &BroadcastSpec,
        inputs: &[Tensor],
        output: &mut Tensor,
    ) -> Result<()>;
}

/// Drives nodes through the interpreted or compiled path.
pub struct Executor {
    mode: ExecMode,
    backend: Option<Arc<dyn CompiledBackend>>,
    scope: Arc<dyn OpScope>,
}

impl Executor {
    /// Executor configured from the environment, interpreted path only.
    pub fn new() -> Self {
        Self {
            mode: ExecMode::from_env(),
            backend: None,
            scope: Arc::new(NoopScope),
        }
    }

    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn CompiledBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_scope(mut self, scope: Arc<dyn OpScope>) -> Self {
        self.scope = scope;
        self
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Evaluate `node` over `inputs`, allocating its output tensor.
    pub fn run<Op: BinaryArithmetic>(
        &self,
        node: &ArithmeticNode<Op>,
        inputs: &[Tensor],
    ) -> Result<(Tensor, ExecPath)> {
        if inputs.len() != 2 {
            return Err(ExecError::InputCount {
                op: Op::NAME,
                expected: 2,
                got: inputs.len(),
            });
        }
        let expected = node.output_meta().element_type;
        let (lhs, rhs) = (inputs[0].element_type(), inputs[1].element_type());
        if lhs != expected || rhs != expected {
            return Err(ExecError::ElementType {
                op: Op::NAME,
                expected,
                lhs,
                rhs,
            });
        }
        let element_type = expected;
        let mut outputs = [Tensor::empty(element_type)];

        if self.mode.allows_interpreted() && node.has_evaluate_in(self.scope.as_ref()) {
            if node.evaluate_in(&mut outputs, inputs, self.scope.as_ref()) {
                tracing::debug!(op = Op::NAME, node = %node.id(), %element_type, "interpreted");
                let [output] = outputs;
                return Ok((output, ExecPath::Interpreted));
            }
            tracing::debug!(
                op = Op::NAME,
                node = %node.id(),
                %element_type,
                "interpreted evaluate declined"
            );
        }

        if self.mode.allows_compiled()
            && let Some(backend) = &self.backend
            && backend.supports(Op::NAME, element_type)
        {
            let [mut output] = outputs;
            output.set_shape(node.output_meta().shape.clone());
            backend.run(Op::NAME, node.broadcast_spec(), inputs, &mut output)?;
            tracing::debug!(
                op = Op::NAME,
                node = %node.id(),
                backend = backend.name(),
                %element_type,
                "compiled"
            );
            return Ok((output, ExecPath::Compiled));
        }

        Err(ExecError::NoKernel {
            op: Op::NAME,
            element_type,
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("mode", &self.mode)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish_non_exhaustive()
    }
}
