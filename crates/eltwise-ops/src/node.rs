//! Elementwise binary arithmetic graph nodes.
//!
//! A node is built through a validating constructor: shapes and element
//! types of both inputs are checked and the output meta is inferred before
//! the node exists. Cloning with new inputs goes through the same path, so a
//! node is never observable in a partially validated state.
//!
//! Evaluation dispatches on the run-time element type of input 0 through the
//! op's [`KernelTable`](crate::dispatch::KernelTable). An element type that
//! type-checks but has no interpreted kernel makes `evaluate` return `false`;
//! the caller is expected to fall back to another execution path.

use std::marker::PhantomData;

use eltwise_core::{ElementType, NodeId, Shape, Tensor, TensorMeta, ValueRef};
use smallvec::SmallVec;

use crate::broadcast::{BroadcastSpec, broadcast_shape};
use crate::dispatch::TYPECHECK_TYPES;
use crate::error::{Result, ValidationError};
use crate::kernels::{BinaryArithmetic, Mul};
use crate::scope::{NoopScope, OpScope};

/// Elementwise multiplication node.
pub type Multiply = ArithmeticNode<Mul>;

/// A binary elementwise arithmetic node over two graph values.
pub struct ArithmeticNode<Op: BinaryArithmetic> {
    id: NodeId,
    inputs: SmallVec<[ValueRef; 2]>,
    spec: BroadcastSpec,
    output: TensorMeta,
    _op: PhantomData<fn() -> Op>,
}

impl<Op: BinaryArithmetic> ArithmeticNode<Op> {
    /// Build a node, inferring its output shape and element type.
    pub fn new(arg0: ValueRef, arg1: ValueRef, spec: BroadcastSpec) -> Result<Self> {
        let output = Self::infer_meta(&arg0.meta, &arg1.meta, &spec)?;
        Ok(Self {
            id: NodeId::fresh(),
            inputs: SmallVec::from_buf([arg0, arg1]),
            spec,
            output,
            _op: PhantomData,
        })
    }

    /// Build a node from an input list, which must hold exactly two values.
    pub fn from_inputs(inputs: &[ValueRef], spec: BroadcastSpec) -> Result<Self> {
        match inputs {
            [arg0, arg1] => Self::new(arg0.clone(), arg1.clone(), spec),
            _ => Err(ValidationError::Arity {
                expected: 2,
                got: inputs.len(),
            }),
        }
    }

    /// Output shape of `shape0 ⊗ shape1` under `spec`.
    pub fn infer_output(shape0: &Shape, shape1: &Shape, spec: &BroadcastSpec) -> Result<Shape> {
        broadcast_shape(shape0, shape1, spec)
    }

    fn infer_meta(a: &TensorMeta, b: &TensorMeta, spec: &BroadcastSpec) -> Result<TensorMeta> {
        if a.element_type != b.element_type {
            return Err(ValidationError::ElementTypeMismatch {
                lhs: a.element_type,
                rhs: b.element_type,
            });
        }
        if !TYPECHECK_TYPES.contains(&a.element_type) {
            return Err(ValidationError::UnsupportedElementType {
                op: Op::NAME,
                element_type: a.element_type,
            });
        }
        let shape = Self::infer_output(&a.shape, &b.shape, spec)?;
        Ok(TensorMeta {
            shape,
            element_type: a.element_type,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        Op::NAME
    }

    pub fn inputs(&self) -> &[ValueRef] {
        &self.inputs
    }

    pub fn broadcast_spec(&self) -> &BroadcastSpec {
        &self.spec
    }

    pub fn output_meta(&self) -> &TensorMeta {
        &self.output
    }

    /// Static element type of input 0.
    pub fn input_element_type(&self) -> ElementType {
        self.inputs[0].element_type()
    }

    // ── Graph contract ──────────────────────────────────────────────────

    /// New node with the same broadcast spec over `new_inputs`.
    pub fn clone_with_new_inputs(&self, new_inputs: &[ValueRef]) -> Result<Self> {
        self.clone_with_new_inputs_in(new_inputs, &NoopScope)
    }

    pub fn clone_with_new_inputs_in(
        &self,
        new_inputs: &[ValueRef],
        scope: &dyn OpScope,
    ) -> Result<Self> {
        let _scope = scope.enter(Op::NAME, "clone_with_new_inputs");
        Self::from_inputs(new_inputs, self.spec)
    }

    /// Whether the interpreted path can evaluate this node's input type.
    pub fn has_evaluate(&self) -> bool {
        self.has_evaluate_in(&NoopScope)
    }

    pub fn has_evaluate_in(&self, scope: &dyn OpScope) -> bool {
        let _scope = scope.enter(Op::NAME, "has_evaluate");
        Op::kernels().supports(self.input_element_type())
    }

    /// Evaluate into `outputs[0]`. Returns `false` when no kernel supports
    /// the element type of `inputs[0]`; the output is left untouched then.
    ///
    /// # Panics
    ///
    /// When `outputs` does not hold exactly one tensor, `inputs` does not
    /// hold exactly two, or the runtime input shapes are not broadcastable
    /// under the node's spec. For a supported element type, both inputs and
    /// `outputs[0]` must also hold that type; [`Executor`](crate::Executor)
    /// checks this against the declared type and reports
    /// [`ExecError::ElementType`](crate::ExecError::ElementType) instead.
    pub fn evaluate(&self, outputs: &mut [Tensor], inputs: &[Tensor]) -> bool {
        self.evaluate_in(outputs, inputs, &NoopScope)
    }

    pub fn evaluate_in(
        &self,
        outputs: &mut [Tensor],
        inputs: &[Tensor],
        scope: &dyn OpScope,
    ) -> bool {
        let _scope = scope.enter(Op::NAME, "evaluate");
        assert_eq!(outputs.len(), 1, "{} produces exactly one output", Op::NAME);
        assert_eq!(inputs.len(), 2, "{} takes exactly two inputs", Op::NAME);

        let element_type = inputs[0].element_type();
        let kernels = Op::kernels();
        if !kernels.supports(element_type) {
            tracing::debug!(op = Op::NAME, node = %self.id, %element_type, "evaluate unsupported");
            return false;
        }

        let shape = Self::infer_output(inputs[0].shape(), inputs[1].shape(), &self.spec)
            .unwrap_or_else(|e| panic!("{} evaluated with invalid shapes: {e}", Op::NAME));
        tracing::trace!(op = Op::NAME, node = %self.id, %element_type, %shape, "evaluate");
        outputs[0].set_shape(shape);
        kernels.dispatch(element_type, &inputs[0], &inputs[1], &mut outputs[0], &self.spec)
    }
}

impl<Op: BinaryArithmetic> std::fmt::Debug for ArithmeticNode<Op> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(Op::NAME)
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("spec", &self.spec)
            .field("output", &self.output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::scope::ScopeGuard;

    fn s(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec())
    }

    fn param(dims: &[usize], et: ElementType) -> ValueRef {
        ValueRef::parameter(dims.to_vec(), et)
    }

    #[derive(Default)]
    struct RecordingScope(Mutex<Vec<(&'static str, &'static str)>>);

    impl OpScope for RecordingScope {
        fn enter(&self, op: &'static str, entry: &'static str) -> ScopeGuard {
            self.0.lock().unwrap().push((op, entry));
            ScopeGuard::none()
        }
    }

    #[test]
    fn test_infers_output_meta() {
        let node = Multiply::new(
            param(&[2, 3], ElementType::F32),
            param(&[3], ElementType::F32),
            BroadcastSpec::Numpy,
        )
        .unwrap();
        assert_eq!(node.output_meta(), &TensorMeta::new(s(&[2, 3]), ElementType::F32));
        assert_eq!(node.name(), "Multiply");
        assert_eq!(node.inputs().len(), 2);
    }

    #[test]
    fn test_incompatible_shapes_rejected() {
        let err = Multiply::new(
            param(&[2], ElementType::F32),
            param(&[3], ElementType::F32),
            BroadcastSpec::Numpy,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::IncompatibleDims { .. }));
    }

    #[test]
    fn test_element_type_mismatch_rejected() {
        let err = Multiply::new(
            param(&[2], ElementType::F32),
            param(&[2], ElementType::I32),
            BroadcastSpec::Numpy,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ElementTypeMismatch {
                lhs: ElementType::F32,
                rhs: ElementType::I32,
            }
        );
    }

    #[test]
    fn test_clone_keeps_spec_and_reinfers() {
        let node = Multiply::new(
            param(&[4, 1], ElementType::I64),
            param(&[4, 1], ElementType::I64),
            BroadcastSpec::ExplicitAxis(0),
        )
        .unwrap();
        let cloned = node
            .clone_with_new_inputs(&[param(&[2, 5], ElementType::U32), param(&[2], ElementType::U32)])
            .unwrap();
        assert_eq!(cloned.broadcast_spec(), &BroadcastSpec::ExplicitAxis(0));
        assert_eq!(cloned.output_meta(), &TensorMeta::new(s(&[2, 5]), ElementType::U32));
        assert_ne!(cloned.id(), node.id());
    }

    #[test]
    fn test_clone_arity() {
        let a = param(&[2], ElementType::F64);
        let node = Multiply::new(a.clone(), a.clone(), BroadcastSpec::None).unwrap();
        for n in [0, 1, 3] {
            let inputs = vec![a.clone(); n];
            let err = node.clone_with_new_inputs(&inputs).unwrap_err();
            assert_eq!(err, ValidationError::Arity { expected: 2, got: n });
        }
    }

    #[test]
    fn test_clone_revalidates() {
        let node = Multiply::new(
            param(&[3], ElementType::F32),
            param(&[3], ElementType::F32),
            BroadcastSpec::None,
        )
        .unwrap();
        let err = node
            .clone_with_new_inputs(&[param(&[3], ElementType::F32), param(&[1], ElementType::F32)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_has_evaluate_follows_input_type() {
        for et in ElementType::ALL {
            let node = Multiply::new(param(&[1], et), param(&[1], et), BroadcastSpec::Numpy).unwrap();
            assert_eq!(
                node.has_evaluate(),
                crate::dispatch::EVALUATE_TYPES.contains(&et),
                "{et}"
            );
        }
    }

    #[test]
    fn test_evaluate_sets_shape_and_values() {
        let node = Multiply::new(
            param(&[2, 3], ElementType::I32),
            param(&[3], ElementType::I32),
            BroadcastSpec::Numpy,
        )
        .unwrap();
        let a = Tensor::from_vec(vec![1i32, 2, 3, 4, 5, 6], &s(&[2, 3])).unwrap();
        let b = Tensor::from_vec(vec![-1i32, 0, 2], &s(&[3])).unwrap();
        let mut outputs = [Tensor::empty(ElementType::I32)];
        assert!(node.evaluate(&mut outputs, &[a, b]));
        assert_eq!(outputs[0].shape(), &s(&[2, 3]));
        assert_eq!(outputs[0].to_vec::<i32>().unwrap(), vec![-1, 0, 6, -4, 0, 12]);
    }

    #[test]
    fn test_evaluate_unsupported_returns_false() {
        let node = Multiply::new(
            param(&[2], ElementType::U8),
            param(&[2], ElementType::U8),
            BroadcastSpec::Numpy,
        )
        .unwrap();
        assert!(!node.has_evaluate());
        let a = Tensor::from_vec(vec![2u8, 3], &s(&[2])).unwrap();
        let mut outputs = [Tensor::empty(ElementType::U8)];
        assert!(!node.evaluate(&mut outputs, &[a.clone(), a]));
        assert_eq!(outputs[0], Tensor::empty(ElementType::U8));
    }

    #[test]
    #[should_panic(expected = "exactly one output")]
    fn test_evaluate_two_outputs_panics() {
        let a = param(&[1], ElementType::F32);
        let node = Multiply::new(a.clone(), a, BroadcastSpec::Numpy).unwrap();
        let t = Tensor::scalar(1.0f32);
        let mut outputs = [Tensor::empty(ElementType::F32), Tensor::empty(ElementType::F32)];
        node.evaluate(&mut outputs, &[t.clone(), t]);
    }

    #[test]
    #[should_panic(expected = "exactly one output")]
    fn test_evaluate_no_outputs_panics() {
        let a = param(&[1], ElementType::F32);
        let node = Multiply::new(a.clone(), a, BroadcastSpec::Numpy).unwrap();
        let t = Tensor::scalar(1.0f32);
        node.evaluate(&mut [], &[t.clone(), t]);
    }

    #[test]
    #[should_panic(expected = "mismatched element types")]
    fn test_evaluate_mixed_input_types_panics() {
        let a = param(&[2], ElementType::F32);
        let node = Multiply::new(a.clone(), a, BroadcastSpec::Numpy).unwrap();
        let lhs = Tensor::from_vec(vec![1.0f32, 2.0], &s(&[2])).unwrap();
        let rhs = Tensor::from_vec(vec![1i32, 2], &s(&[2])).unwrap();
        let mut outputs = [Tensor::empty(ElementType::F32)];
        node.evaluate(&mut outputs, &[lhs, rhs]);
    }

    #[test]
    fn test_entry_points_enter_scope() {
        let scope = RecordingScope::default();
        let a = param(&[2], ElementType::F32);
        let node = Multiply::new(a.clone(), a.clone(), BroadcastSpec::Numpy).unwrap();
        node.has_evaluate_in(&scope);
        let t = Tensor::from_vec(vec![1.0f32, 2.0], &s(&[2])).unwrap();
        let mut outputs = [Tensor::empty(ElementType::F32)];
        node.evaluate_in(&mut outputs, &[t.clone(), t], &scope);
        node.clone_with_new_inputs_in(&[a.clone(), a], &scope).unwrap();
        assert_eq!(
            *scope.0.lock().unwrap(),
            vec![
                ("Multiply", "has_evaluate"),
                ("Multiply", "evaluate"),
                ("Multiply", "clone_with_new_inputs"),
            ]
        );
    }

    #[test]
    fn test_node_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Multiply>();
    }
}
