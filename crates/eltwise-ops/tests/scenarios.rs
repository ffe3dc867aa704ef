//! End-to-end evaluate scenarios for the Multiply node.

use eltwise_core::{ElementType, Shape, Tensor, ValueRef};
use eltwise_ops::{BroadcastSpec, EVALUATE_TYPES, Multiply, ValidationError};

fn s(dims: &[usize]) -> Shape {
    Shape::new(dims.to_vec())
}

fn node_for(a: &Tensor, b: &Tensor, spec: BroadcastSpec) -> Multiply {
    Multiply::new(
        ValueRef::parameter(a.shape().clone(), a.element_type()),
        ValueRef::parameter(b.shape().clone(), b.element_type()),
        spec,
    )
    .expect("valid node")
}

fn eval(node: &Multiply, a: Tensor, b: Tensor) -> (bool, Tensor) {
    let mut outputs = [Tensor::empty(node.output_meta().element_type)];
    let ran = node.evaluate(&mut outputs, &[a, b]);
    let [out] = outputs;
    (ran, out)
}

#[test]
fn row_vector_broadcast_f32() {
    let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &s(&[2, 3])).unwrap();
    let b = Tensor::from_vec(vec![10.0f32, 10.0, 10.0], &s(&[3])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::Numpy);

    let (ran, out) = eval(&node, a, b);
    assert!(ran);
    assert_eq!(out.shape(), &s(&[2, 3]));
    assert_eq!(
        out.to_vec::<f32>().unwrap(),
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]
    );
}

#[test]
fn scalar_times_vector_f32() {
    let a = Tensor::scalar(5.0f32);
    let b = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &s(&[4])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::Numpy);

    let (ran, out) = eval(&node, a, b);
    assert!(ran);
    assert_eq!(out.shape(), &s(&[4]));
    assert_eq!(out.to_vec::<f32>().unwrap(), vec![5.0, 10.0, 15.0, 20.0]);
}

#[test]
fn incompatible_dims_fail_at_construction() {
    let err = Multiply::new(
        ValueRef::parameter(vec![2], ElementType::F32),
        ValueRef::parameter(vec![3], ElementType::F32),
        BroadcastSpec::Numpy,
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::IncompatibleDims { .. }));
}

#[test]
fn boolean_has_no_interpreted_kernel() {
    let a = Tensor::from_vec(vec![true, false, true], &s(&[3])).unwrap();
    let b = Tensor::from_vec(vec![true, true, false], &s(&[3])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::Numpy);
    assert!(!node.has_evaluate());

    let mut outputs = [Tensor::empty(ElementType::Boolean)];
    let before = outputs[0].clone();
    assert!(!node.evaluate(&mut outputs, &[a, b]));
    assert_eq!(outputs[0], before);
}

#[test]
fn zero_size_dimension_writes_nothing() {
    let a = Tensor::from_vec(Vec::<f32>::new(), &s(&[0, 3])).unwrap();
    let b = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], &s(&[3])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::Numpy);
    assert_eq!(node.output_meta().shape, s(&[0, 3]));

    let (ran, out) = eval(&node, a, b);
    assert!(ran);
    assert_eq!(out.shape(), &s(&[0, 3]));
    assert_eq!(out.numel(), 0);
}

#[test]
fn size_one_operand_keeps_shape() {
    let cases: [&[usize]; 6] = [&[], &[1], &[4], &[2, 3], &[0, 5], &[3, 1, 2]];
    for dims in cases {
        let shape = Shape::from(dims);
        let out = Multiply::infer_output(&shape, &s(&[1]), &BroadcastSpec::Numpy).unwrap();
        let expected = if shape.ndim() == 0 { s(&[1]) } else { shape.clone() };
        assert_eq!(out, expected, "{shape} * [1]");
    }
}

#[test]
fn evaluate_is_idempotent() {
    let a = Tensor::from_vec(vec![0.1f64, -2.5, 3.75, 1e300], &s(&[2, 2])).unwrap();
    let b = Tensor::from_vec(vec![7.0f64, 1e10], &s(&[2])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::Numpy);

    let (_, first) = eval(&node, a.clone(), b.clone());
    let (_, second) = eval(&node, a, b);
    let bits = |t: &Tensor| -> Vec<u64> {
        t.data::<f64>().unwrap().iter().map(|x| x.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn explicit_axis_scales_middle_dimension() {
    // [2, 3, 2] * [3] at axis 1: every [.., k, ..] slice is scaled by rhs[k].
    let a = Tensor::from_vec(vec![1i64; 12], &s(&[2, 3, 2])).unwrap();
    let b = Tensor::from_vec(vec![2i64, 3, 4], &s(&[3])).unwrap();
    let node = node_for(&a, &b, BroadcastSpec::ExplicitAxis(1));

    let (ran, out) = eval(&node, a, b);
    assert!(ran);
    assert_eq!(
        out.to_vec::<i64>().unwrap(),
        vec![2, 2, 3, 3, 4, 4, 2, 2, 3, 3, 4, 4]
    );
}

macro_rules! check_all_evaluate_types {
    ($($ty:ty => $variant:ident),*) => {
        $({
            let a = Tensor::from_vec(
                (1..=6).map(|v| v as $ty).collect::<Vec<$ty>>(),
                &s(&[3, 2]),
            )
            .unwrap();
            let b = Tensor::from_vec(vec![2 as $ty, 3 as $ty], &s(&[2])).unwrap();
            let node = node_for(&a, &b, BroadcastSpec::Numpy);
            assert!(node.has_evaluate(), "{}", ElementType::$variant);

            let (ran, out) = eval(&node, a, b);
            assert!(ran, "{}", ElementType::$variant);
            let expected: Vec<$ty> = [2, 6, 6, 12, 10, 18].iter().map(|&v| v as $ty).collect();
            assert_eq!(out.to_vec::<$ty>().unwrap(), expected);
            assert!(EVALUATE_TYPES.contains(&ElementType::$variant));
        })*
    };
}

#[test]
fn every_evaluate_type_multiplies() {
    check_all_evaluate_types!(
        f32 => F32,
        f64 => F64,
        i32 => I32,
        i64 => I64,
        u32 => U32,
        u64 => U64
    );
}

#[test]
fn unsigned_overflow_wraps() {
    let a = Tensor::from_vec(vec![u64::MAX, 3], &s(&[2])).unwrap();
    let b = Tensor::scalar(2u64);
    let node = node_for(&a, &b, BroadcastSpec::Numpy);

    let (ran, out) = eval(&node, a, b);
    assert!(ran);
    assert_eq!(out.to_vec::<u64>().unwrap(), vec![u64::MAX - 1, 6]);
}

#[test]
#[should_panic(expected = "invalid shapes")]
fn runtime_shapes_must_match_contract() {
    let node = Multiply::new(
        ValueRef::parameter(vec![3], ElementType::F32),
        ValueRef::parameter(vec![3], ElementType::F32),
        BroadcastSpec::None,
    )
    .unwrap();
    let a = Tensor::from_vec(vec![1.0f32, 2.0, 3.0], &s(&[3])).unwrap();
    let b = Tensor::from_vec(vec![1.0f32, 2.0], &s(&[2])).unwrap();
    let mut outputs = [Tensor::empty(ElementType::F32)];
    node.evaluate(&mut outputs, &[a, b]);
}
