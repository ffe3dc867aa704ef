//! Typed, shaped buffers owned by the caller.
//!
//! The element type of a tensor is fixed at construction and always matches
//! the variant of its storage. Operators borrow tensors for the duration of a
//! call and never retain them.

use half::{bf16, f16};

use crate::{ElementType, Result, Shape, TensorError};

/// Typed storage backing a [`Tensor`].
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    Boolean(Vec<bool>),
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

/// A Rust scalar type that can back a tensor.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn slice(data: &TensorData) -> Option<&[Self]>;
    fn slice_mut(data: &mut TensorData) -> Option<&mut [Self]>;
    fn wrap(data: Vec<Self>) -> TensorData;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const ELEMENT_TYPE: ElementType = ElementType::$variant;

                fn slice(data: &TensorData) -> Option<&[Self]> {
                    match data {
                        TensorData::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                fn slice_mut(data: &mut TensorData) -> Option<&mut [Self]> {
                    match data {
                        TensorData::$variant(v) => Some(v.as_mut_slice()),
                        _ => None,
                    }
                }

                fn wrap(data: Vec<Self>) -> TensorData {
                    TensorData::$variant(data)
                }
            }
        )*

        impl TensorData {
            /// Zero-filled storage of `len` elements.
            pub fn zeros(element_type: ElementType, len: usize) -> Self {
                match element_type {
                    $(ElementType::$variant => TensorData::$variant(vec![<$ty>::default(); len]),)*
                }
            }

            pub fn element_type(&self) -> ElementType {
                match self {
                    $(TensorData::$variant(_) => ElementType::$variant,)*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $(TensorData::$variant(v) => v.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Grow (zero-filled) or shrink the storage to `len` elements.
            fn resize(&mut self, len: usize) {
                match self {
                    $(TensorData::$variant(v) => v.resize(len, <$ty>::default()),)*
                }
            }
        }
    };
}

impl_element! {
    bool => Boolean,
    f16 => F16,
    bf16 => BF16,
    f32 => F32,
    f64 => F64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

/// A typed tensor: element type tag, shape and storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: TensorData,
}

impl Tensor {
    // ── Constructors ────────────────────────────────────────────────────

    /// Create a zero-filled tensor.
    pub fn zeros(element_type: ElementType, shape: &Shape) -> Self {
        Self {
            data: TensorData::zeros(element_type, shape.numel()),
            shape: shape.clone(),
        }
    }

    /// Create an unshaped tensor of the given element type, ready to be sized
    /// by an operator through [`Tensor::set_shape`].
    pub fn empty(element_type: ElementType) -> Self {
        Self::zeros(element_type, &Shape::new(vec![0]))
    }

    /// Create a tensor from typed data.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &Shape) -> Result<Self> {
        let expected = shape.numel();
        if data.len() != expected {
            return Err(TensorError::LengthMismatch {
                len: data.len(),
                shape: shape.clone(),
                expected,
            });
        }
        Ok(Self {
            shape: shape.clone(),
            data: T::wrap(data),
        })
    }

    /// Create a rank-0 tensor holding `value`.
    pub fn scalar<T: Element>(value: T) -> Self {
        Self {
            shape: Shape::scalar(),
            data: T::wrap(vec![value]),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn storage(&self) -> &TensorData {
        &self.data
    }

    /// Borrow the elements as `T`.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.data).ok_or(TensorError::TypeMismatch {
            actual: self.element_type(),
            requested: T::ELEMENT_TYPE,
        })
    }

    /// Mutably borrow the elements as `T`.
    pub fn data_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        let actual = self.element_type();
        T::slice_mut(&mut self.data).ok_or(TensorError::TypeMismatch {
            actual,
            requested: T::ELEMENT_TYPE,
        })
    }

    /// Copy the elements out as `T`.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.data::<T>().map(<[T]>::to_vec)
    }

    /// Set the logical shape, resizing storage to match. The element type is
    /// preserved; newly exposed elements are zero.
    pub fn set_shape(&mut self, shape: Shape) {
        self.data.resize(shape.numel());
        self.shape = shape;
    }
}
