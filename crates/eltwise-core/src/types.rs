//! Core type definitions: ElementType, Shape.

/// Scalar representation of a tensor's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Boolean,
    F16,
    BF16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl ElementType {
    /// Number of element type tags.
    pub const COUNT: usize = 13;

    /// Every tag, ordered by [`ElementType::index`].
    pub const ALL: [ElementType; Self::COUNT] = [
        ElementType::Boolean,
        ElementType::F16,
        ElementType::BF16,
        ElementType::F32,
        ElementType::F64,
        ElementType::I8,
        ElementType::I16,
        ElementType::I32,
        ElementType::I64,
        ElementType::U8,
        ElementType::U16,
        ElementType::U32,
        ElementType::U64,
    ];

    /// Dense index of this tag, suitable for table lookups.
    pub const fn index(self) -> usize {
        match self {
            ElementType::Boolean => 0,
            ElementType::F16 => 1,
            ElementType::BF16 => 2,
            ElementType::F32 => 3,
            ElementType::F64 => 4,
            ElementType::I8 => 5,
            ElementType::I16 => 6,
            ElementType::I32 => 7,
            ElementType::I64 => 8,
            ElementType::U8 => 9,
            ElementType::U16 => 10,
            ElementType::U32 => 11,
            ElementType::U64 => 12,
        }
    }

    /// Size in bytes of a single element.
    pub fn size_bytes(self) -> usize {
        match self {
            ElementType::Boolean | ElementType::I8 | ElementType::U8 => 1,
            ElementType::F16 | ElementType::BF16 | ElementType::I16 | ElementType::U16 => 2,
            ElementType::F32 | ElementType::I32 | ElementType::U32 => 4,
            ElementType::F64 | ElementType::I64 | ElementType::U64 => 8,
        }
    }

    pub fn is_real(self) -> bool {
        matches!(
            self,
            ElementType::F16 | ElementType::BF16 | ElementType::F32 | ElementType::F64
        )
    }

    pub fn is_integral(self) -> bool {
        !self.is_real() && self != ElementType::Boolean
    }

    pub fn is_signed(self) -> bool {
        self.is_real()
            || matches!(
                self,
                ElementType::I8 | ElementType::I16 | ElementType::I32 | ElementType::I64
            )
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementType::Boolean => "boolean",
            ElementType::F16 => "f16",
            ElementType::BF16 => "bf16",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::U32 => "u32",
            ElementType::U64 => "u64",
        };
        f.pad(name)
    }
}

/// Tensor shape (dimensions).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    /// Scalar (rank-0) shape.
    pub fn scalar() -> Self {
        Self(vec![])
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements. A scalar holds one element.
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Whether any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.0.contains(&0)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Row-major strides in elements.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.0.len()];
        for i in (0..self.0.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.0[i + 1];
        }
        strides
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
