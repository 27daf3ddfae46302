use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Element data type of a tensor.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// 8-bit signed integer.
    Int8,
    /// 8-bit unsigned integer.
    UInt8,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 16-bit IEEE 754 half-precision float.
    Float16,
    /// 16-bit brain float.
    BFloat16,
    /// 32-bit IEEE 754 float.
    Float32,
    /// 64-bit IEEE 754 float.
    Float64,
}

impl DataType {
    /// Size in bytes of a single element.
    pub const fn size_of(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Float16 | DataType::BFloat16 => 2,
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 => 8,
        }
    }

    /// Whether this is a floating point type.
    pub const fn is_float(&self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::BFloat16 | DataType::Float32 | DataType::Float64
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int8 => "i8",
            DataType::UInt8 => "u8",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::Float16 => "f16",
            DataType::BFloat16 => "bf16",
            DataType::Float32 => "f32",
            DataType::Float64 => "f64",
        };
        f.write_str(name)
    }
}

/// Ordered dimension sizes of a tensor.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Constructs a new [`Shape`] from its dimensions.
    pub fn new<S: Into<Vec<usize>>>(dims: S) -> Self {
        Self { dims: dims.into() }
    }

    /// The dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of axes (the rank).
    pub fn num_axes(&self) -> usize {
        self.dims.len()
    }

    /// Extent of axis `axis`, if it exists.
    pub fn at(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Number of elements. A rank-0 shape holds a single element.
    pub fn elem_cnt(&self) -> usize {
        self.dims.iter().product()
    }

    /// [`Shape::elem_cnt`], or `None` if the count overflows `usize`.
    pub fn checked_elem_cnt(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |cnt, &dim| cnt.checked_mul(dim))
    }

    pub(crate) fn set(&mut self, axis: usize, extent: usize) {
        self.dims[axis] = extent;
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self { dims }
    }
}

impl<const D: usize> From<[usize; D]> for Shape {
    fn from(dims: [usize; D]) -> Self {
        Self::new(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims)
    }
}

/// Logical description of a tensor: its shape and element type, independent
/// of how it is laid out in memory or distributed across devices.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct TensorDesc {
    shape: Shape,
    data_type: DataType,
}

impl TensorDesc {
    /// Constructs a new [`TensorDesc`].
    pub fn new<S: Into<Shape>>(shape: S, data_type: DataType) -> Self {
        Self {
            shape: shape.into(),
            data_type,
        }
    }

    /// Logical shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Element data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of elements.
    pub fn elem_cnt(&self) -> usize {
        self.shape.elem_cnt()
    }

    /// Number of bytes taken by the elements.
    pub fn byte_size(&self) -> usize {
        self.elem_cnt() * self.data_type.size_of()
    }

    /// [`TensorDesc::byte_size`], or `None` if the size overflows `usize`.
    pub fn checked_byte_size(&self) -> Option<usize> {
        self.shape
            .checked_elem_cnt()?
            .checked_mul(self.data_type.size_of())
    }
}
