//! Logical blob descriptions and their physical byte layout.

mod buffer;
mod desc;
mod pod;
mod proto;
mod rt_blob_desc;

pub use buffer::*;
pub use desc::*;
pub use pod::*;
pub use proto::*;
pub use rt_blob_desc::*;

use crate::DataType;

/// Errors raised while deriving or accessing a blob layout.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A serialized dimension is negative.
    #[error("dimension {axis} is negative ({dim})")]
    NegativeDim {
        /// Axis of the offending dimension.
        axis: usize,
        /// Its value.
        dim: i64,
    },
    /// A dimension cannot be written as a signed 64-bit integer.
    #[error("dimension {axis} is too large ({dim})")]
    DimTooLarge {
        /// Axis of the offending dimension.
        axis: usize,
        /// Its value.
        dim: usize,
    },
    /// A byte size of the layout does not fit in `usize`.
    #[error("byte size of the {0} overflows")]
    SizeOverflow(&'static str),
    /// The header field is not computed by this layout.
    #[error("unsupported layout feature: {0}")]
    Unsupported(&'static str),
    /// The blob has no such header field.
    #[error("blob has no {0} field")]
    FieldAbsent(FieldKey),
    /// The instance index is past the first axis.
    #[error("instance {instance} is out of range for {instance_num} instance(s)")]
    InstanceOutOfRange {
        /// Requested instance.
        instance: usize,
        /// Number of instances.
        instance_num: usize,
    },
    /// A data id does not fit in its slot.
    #[error("data id of {len} bytes exceeds the {max} bytes slot")]
    DataIdTooLong {
        /// Length of the id.
        len: usize,
        /// Slot size.
        max: usize,
    },
    /// A stored data id is not valid UTF-8.
    #[error("data id of instance {instance} is not valid UTF-8")]
    InvalidDataId {
        /// Instance of the slot.
        instance: usize,
    },
    /// A column number is outside `0..=max_col_num`.
    #[error("column number {col_num} exceeds the maximum {max_col_num}")]
    ColNumOutOfRange {
        /// Rejected value.
        col_num: i32,
        /// Largest accepted value.
        max_col_num: i32,
    },
    /// The body was accessed with the wrong element type.
    #[error("blob holds {expected} elements, not {actual}")]
    DataTypeMismatch {
        /// Declared data type.
        expected: DataType,
        /// Requested data type.
        actual: DataType,
    },
    /// The number of elements does not match the shape.
    #[error("expected {expected} element(s), got {actual}")]
    ElementCountMismatch {
        /// Element count of the shape.
        expected: usize,
        /// Element count supplied.
        actual: usize,
    },
    /// The body bytes cannot be viewed as the element type.
    #[error("blob body cannot be viewed as {0}")]
    BodyCast(DataType),
}
