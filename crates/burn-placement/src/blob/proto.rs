//! Flat, serializable forms of the blob descriptions.
//!
//! These mirror the wire messages exchanged with the graph layer: dimensions
//! are signed and nothing is validated until the message is turned into a
//! [`BlobDesc`](super::BlobDesc).

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::DataType;

/// Serialized shape.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeProto {
    /// Dimension sizes.
    pub dim: Vec<i64>,
}

/// Serialized logical tensor description.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDescProto {
    /// Shape of the tensor.
    pub shape: ShapeProto,
    /// Element data type.
    pub data_type: DataType,
}

/// Serialized header flags.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobHeaderProto {
    /// Whether a data id slot is reserved per instance.
    pub has_data_id_field: bool,
    /// Whether a column number slot is reserved per instance.
    pub has_col_num_field: bool,
    /// Largest column number an instance may record.
    pub max_col_num: i32,
}

impl Default for BlobHeaderProto {
    fn default() -> Self {
        Self {
            has_data_id_field: false,
            has_col_num_field: false,
            max_col_num: 1,
        }
    }
}

/// Serialized blob description: body tensor plus header flags.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDescProto {
    /// Payload description.
    pub body: TensorDescProto,
    /// Header flags.
    #[serde(default)]
    pub header: BlobHeaderProto,
}
