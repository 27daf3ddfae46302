use alloc::vec::Vec;

use super::{BlobDescProto, BlobHeaderProto, LayoutError, ShapeProto, TensorDescProto};
use crate::{Shape, TensorDesc};

/// Which optional header fields a blob carries.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BlobHeaderDesc {
    has_data_id_field: bool,
    has_col_num_field: bool,
    max_col_num: i32,
}

impl Default for BlobHeaderDesc {
    fn default() -> Self {
        Self {
            has_data_id_field: false,
            has_col_num_field: false,
            max_col_num: 1,
        }
    }
}

impl BlobHeaderDesc {
    /// Whether a data id slot is reserved per instance.
    pub fn has_data_id_field(&self) -> bool {
        self.has_data_id_field
    }

    /// Whether a column number slot is reserved per instance.
    pub fn has_col_num_field(&self) -> bool {
        self.has_col_num_field
    }

    /// Largest column number an instance may record.
    pub fn max_col_num(&self) -> i32 {
        self.max_col_num
    }
}

/// Logical description of a blob: the body tensor plus its header flags.
///
/// # Example
///
/// ```rust
/// use burn_placement::{DataType, TensorDesc, blob::BlobDesc};
///
/// let desc = BlobDesc::new(TensorDesc::new([4, 3], DataType::Float32))
///     .with_data_id_field()
///     .with_col_num_field(16);
/// assert!(desc.header().has_col_num_field());
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BlobDesc {
    body: TensorDesc,
    header: BlobHeaderDesc,
}

impl BlobDesc {
    /// A blob with no optional header field.
    pub fn new(body: TensorDesc) -> Self {
        Self {
            body,
            header: BlobHeaderDesc::default(),
        }
    }

    /// Reserves a data id slot per instance.
    pub fn with_data_id_field(mut self) -> Self {
        self.header.has_data_id_field = true;
        self
    }

    /// Reserves a column number slot per instance.
    pub fn with_col_num_field(mut self, max_col_num: i32) -> Self {
        self.header.has_col_num_field = true;
        self.header.max_col_num = max_col_num;
        self
    }

    /// Payload description.
    pub fn body(&self) -> &TensorDesc {
        &self.body
    }

    /// Header flags.
    pub fn header(&self) -> &BlobHeaderDesc {
        &self.header
    }

    /// Flat form of this description.
    ///
    /// Fails when a dimension does not fit the signed serialized form.
    pub fn to_proto(&self) -> Result<BlobDescProto, LayoutError> {
        let dim = self
            .body
            .shape()
            .dims()
            .iter()
            .enumerate()
            .map(|(axis, &dim)| {
                i64::try_from(dim).map_err(|_| LayoutError::DimTooLarge { axis, dim })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlobDescProto {
            body: TensorDescProto {
                shape: ShapeProto { dim },
                data_type: self.body.data_type(),
            },
            header: BlobHeaderProto {
                has_data_id_field: self.header.has_data_id_field,
                has_col_num_field: self.header.has_col_num_field,
                max_col_num: self.header.max_col_num,
            },
        })
    }
}

impl TryFrom<&BlobDescProto> for BlobDesc {
    type Error = LayoutError;

    fn try_from(proto: &BlobDescProto) -> Result<Self, Self::Error> {
        let dims = proto
            .body
            .shape
            .dim
            .iter()
            .enumerate()
            .map(|(axis, &dim)| {
                usize::try_from(dim).map_err(|_| LayoutError::NegativeDim { axis, dim })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            body: TensorDesc::new(Shape::new(dims), proto.body.data_type),
            header: BlobHeaderDesc {
                has_data_id_field: proto.header.has_data_id_field,
                has_col_num_field: proto.header.has_col_num_field,
                max_col_num: proto.header.max_col_num,
            },
        })
    }
}
