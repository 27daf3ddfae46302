use core::hash::{Hash, Hasher};
use core::mem::size_of;

use super::{BlobDesc, BlobDescProto, BlobHeaderDesc, FieldKey, LayoutError, StructPodDesc};
use crate::{DataType, Shape, TensorDesc};

/// Bytes reserved for the data id of one instance.
pub const SIZE_OF_ONE_DATA_ID: usize = 64;

/// Bytes reserved for the column number of one instance.
pub const SIZE_OF_ONE_COL_NUM: usize = size_of::<i32>();

/// Physical byte layout of a blob buffer: a header made of optional
/// per-instance fields followed by the body holding the tensor elements.
///
/// The layout is derived once at construction and never recomputed. Two
/// descriptors are equal when their flat descriptions are equal, so equal
/// layouts can be deduplicated across operator boundaries.
#[derive(Debug)]
pub struct RtBlobDesc {
    proto: BlobDescProto,
    body: TensorDesc,
    header: BlobHeaderDesc,
    header_pod_desc: StructPodDesc,
    body_byte_size: usize,
}

/// Instances are counted along the first axis; a rank-0 blob holds one.
fn instance_num(shape: &Shape) -> usize {
    shape.at(0).unwrap_or(1)
}

impl RtBlobDesc {
    /// Derives the layout of `blob_desc`.
    ///
    /// Fails when a byte size of the layout does not fit in `usize`.
    pub fn new(blob_desc: &BlobDesc) -> Result<Self, LayoutError> {
        let proto = blob_desc.to_proto()?;
        let body = blob_desc.body().clone();
        let header = blob_desc.header().clone();
        let instance_num = instance_num(body.shape());

        let mut header_pod_desc = StructPodDesc::new();
        if header.has_data_id_field() {
            let byte_size = instance_num
                .checked_mul(SIZE_OF_ONE_DATA_ID)
                .ok_or(LayoutError::SizeOverflow("header"))?;
            header_pod_desc.add_field(FieldKey::DataId, byte_size)?;
        }
        if header.has_col_num_field() {
            let byte_size = instance_num
                .checked_mul(SIZE_OF_ONE_COL_NUM)
                .ok_or(LayoutError::SizeOverflow("header"))?;
            header_pod_desc.add_field(FieldKey::ColNum, byte_size)?;
        }

        let body_byte_size = body
            .checked_byte_size()
            .ok_or(LayoutError::SizeOverflow("body"))?;
        header_pod_desc
            .byte_size()
            .checked_add(body_byte_size)
            .ok_or(LayoutError::SizeOverflow("blob"))?;

        Ok(Self {
            proto,
            body,
            header,
            header_pod_desc,
            body_byte_size,
        })
    }

    /// Derives the layout from a flat description.
    pub fn from_proto(proto: &BlobDescProto) -> Result<Self, LayoutError> {
        let blob_desc = BlobDesc::try_from(proto)?;
        Self::new(&blob_desc)
    }

    /// Flat description this layout was derived from.
    pub fn proto(&self) -> &BlobDescProto {
        &self.proto
    }

    /// Shape of the body.
    pub fn shape(&self) -> &Shape {
        self.body.shape()
    }

    /// Data type of the body.
    pub fn data_type(&self) -> DataType {
        self.body.data_type()
    }

    /// Number of instances, i.e. header slots per field.
    pub fn instance_num(&self) -> usize {
        instance_num(self.body.shape())
    }

    /// Whether a data id slot is reserved per instance.
    pub fn has_data_id_field(&self) -> bool {
        self.header.has_data_id_field()
    }

    /// Whether a column number slot is reserved per instance.
    pub fn has_col_num_field(&self) -> bool {
        self.header.has_col_num_field()
    }

    // TODO: define per-instance element counts for variable-length bodies,
    // then lay these fields out.
    /// Not computed yet; always [`LayoutError::Unsupported`].
    pub fn has_instance_available_elem_cnt(&self) -> Result<bool, LayoutError> {
        Err(LayoutError::Unsupported("instance available element count field"))
    }

    /// Not computed yet; always [`LayoutError::Unsupported`].
    pub fn has_available_instance_num(&self) -> Result<bool, LayoutError> {
        Err(LayoutError::Unsupported("available instance number field"))
    }

    /// Field layout of the header.
    pub fn header_pod_desc(&self) -> &StructPodDesc {
        &self.header_pod_desc
    }

    /// Largest column number an instance may record.
    pub fn max_col_num(&self) -> i32 {
        self.header.max_col_num()
    }

    /// Bytes of all present header fields.
    pub fn byte_size_of_blob_header(&self) -> usize {
        self.header_pod_desc.byte_size()
    }

    /// Bytes of the body: element size times element count.
    pub fn byte_size_of_blob_body(&self) -> usize {
        self.body_byte_size
    }

    /// Header plus body bytes.
    pub fn total_byte_size(&self) -> usize {
        self.byte_size_of_blob_header() + self.byte_size_of_blob_body()
    }

    /// Bytes of the data id field, 0 when absent.
    pub fn byte_size_of_data_id_field(&self) -> usize {
        self.byte_size_of_field(FieldKey::DataId)
    }

    /// Bytes of the column number field, 0 when absent.
    pub fn byte_size_of_col_num_field(&self) -> usize {
        self.byte_size_of_field(FieldKey::ColNum)
    }

    /// Not computed yet; always [`LayoutError::Unsupported`].
    pub fn byte_size_of_instance_available_elem_cnt_field(&self) -> Result<usize, LayoutError> {
        Err(LayoutError::Unsupported("instance available element count field"))
    }

    /// Not computed yet; always [`LayoutError::Unsupported`].
    pub fn byte_size_of_available_instance_num_field(&self) -> Result<usize, LayoutError> {
        Err(LayoutError::Unsupported("available instance number field"))
    }

    /// Bytes of the data content, i.e. the body.
    pub fn byte_size_of_data_content_field(&self) -> usize {
        self.byte_size_of_blob_body()
    }

    fn byte_size_of_field(&self, key: FieldKey) -> usize {
        self.header_pod_desc
            .field(key)
            .map_or(0, |field| field.byte_size)
    }
}

impl PartialEq for RtBlobDesc {
    fn eq(&self, other: &Self) -> bool {
        self.proto == other.proto
    }
}

impl Eq for RtBlobDesc {}

impl Hash for RtBlobDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.proto.hash(state);
    }
}

impl TryFrom<&BlobDesc> for RtBlobDesc {
    type Error = LayoutError;

    fn try_from(blob_desc: &BlobDesc) -> Result<Self, Self::Error> {
        Self::new(blob_desc)
    }
}
