use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::mem::size_of;

use super::{
    FieldDesc, FieldKey, LayoutError, RtBlobDesc, SIZE_OF_ONE_COL_NUM, SIZE_OF_ONE_DATA_ID,
};
use crate::Element;

/// Backing word of the body; wide enough to align every element type.
type Word = u64;

/// A blob buffer laid out by an [`RtBlobDesc`]: header fields followed by the
/// body elements.
///
/// The body is stored apart from the header so that it is always aligned for
/// its element type, whatever the header size.
#[derive(Clone, Debug)]
pub struct Blob {
    desc: Arc<RtBlobDesc>,
    header: Vec<u8>,
    body: Vec<Word>,
}

impl Blob {
    /// Allocates a zeroed blob.
    pub fn new(desc: Arc<RtBlobDesc>) -> Self {
        let header = vec![0; desc.byte_size_of_blob_header()];
        let body = vec![0; desc.byte_size_of_blob_body().div_ceil(size_of::<Word>())];
        Self { desc, header, body }
    }

    /// Allocates a blob and copies `values` into its body.
    pub fn from_elements<E: Element>(
        desc: Arc<RtBlobDesc>,
        values: &[E],
    ) -> Result<Self, LayoutError> {
        let mut blob = Self::new(desc);
        let body = blob.body_mut::<E>()?;
        if body.len() != values.len() {
            return Err(LayoutError::ElementCountMismatch {
                expected: body.len(),
                actual: values.len(),
            });
        }
        body.copy_from_slice(values);
        Ok(blob)
    }

    /// Layout of this blob.
    pub fn desc(&self) -> &RtBlobDesc {
        &self.desc
    }

    /// Header bytes.
    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    /// Body bytes.
    pub fn body_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Word, u8>(&self.body)[..self.desc.byte_size_of_blob_body()]
    }

    /// Whether the body holds no element.
    pub fn is_body_empty(&self) -> bool {
        self.desc.byte_size_of_blob_body() == 0
    }

    fn check_data_type<E: Element>(&self) -> Result<(), LayoutError> {
        if E::DATA_TYPE != self.desc.data_type() {
            return Err(LayoutError::DataTypeMismatch {
                expected: self.desc.data_type(),
                actual: E::DATA_TYPE,
            });
        }
        Ok(())
    }

    /// Body viewed as elements of type `E`, which must match the declared data type.
    pub fn body<E: Element>(&self) -> Result<&[E], LayoutError> {
        self.check_data_type::<E>()?;
        bytemuck::try_cast_slice(self.body_bytes())
            .map_err(|_| LayoutError::BodyCast(E::DATA_TYPE))
    }

    /// Mutable body viewed as elements of type `E`, which must match the declared data type.
    pub fn body_mut<E: Element>(&mut self) -> Result<&mut [E], LayoutError> {
        self.check_data_type::<E>()?;
        let len = self.desc.byte_size_of_blob_body();
        let bytes = &mut bytemuck::cast_slice_mut::<Word, u8>(&mut self.body)[..len];
        bytemuck::try_cast_slice_mut(bytes).map_err(|_| LayoutError::BodyCast(E::DATA_TYPE))
    }

    /// Bytes of the `instance`-th slot of the header field `key`.
    fn slot(
        &self,
        key: FieldKey,
        slot_size: usize,
        instance: usize,
    ) -> Result<FieldDesc, LayoutError> {
        let field = self
            .desc
            .header_pod_desc()
            .field(key)
            .ok_or(LayoutError::FieldAbsent(key))?;
        let instance_num = self.desc.instance_num();
        if instance >= instance_num {
            return Err(LayoutError::InstanceOutOfRange {
                instance,
                instance_num,
            });
        }
        Ok(FieldDesc {
            offset: field.offset + instance * slot_size,
            byte_size: slot_size,
        })
    }

    /// Data id recorded for `instance`.
    pub fn data_id(&self, instance: usize) -> Result<&str, LayoutError> {
        let slot = self.slot(FieldKey::DataId, SIZE_OF_ONE_DATA_ID, instance)?;
        let bytes = &self.header[slot.offset..slot.end()];
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..len]).map_err(|_| LayoutError::InvalidDataId { instance })
    }

    /// Records the data id of `instance`; ids longer than a slot are rejected.
    pub fn set_data_id(&mut self, instance: usize, data_id: &str) -> Result<(), LayoutError> {
        let slot = self.slot(FieldKey::DataId, SIZE_OF_ONE_DATA_ID, instance)?;
        if data_id.len() > SIZE_OF_ONE_DATA_ID {
            return Err(LayoutError::DataIdTooLong {
                len: data_id.len(),
                max: SIZE_OF_ONE_DATA_ID,
            });
        }
        let bytes = &mut self.header[slot.offset..slot.end()];
        bytes.fill(0);
        bytes[..data_id.len()].copy_from_slice(data_id.as_bytes());
        Ok(())
    }

    /// Column number recorded for `instance`.
    pub fn col_num(&self, instance: usize) -> Result<i32, LayoutError> {
        let slot = self.slot(FieldKey::ColNum, SIZE_OF_ONE_COL_NUM, instance)?;
        let mut raw = [0u8; SIZE_OF_ONE_COL_NUM];
        raw.copy_from_slice(&self.header[slot.offset..slot.end()]);
        Ok(i32::from_ne_bytes(raw))
    }

    /// Records the column number of `instance`, within `0..=max_col_num`.
    pub fn set_col_num(&mut self, instance: usize, col_num: i32) -> Result<(), LayoutError> {
        let slot = self.slot(FieldKey::ColNum, SIZE_OF_ONE_COL_NUM, instance)?;
        let max_col_num = self.desc.max_col_num();
        if !(0..=max_col_num).contains(&col_num) {
            return Err(LayoutError::ColNumOutOfRange {
                col_num,
                max_col_num,
            });
        }
        self.header[slot.offset..slot.end()].copy_from_slice(&col_num.to_ne_bytes());
        Ok(())
    }
}
