use alloc::vec::Vec;
use core::fmt;

use super::LayoutError;

/// Identifies a header sub-field.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum FieldKey {
    /// One data id slot per instance.
    DataId,
    /// One column number per instance.
    ColNum,
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::DataId => f.write_str("data id"),
            FieldKey::ColNum => f.write_str("column number"),
        }
    }
}

/// Placement of one field inside a plain-old-data struct.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct FieldDesc {
    /// Offset in bytes from the start of the struct.
    pub offset: usize,
    /// Size in bytes.
    pub byte_size: usize,
}

impl FieldDesc {
    /// One past the last byte of the field.
    pub fn end(&self) -> usize {
        self.offset + self.byte_size
    }
}

/// Byte layout of a plain-old-data struct made of contiguous fields.
///
/// Fields are packed in insertion order with no padding.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct StructPodDesc {
    fields: Vec<(FieldKey, FieldDesc)>,
    byte_size: usize,
}

impl StructPodDesc {
    /// An empty struct.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field of `byte_size` bytes right after the previous one.
    pub fn add_field(&mut self, key: FieldKey, byte_size: usize) -> Result<(), LayoutError> {
        let end = self
            .byte_size
            .checked_add(byte_size)
            .ok_or(LayoutError::SizeOverflow("header"))?;
        self.fields.push((
            key,
            FieldDesc {
                offset: self.byte_size,
                byte_size,
            },
        ));
        self.byte_size = end;
        Ok(())
    }

    /// Placement of the field `key`, if present.
    pub fn field(&self, key: FieldKey) -> Option<FieldDesc> {
        self.fields
            .iter()
            .find(|(field_key, _)| *field_key == key)
            .map(|(_, field)| *field)
    }

    /// Whether the field `key` is present.
    pub fn has_field(&self, key: FieldKey) -> bool {
        self.field(key).is_some()
    }

    /// Fields in layout order.
    pub fn fields(&self) -> &[(FieldKey, FieldDesc)] {
        &self.fields
    }

    /// Total size in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_packed_in_order() {
        let mut pod = StructPodDesc::new();
        pod.add_field(FieldKey::DataId, 128).unwrap();
        pod.add_field(FieldKey::ColNum, 8).unwrap();

        assert_eq!(
            pod.field(FieldKey::ColNum),
            Some(FieldDesc {
                offset: 128,
                byte_size: 8
            })
        );
        assert_eq!(pod.byte_size(), 136);
    }

    #[test]
    fn test_overflowing_field_is_rejected() {
        let mut pod = StructPodDesc::new();
        pod.add_field(FieldKey::DataId, usize::MAX).unwrap();

        assert_eq!(
            pod.add_field(FieldKey::ColNum, 1),
            Err(LayoutError::SizeOverflow("header"))
        );
        assert_eq!(pod.fields().len(), 1);
        assert_eq!(pod.byte_size(), usize::MAX);
    }

    #[test]
    fn test_empty_pod() {
        let pod = StructPodDesc::new();

        assert_eq!(pod.byte_size(), 0);
        assert!(!pod.has_field(FieldKey::DataId));
    }
}
