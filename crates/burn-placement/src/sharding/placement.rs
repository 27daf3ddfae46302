use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::ops::Range;

use hashbrown::HashSet;

use super::SbpParallel;
use crate::{DeviceType, Shape, TensorDesc};

/// The set of execution units an operator is placed on.
///
/// A `ParallelDesc` fixes the device kind and the ordered list of devices, one
/// per execution unit. Its length is the `N` that gives [`SbpParallel`]
/// descriptors their meaning: the unit at position `parallel_id` holds the
/// `parallel_id`-th slice of a split tensor.
#[derive(Clone, Debug)]
pub struct ParallelDesc<T> {
    /// Kind of device every unit runs on.
    device_type: DeviceType,
    /// Devices, ordered by parallel id.
    devices: Vec<T>,
}

/// Represents errors that can occur when building or querying a [`ParallelDesc`].
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum PlacementError {
    /// No device was given.
    #[error("a parallel description needs at least one device")]
    Empty,
    /// The same device appears twice.
    #[error("device {0} appears more than once")]
    DuplicateDevice(String),
    /// A split axis does not exist in the logical shape.
    #[error("split axis {axis} is out of range for a tensor with {num_axes} axes")]
    SplitAxisOutOfRange {
        /// Requested axis.
        axis: usize,
        /// Rank of the logical shape.
        num_axes: usize,
    },
    /// A parallel id does not name an execution unit.
    #[error("parallel id {parallel_id} is out of range for {parallel_num} unit(s)")]
    ParallelIdOutOfRange {
        /// Requested parallel id.
        parallel_id: usize,
        /// Number of execution units.
        parallel_num: usize,
    },
}

/// A builder for constructing a [`ParallelDesc`].
#[derive(Clone, Debug)]
pub struct ParallelDescBuilder<T> {
    device_type: DeviceType,
    devices: Vec<T>,
}

impl<T> ParallelDescBuilder<T> {
    /// Creates a new [`ParallelDescBuilder`] for devices of kind `device_type`.
    pub fn new(device_type: DeviceType) -> Self {
        Self {
            device_type,
            devices: Vec::new(),
        }
    }

    /// Appends a device; its parallel id is its position in the list.
    pub fn with_device(mut self, device: T) -> Self {
        self.devices.push(device);
        self
    }

    /// Appends several devices, in order.
    pub fn with_devices<I: IntoIterator<Item = T>>(mut self, devices: I) -> Self {
        self.devices.extend(devices);
        self
    }
}

impl<T: Debug + Hash + Eq> ParallelDescBuilder<T> {
    /// Builds a [`ParallelDesc`] from the current configuration.
    ///
    /// Fails when no device was given or when a device is listed twice.
    pub fn build(self) -> Result<ParallelDesc<T>, PlacementError> {
        if self.devices.is_empty() {
            return Err(PlacementError::Empty);
        }

        {
            let mut seen = HashSet::with_capacity(self.devices.len());
            for device in self.devices.iter() {
                if !seen.insert(device) {
                    return Err(PlacementError::DuplicateDevice(format!("{device:?}")));
                }
            }
        }

        Ok(ParallelDesc {
            device_type: self.device_type,
            devices: self.devices,
        })
    }
}

impl<T> ParallelDesc<T> {
    /// Kind of device the units run on.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Number of execution units.
    pub fn parallel_num(&self) -> usize {
        self.devices.len()
    }

    /// Device of unit `parallel_id`.
    pub fn device(&self, parallel_id: usize) -> Option<&T> {
        self.devices.get(parallel_id)
    }

    /// Range of rows of an axis of extent `len` held by unit `parallel_id`.
    ///
    /// Rows are balanced: the first `len % N` units hold one extra row.
    pub fn split_range(
        &self,
        len: usize,
        parallel_id: usize,
    ) -> Result<Range<usize>, PlacementError> {
        let parallel_num = self.parallel_num();
        if parallel_id >= parallel_num {
            return Err(PlacementError::ParallelIdOutOfRange {
                parallel_id,
                parallel_num,
            });
        }

        let base = len / parallel_num;
        let remainder = len % parallel_num;
        let start = parallel_id * base + parallel_id.min(remainder);
        let extent = base + usize::from(parallel_id < remainder);

        Ok(start..start + extent)
    }

    /// Shape held by unit `parallel_id` of a tensor with shape `logical`
    /// distributed as `sbp`.
    pub fn local_shape(
        &self,
        logical: &Shape,
        sbp: SbpParallel,
        parallel_id: usize,
    ) -> Result<Shape, PlacementError> {
        match sbp {
            SbpParallel::Split(axis) => {
                let len = logical
                    .at(axis)
                    .ok_or(PlacementError::SplitAxisOutOfRange {
                        axis,
                        num_axes: logical.num_axes(),
                    })?;
                let range = self.split_range(len, parallel_id)?;
                let mut shape = logical.clone();
                shape.set(axis, range.len());
                Ok(shape)
            }
            SbpParallel::Broadcast | SbpParallel::PartialSum => {
                if parallel_id >= self.parallel_num() {
                    return Err(PlacementError::ParallelIdOutOfRange {
                        parallel_id,
                        parallel_num: self.parallel_num(),
                    });
                }
                Ok(logical.clone())
            }
        }
    }

    /// Local description held by unit `parallel_id` of a logical tensor.
    pub fn local_tensor_desc(
        &self,
        logical: &TensorDesc,
        sbp: SbpParallel,
        parallel_id: usize,
    ) -> Result<TensorDesc, PlacementError> {
        let shape = self.local_shape(logical.shape(), sbp, parallel_id)?;
        Ok(TensorDesc::new(shape, logical.data_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn cpu4() -> ParallelDesc<usize> {
        ParallelDescBuilder::new(DeviceType::Cpu)
            .with_devices(0..4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parallel_desc_4_units() {
        let desc = cpu4();

        assert_eq!(desc.parallel_num(), 4);
        assert_eq!(desc.device_type(), DeviceType::Cpu);
        assert_eq!(desc.device(3), Some(&3));
        assert_eq!(desc.device(4), None);
    }

    #[test]
    #[should_panic = "Empty"]
    fn test_parallel_desc_should_not_be_empty() {
        let _desc = ParallelDescBuilder::<usize>::new(DeviceType::Gpu)
            .build()
            .unwrap();
    }

    #[test]
    #[should_panic = "DuplicateDevice(\"1\")"]
    fn test_parallel_desc_devices_should_be_unique() {
        let _desc = ParallelDescBuilder::new(DeviceType::Gpu)
            .with_device(0)
            .with_device(1)
            .with_device(1) // already listed
            .build()
            .unwrap();
    }

    #[test]
    fn test_split_is_balanced() {
        let desc = cpu4();
        let ranges: Vec<_> = (0..4).map(|id| desc.split_range(10, id).unwrap()).collect();

        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn test_local_shape_split_and_broadcast() {
        let desc = cpu4();
        let logical = Shape::new([6, 8]);

        assert_eq!(
            desc.local_shape(&logical, SbpParallel::Split(1), 0).unwrap(),
            Shape::new([6, 2])
        );
        assert_eq!(
            desc.local_shape(&logical, SbpParallel::Split(0), 3).unwrap(),
            Shape::new([1, 8])
        );
        assert_eq!(
            desc.local_shape(&logical, SbpParallel::Broadcast, 2).unwrap(),
            logical
        );
        assert_eq!(
            desc.local_shape(&logical, SbpParallel::PartialSum, 1).unwrap(),
            logical
        );
    }

    #[test]
    #[should_panic = "SplitAxisOutOfRange { axis: 2, num_axes: 2 }"]
    fn test_local_shape_split_axis_should_exist() {
        let _shape = cpu4()
            .local_shape(&Shape::new([6, 8]), SbpParallel::Split(2), 0)
            .unwrap();
    }

    #[test]
    #[should_panic = "ParallelIdOutOfRange { parallel_id: 4, parallel_num: 4 }"]
    fn test_local_shape_parallel_id_should_be_in_bound() {
        let _shape = cpu4()
            .local_shape(&Shape::new([6, 8]), SbpParallel::Broadcast, 4)
            .unwrap();
    }
}
