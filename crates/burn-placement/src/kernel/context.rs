use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;
use num_traits::float::FloatCore;

use super::KernelError;
use crate::blob::Blob;
use crate::{DataType, DeviceType, Element};

/// Scalar attribute of a scalar binary operator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarOperand {
    /// Integer operand.
    Int(i64),
    /// Floating point operand.
    Float(f64),
}

impl ScalarOperand {
    /// Converts the operand to the element type `E`.
    ///
    /// Fails when the value is not representable, e.g. `300` as an `i8` or
    /// `0.5` as an `i32`.
    pub fn cast<E: Element>(&self) -> Result<E, KernelError> {
        let value = match *self {
            ScalarOperand::Int(value) => <E as num_traits::NumCast>::from(value),
            ScalarOperand::Float(value)
                if !E::DATA_TYPE.is_float() && FloatCore::fract(value) != 0.0 =>
            {
                None
            }
            ScalarOperand::Float(value) => <E as num_traits::NumCast>::from(value),
        };
        value.ok_or(KernelError::ScalarOutOfRange {
            operand: *self,
            data_type: E::DATA_TYPE,
        })
    }
}

/// Identity of a blob inside a [`KernelComputeContext`].
///
/// Two arguments alias the same buffer exactly when they are bound to the same id.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BlobId(usize);

/// What a kernel registration is matched against.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct KernelRegContext {
    /// Device the kernel runs on.
    pub device_type: DeviceType,
    /// Declared data type of the output.
    pub data_type: DataType,
}

impl KernelRegContext {
    /// Creates a new [`KernelRegContext`].
    pub fn new(device_type: DeviceType, data_type: DataType) -> Self {
        Self {
            device_type,
            data_type,
        }
    }
}

/// Input and output buffers of a single-input kernel.
#[derive(Debug)]
pub enum InOut<'a> {
    /// Input and output are the same buffer.
    Aliased(&'a mut Blob),
    /// Input and output are different buffers.
    Distinct {
        /// Input buffer.
        input: &'a Blob,
        /// Output buffer.
        output: &'a mut Blob,
    },
}

/// Everything a kernel sees during one invocation: the device, the operator
/// attributes and the already allocated blobs bound to argument names.
///
/// The context exclusively owns its blobs for the duration of the call.
#[derive(Debug)]
pub struct KernelComputeContext {
    device_type: DeviceType,
    scalar_operand: Option<ScalarOperand>,
    blobs: Vec<Blob>,
    bindings: HashMap<(String, usize), BlobId>,
}

impl KernelComputeContext {
    /// Creates an empty context for `device_type`.
    pub fn new(device_type: DeviceType) -> Self {
        Self {
            device_type,
            scalar_operand: None,
            blobs: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// Sets the scalar attribute.
    pub fn with_scalar_operand(mut self, operand: ScalarOperand) -> Self {
        self.scalar_operand = Some(operand);
        self
    }

    /// Device the kernel runs on.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// The scalar attribute.
    pub fn scalar_operand(&self) -> Result<ScalarOperand, KernelError> {
        self.scalar_operand.ok_or(KernelError::MissingScalarOperand)
    }

    /// Hands `blob` over to the context.
    pub fn add_blob(&mut self, blob: Blob) -> BlobId {
        self.blobs.push(blob);
        BlobId(self.blobs.len() - 1)
    }

    /// Binds the `index`-th argument named `name` to the blob `id`.
    pub fn bind(&mut self, name: &str, index: usize, id: BlobId) -> Result<(), KernelError> {
        if id.0 >= self.blobs.len() {
            return Err(KernelError::UnknownBlob(id.0));
        }
        self.bindings.insert((name.to_string(), index), id);
        Ok(())
    }

    /// Blob bound to the `index`-th argument named `name`.
    pub fn blob_id(&self, name: &str, index: usize) -> Result<BlobId, KernelError> {
        self.bindings
            .get(&(name.to_string(), index))
            .copied()
            .ok_or_else(|| KernelError::MissingArg {
                name: name.to_string(),
                index,
            })
    }

    /// Blob `id`.
    pub fn blob(&self, id: BlobId) -> Result<&Blob, KernelError> {
        self.blobs.get(id.0).ok_or(KernelError::UnknownBlob(id.0))
    }

    /// Mutable blob `id`.
    pub fn blob_mut(&mut self, id: BlobId) -> Result<&mut Blob, KernelError> {
        self.blobs.get_mut(id.0).ok_or(KernelError::UnknownBlob(id.0))
    }

    /// Blob bound to the `index`-th argument named `name`.
    pub fn blob4arg(&self, name: &str, index: usize) -> Result<&Blob, KernelError> {
        self.blob(self.blob_id(name, index)?)
    }

    /// Registration context of a kernel whose output is the argument `out_name`.
    pub fn reg_context(&self, out_name: &str) -> Result<KernelRegContext, KernelError> {
        let out = self.blob4arg(out_name, 0)?;
        Ok(KernelRegContext::new(self.device_type, out.desc().data_type()))
    }

    /// Whether every listed output has an empty body.
    pub fn all_outputs_empty(&self, output_bns: &[&str]) -> Result<bool, KernelError> {
        for bn in output_bns {
            if !self.blob4arg(bn, 0)?.is_body_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Borrows the blobs of `input` and `output` together, detecting aliasing
    /// by blob identity.
    pub fn in_out_mut(&mut self, input: &str, output: &str) -> Result<InOut<'_>, KernelError> {
        let BlobId(in_idx) = self.blob_id(input, 0)?;
        let BlobId(out_idx) = self.blob_id(output, 0)?;

        // Ids are validated by `bind`, so both indices are in bound.
        let in_out = if in_idx == out_idx {
            InOut::Aliased(&mut self.blobs[out_idx])
        } else if in_idx < out_idx {
            let (head, tail) = self.blobs.split_at_mut(out_idx);
            InOut::Distinct {
                input: &head[in_idx],
                output: &mut tail[0],
            }
        } else {
            let (head, tail) = self.blobs.split_at_mut(in_idx);
            InOut::Distinct {
                input: &tail[0],
                output: &mut head[out_idx],
            }
        };
        Ok(in_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TensorDesc;
    use crate::blob::{BlobDesc, RtBlobDesc};
    use alloc::sync::Arc;

    fn blob(values: &[f32]) -> Blob {
        let desc = BlobDesc::new(TensorDesc::new([values.len()], DataType::Float32));
        Blob::from_elements(Arc::new(RtBlobDesc::new(&desc).unwrap()), values).unwrap()
    }

    #[test]
    fn test_aliasing_follows_blob_identity() {
        let mut ctx = KernelComputeContext::new(DeviceType::Cpu);
        let x = ctx.add_blob(blob(&[1.0, 2.0]));
        let y = ctx.add_blob(blob(&[1.0, 2.0]));
        ctx.bind("in", 0, x).unwrap();
        ctx.bind("out", 0, x).unwrap();

        assert!(matches!(ctx.in_out_mut("in", "out").unwrap(), InOut::Aliased(_)));

        // Equal contents in another buffer is not aliasing.
        ctx.bind("out", 0, y).unwrap();
        assert!(matches!(
            ctx.in_out_mut("in", "out").unwrap(),
            InOut::Distinct { .. }
        ));

        // Either binding order splits the arena.
        ctx.bind("in", 0, y).unwrap();
        ctx.bind("out", 0, x).unwrap();
        match ctx.in_out_mut("in", "out").unwrap() {
            InOut::Distinct { input, output } => {
                assert_eq!(input.body::<f32>().unwrap(), &[1.0, 2.0]);
                output.body_mut::<f32>().unwrap()[0] = 5.0;
            }
            InOut::Aliased(_) => panic!("expected distinct buffers"),
        }
        assert_eq!(ctx.blob(x).unwrap().body::<f32>().unwrap(), &[5.0, 2.0]);
    }

    #[test]
    #[should_panic = "MissingArg { name: \"out\", index: 0 }"]
    fn test_unbound_argument() {
        let mut ctx = KernelComputeContext::new(DeviceType::Cpu);
        let x = ctx.add_blob(blob(&[1.0]));
        ctx.bind("in", 0, x).unwrap();
        let _ = ctx.in_out_mut("in", "out").unwrap();
    }

    #[test]
    fn test_scalar_operand_cast() {
        assert_eq!(ScalarOperand::Int(10).cast::<f32>().unwrap(), 10.0);
        assert_eq!(ScalarOperand::Float(2.5).cast::<f64>().unwrap(), 2.5);
        assert_eq!(
            ScalarOperand::Int(300).cast::<i8>(),
            Err(KernelError::ScalarOutOfRange {
                operand: ScalarOperand::Int(300),
                data_type: DataType::Int8,
            })
        );
    }

    #[test]
    fn test_fractional_scalar_is_not_truncated_for_integers() {
        assert_eq!(
            ScalarOperand::Float(0.5).cast::<i32>(),
            Err(KernelError::ScalarOutOfRange {
                operand: ScalarOperand::Float(0.5),
                data_type: DataType::Int32,
            })
        );
        assert_eq!(ScalarOperand::Float(-3.0).cast::<i64>().unwrap(), -3);
        assert!(ScalarOperand::Float(f64::NAN).cast::<u8>().is_err());
        assert!(ScalarOperand::Float(1e20).cast::<i32>().is_err());
    }

    #[test]
    fn test_reg_context_reads_output_type() {
        let mut ctx = KernelComputeContext::new(DeviceType::Gpu);
        let x = ctx.add_blob(blob(&[1.0]));
        ctx.bind("out", 0, x).unwrap();

        assert_eq!(
            ctx.reg_context("out").unwrap(),
            KernelRegContext::new(DeviceType::Gpu, DataType::Float32)
        );
    }
}
