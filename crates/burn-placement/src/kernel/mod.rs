//! Elementwise scalar binary kernels and their dispatch.
//!
//! Kernels are registered under `(operator, device, data type)` in a
//! [`KernelRegistry`] built once at startup. At execution time the registry
//! picks the kernel matching the device and the declared output data type,
//! and runs it on blobs already allocated from their [`RtBlobDesc`](crate::blob::RtBlobDesc).

mod context;
mod func;
mod global;
mod registry;
mod scalar_binary;

pub use context::*;
pub use func::*;
pub use global::*;
pub use registry::*;
pub use scalar_binary::*;

use alloc::string::String;

use crate::DataType;
use crate::blob::LayoutError;

/// Errors raised while selecting or running a kernel.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum KernelError {
    /// No kernel is registered for the key, or none matches the invocation.
    #[error("no kernel registered for {0}")]
    NotFound(KernelKey),
    /// An argument is not bound to a blob.
    #[error("argument {name}_{index} is not bound")]
    MissingArg {
        /// Argument name.
        name: String,
        /// Argument index.
        index: usize,
    },
    /// The operator declares no output blob to select a kernel from.
    #[error("operator '{0}' has no output")]
    NoOutput(&'static str),
    /// A blob id does not belong to the context.
    #[error("unknown blob {0}")]
    UnknownBlob(usize),
    /// The operator has no scalar attribute.
    #[error("missing scalar operand")]
    MissingScalarOperand,
    /// The scalar attribute does not fit the element type.
    #[error("scalar operand {operand:?} is not representable as {data_type}")]
    ScalarOutOfRange {
        /// The attribute.
        operand: ScalarOperand,
        /// Element type of the kernel.
        data_type: DataType,
    },
    /// Input and output hold a different number of elements.
    #[error("input holds {input} element(s) but output holds {output}")]
    ElementCountMismatch {
        /// Input element count.
        input: usize,
        /// Output element count.
        output: usize,
    },
    /// The function has no defined result, e.g. an integer division by zero.
    #[error("{func} is undefined at element {index}")]
    ArithmeticFault {
        /// Name of the binary function.
        func: &'static str,
        /// Index of the offending element.
        index: usize,
    },
    /// A blob could not be accessed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors raised while building or installing a kernel registry.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two registrations claim the same key.
    #[error("kernel {0} is registered more than once")]
    Conflict(KernelKey),
    /// The process-wide registry was already installed.
    #[error("the global kernel registry is already initialized")]
    AlreadyInitialized,
}

/// A type and device specialized numeric routine.
pub trait OpKernel: Send + Sync {
    /// Runs the kernel on the blobs of `ctx`.
    fn compute(&self, ctx: &mut KernelComputeContext) -> Result<(), KernelError>;

    /// Whether the kernel must still run when every output is empty.
    fn always_compute_when_all_outputs_empty(&self) -> bool {
        true
    }
}

/// Runs `kernel` unless every output in `output_bns` is empty and the kernel
/// allows skipping. Returns whether it ran.
pub fn launch(
    kernel: &dyn OpKernel,
    ctx: &mut KernelComputeContext,
    output_bns: &[&str],
) -> Result<bool, KernelError> {
    if !kernel.always_compute_when_all_outputs_empty() && ctx.all_outputs_empty(output_bns)? {
        log::debug!("Skipping kernel on {}: all outputs are empty", ctx.device_type());
        return Ok(false);
    }
    kernel.compute(ctx)?;
    Ok(true)
}
