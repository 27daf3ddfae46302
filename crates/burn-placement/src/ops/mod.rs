//! Operators and the distributed signatures they declare.
//!
//! Every operator is a separate type implementing [`SbpOperator`]. The graph
//! layer asks an operator for its legal signatures once, passing a lookup that
//! resolves the logical description of each input blob, and picks among them
//! to decide how inputs are sharded.

mod broadcast;
mod registry;
mod scalar;

pub use broadcast::*;
pub use registry::*;
pub use scalar::*;

use alloc::string::String;

use crate::sharding::SbpSignatureList;
use crate::{Shape, TensorDesc};

/// Resolves the logical description of an input blob name.
pub type LogicalBlobDesc4Ibn<'a> = &'a dyn Fn(&str) -> Result<TensorDesc, SbpError>;

/// Errors raised while declaring or looking up operator signatures.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SbpError {
    /// No logical description is available for the blob name.
    #[error("no logical blob description for '{0}'")]
    LogicalBlobDescNotFound(String),
    /// Two operand shapes cannot be broadcast against each other.
    #[error("shapes {a} and {b} are not broadcast compatible")]
    IncompatibleShapes {
        /// Shape of the first operand.
        a: Shape,
        /// Shape of the second operand.
        b: Shape,
    },
    /// No operator is registered under the name.
    #[error("operator '{0}' is not registered")]
    UnknownOperator(String),
    /// An operator name was registered twice.
    #[error("operator '{0}' is already registered")]
    DuplicateOperator(String),
}

/// Capability shared by every operator kind: declaring its legal signatures.
pub trait SbpOperator: Send + Sync {
    /// Name the operator is registered under.
    fn op_type_name(&self) -> &'static str;

    /// Input blob names.
    fn input_bns(&self) -> &'static [&'static str];

    /// Output blob names.
    fn output_bns(&self) -> &'static [&'static str];

    /// Appends the legal signatures of this operator to `list`.
    ///
    /// Prior entries of `list` are left untouched. A failing lookup is
    /// propagated to the caller.
    fn get_sbp_signatures(
        &self,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
        list: &mut SbpSignatureList,
    ) -> Result<(), SbpError>;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    /// A lookup backed by a fixed table.
    pub fn lookup_from(
        table: Vec<(&'static str, TensorDesc)>,
    ) -> impl Fn(&str) -> Result<TensorDesc, SbpError> {
        move |bn| {
            table
                .iter()
                .find(|(name, _)| *name == bn)
                .map(|(_, desc)| desc.clone())
                .ok_or_else(|| SbpError::LogicalBlobDescNotFound(bn.to_string()))
        }
    }
}
