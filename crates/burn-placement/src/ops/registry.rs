use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;

use super::{
    BroadcastAddOp, BroadcastDivOp, BroadcastMulOp, BroadcastSubOp, LeftScalarDivOp,
    LogicalBlobDesc4Ibn, RightScalarDivOp, SbpError, SbpOperator, ScalarAddOp, ScalarMulOp,
};
use crate::sharding::SbpSignatureList;

/// Creates a fresh operator instance.
pub type OpCreator = fn() -> Box<dyn SbpOperator>;

/// Name-keyed factory map of operator kinds.
#[derive(Clone, Debug, Default)]
pub struct OpRegistry {
    creators: HashMap<String, OpCreator>,
}

impl OpRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every operator kind of this crate.
    pub fn builtin() -> Self {
        let creators: [(&str, OpCreator); 8] = [
            ("broadcast_add", || Box::new(BroadcastAddOp)),
            ("broadcast_sub", || Box::new(BroadcastSubOp)),
            ("broadcast_mul", || Box::new(BroadcastMulOp)),
            ("broadcast_div", || Box::new(BroadcastDivOp)),
            ("scalar_add", || Box::new(ScalarAddOp)),
            ("scalar_mul", || Box::new(ScalarMulOp)),
            ("left_scalar_div", || Box::new(LeftScalarDivOp)),
            ("right_scalar_div", || Box::new(RightScalarDivOp)),
        ];

        Self {
            creators: creators
                .into_iter()
                .map(|(name, creator)| (name.to_string(), creator))
                .collect(),
        }
    }

    /// Registers `creator` under `op_type_name`.
    pub fn register<S: Into<String>>(
        &mut self,
        op_type_name: S,
        creator: OpCreator,
    ) -> Result<(), SbpError> {
        let op_type_name = op_type_name.into();
        if self.creators.contains_key(&op_type_name) {
            return Err(SbpError::DuplicateOperator(op_type_name));
        }
        log::debug!("Registering operator '{op_type_name}'");
        self.creators.insert(op_type_name, creator);
        Ok(())
    }

    /// Creates the operator registered under `op_type_name`.
    pub fn create(&self, op_type_name: &str) -> Result<Box<dyn SbpOperator>, SbpError> {
        self.creators
            .get(op_type_name)
            .map(|creator| creator())
            .ok_or_else(|| SbpError::UnknownOperator(op_type_name.to_string()))
    }

    /// Registered operator names, sorted.
    pub fn op_type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.creators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Legal signatures of the operator registered under `op_type_name`.
    pub fn get_sbp_signatures(
        &self,
        op_type_name: &str,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
    ) -> Result<SbpSignatureList, SbpError> {
        let op = self.create(op_type_name)?;
        let mut list = SbpSignatureList::new();
        op.get_sbp_signatures(logical_blob_desc4ibn, &mut list)?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_utils::lookup_from;
    use crate::sharding::SbpParallel;
    use crate::{DataType, TensorDesc};
    use alloc::vec;

    #[test]
    fn test_builtin_names_match_operators() {
        let registry = OpRegistry::builtin();

        assert_eq!(registry.op_type_names().len(), 8);
        for name in registry.op_type_names() {
            assert_eq!(registry.create(name).unwrap().op_type_name(), name);
        }
    }

    #[test]
    fn test_registry_signatures_by_name() {
        let registry = OpRegistry::builtin();
        let lookup = lookup_from(vec![
            ("a", TensorDesc::new([6], DataType::Float64)),
            ("b", TensorDesc::new([1], DataType::Float64)),
        ]);

        let list = registry.get_sbp_signatures("broadcast_div", &lookup).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.signatures()[0].get("b"), Some(SbpParallel::Broadcast));
        assert_eq!(list.signatures()[1].get("a"), Some(SbpParallel::PartialSum));
    }

    #[test]
    #[should_panic = "UnknownOperator(\"broadcast_pow\")"]
    fn test_registry_unknown_operator() {
        let _op = OpRegistry::builtin().create("broadcast_pow").unwrap();
    }

    #[test]
    #[should_panic = "DuplicateOperator(\"scalar_add\")"]
    fn test_registry_duplicate_operator() {
        let mut registry = OpRegistry::builtin();
        registry
            .register("scalar_add", || Box::new(ScalarAddOp))
            .unwrap();
    }
}
