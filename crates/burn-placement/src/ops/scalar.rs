use super::{LogicalBlobDesc4Ibn, SbpError, SbpOperator};
use crate::sharding::{SbpSignatureBuilder, SbpSignatureList};

const INPUT_BNS: &[&str] = &["in"];
const OUTPUT_BNS: &[&str] = &["out"];

/// Splitting input and output together along any axis is legal for every
/// elementwise operator with a scalar operand.
fn get_scalar_split_signatures(
    logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
    list: &mut SbpSignatureList,
) -> Result<(), SbpError> {
    let num_axes = logical_blob_desc4ibn("in")?.shape().num_axes();
    SbpSignatureBuilder::new()
        .split_many(&["in", "out"], 0)
        .split_per_axis(num_axes)
        .build_into(list);
    Ok(())
}

fn get_partial_sum_signature(list: &mut SbpSignatureList) {
    SbpSignatureBuilder::new()
        .partial_sum_many(&["in", "out"])
        .build_into(list);
}

/// `out = in + scalar`.
///
/// Never partial sum: each unit would add the scalar once.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarAddOp;

impl SbpOperator for ScalarAddOp {
    fn op_type_name(&self) -> &'static str {
        "scalar_add"
    }

    fn input_bns(&self) -> &'static [&'static str] {
        INPUT_BNS
    }

    fn output_bns(&self) -> &'static [&'static str] {
        OUTPUT_BNS
    }

    fn get_sbp_signatures(
        &self,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
        list: &mut SbpSignatureList,
    ) -> Result<(), SbpError> {
        get_scalar_split_signatures(logical_blob_desc4ibn, list)
    }
}

/// `out = in * scalar`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarMulOp;

impl SbpOperator for ScalarMulOp {
    fn op_type_name(&self) -> &'static str {
        "scalar_mul"
    }

    fn input_bns(&self) -> &'static [&'static str] {
        INPUT_BNS
    }

    fn output_bns(&self) -> &'static [&'static str] {
        OUTPUT_BNS
    }

    fn get_sbp_signatures(
        &self,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
        list: &mut SbpSignatureList,
    ) -> Result<(), SbpError> {
        get_scalar_split_signatures(logical_blob_desc4ibn, list)?;
        get_partial_sum_signature(list);
        Ok(())
    }
}

/// `out = scalar / in`.
///
/// Never partial sum: division does not distribute over sums of the divisor.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeftScalarDivOp;

impl SbpOperator for LeftScalarDivOp {
    fn op_type_name(&self) -> &'static str {
        "left_scalar_div"
    }

    fn input_bns(&self) -> &'static [&'static str] {
        INPUT_BNS
    }

    fn output_bns(&self) -> &'static [&'static str] {
        OUTPUT_BNS
    }

    fn get_sbp_signatures(
        &self,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
        list: &mut SbpSignatureList,
    ) -> Result<(), SbpError> {
        get_scalar_split_signatures(logical_blob_desc4ibn, list)
    }
}

/// `out = in / scalar`.
///
/// Partial sums only for floating point inputs: integer division truncates,
/// so `1 / 2 + 1 / 2 != 2 / 2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RightScalarDivOp;

impl SbpOperator for RightScalarDivOp {
    fn op_type_name(&self) -> &'static str {
        "right_scalar_div"
    }

    fn input_bns(&self) -> &'static [&'static str] {
        INPUT_BNS
    }

    fn output_bns(&self) -> &'static [&'static str] {
        OUTPUT_BNS
    }

    fn get_sbp_signatures(
        &self,
        logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
        list: &mut SbpSignatureList,
    ) -> Result<(), SbpError> {
        get_scalar_split_signatures(logical_blob_desc4ibn, list)?;
        if logical_blob_desc4ibn("in")?.data_type().is_float() {
            get_partial_sum_signature(list);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_utils::lookup_from;
    use crate::sharding::SbpParallel;
    use crate::{DataType, TensorDesc};
    use alloc::vec;

    fn signatures_of(op: &dyn SbpOperator, shape: [usize; 3]) -> SbpSignatureList {
        signatures_with_type(op, shape, DataType::Float32)
    }

    fn signatures_with_type(
        op: &dyn SbpOperator,
        shape: [usize; 3],
        data_type: DataType,
    ) -> SbpSignatureList {
        let lookup = lookup_from(vec![("in", TensorDesc::new(shape, data_type))]);
        let mut list = SbpSignatureList::new();
        op.get_sbp_signatures(&lookup, &mut list).unwrap();
        list
    }

    #[test]
    fn test_scalar_ops_split_every_axis() {
        let list = signatures_of(&ScalarAddOp, [2, 3, 4]);

        assert_eq!(list.len(), 3);
        for (axis, sig) in list.signatures().iter().enumerate() {
            assert_eq!(sig.get("in"), Some(SbpParallel::Split(axis)));
            assert_eq!(sig.get("out"), Some(SbpParallel::Split(axis)));
        }
    }

    #[test]
    fn test_scalar_partial_sum_only_where_distributive() {
        let add = signatures_of(&ScalarAddOp, [2, 3, 4]);
        let mul = signatures_of(&ScalarMulOp, [2, 3, 4]);
        let left_div = signatures_of(&LeftScalarDivOp, [2, 3, 4]);
        let right_div = signatures_of(&RightScalarDivOp, [2, 3, 4]);

        assert!(!add.any_binds("in", SbpParallel::PartialSum));
        assert!(mul.any_binds("in", SbpParallel::PartialSum));
        assert!(!left_div.any_binds("in", SbpParallel::PartialSum));
        assert!(right_div.any_binds("in", SbpParallel::PartialSum));
        assert_eq!(right_div.len(), 4);
    }

    #[test]
    fn test_integer_right_div_has_no_partial_sum() {
        let int_div = signatures_with_type(&RightScalarDivOp, [2, 3, 4], DataType::Int32);
        let int_mul = signatures_with_type(&ScalarMulOp, [2, 3, 4], DataType::Int32);

        assert!(!int_div.any_binds("in", SbpParallel::PartialSum));
        assert!(!int_div.any_binds("out", SbpParallel::PartialSum));
        assert_eq!(int_div.len(), 3);
        assert!(int_mul.any_binds("in", SbpParallel::PartialSum));
    }

    #[test]
    #[should_panic = "LogicalBlobDescNotFound(\"in\")"]
    fn test_scalar_lookup_failure_is_propagated() {
        let lookup = lookup_from(vec![]);
        let mut list = SbpSignatureList::new();
        ScalarMulOp.get_sbp_signatures(&lookup, &mut list).unwrap();
    }
}
