use super::{LogicalBlobDesc4Ibn, SbpError, SbpOperator};
use crate::Shape;
use crate::sharding::{SbpParallel, SbpSignatureBuilder, SbpSignatureList};

const INPUT_BNS: &[&str] = &["a", "b"];
const OUTPUT_BNS: &[&str] = &["out"];

/// Distribution of an operand on output axis `axis` of a broadcast.
///
/// Operands are right aligned; an operand without the axis, or with extent 1
/// on it, is replicated.
fn operand_sbp(shape: &Shape, num_axes: usize, axis: usize) -> SbpParallel {
    let offset = num_axes - shape.num_axes();
    match axis.checked_sub(offset) {
        Some(own_axis) if shape.at(own_axis) != Some(1) => SbpParallel::Split(own_axis),
        _ => SbpParallel::Broadcast,
    }
}

fn check_broadcast_compatible(a: &Shape, b: &Shape) -> Result<(), SbpError> {
    let compatible = a
        .dims()
        .iter()
        .rev()
        .zip(b.dims().iter().rev())
        .all(|(&da, &db)| da == db || da == 1 || db == 1);
    if compatible {
        Ok(())
    } else {
        Err(SbpError::IncompatibleShapes {
            a: a.clone(),
            b: b.clone(),
        })
    }
}

/// Signatures shared by every broadcast binary operator: the output is split
/// along each axis on which at least one operand is not replicated.
fn get_broadcast_split_signatures(
    logical_blob_desc4ibn: LogicalBlobDesc4Ibn<'_>,
    list: &mut SbpSignatureList,
) -> Result<(), SbpError> {
    let a = logical_blob_desc4ibn("a")?;
    let b = logical_blob_desc4ibn("b")?;
    let (a, b) = (a.shape(), b.shape());
    check_broadcast_compatible(a, b)?;

    let num_axes = a.num_axes().max(b.num_axes());
    for axis in 0..num_axes {
        let a_sbp = operand_sbp(a, num_axes, axis);
        let b_sbp = operand_sbp(b, num_axes, axis);
        let builder = match (a_sbp, b_sbp) {
            (SbpParallel::Split(a_axis), SbpParallel::Split(b_axis)) => {
                SbpSignatureBuilder::new().split("a", a_axis).split("b", b_axis)
            }
            (SbpParallel::Split(a_axis), _) => {
                SbpSignatureBuilder::new().split("a", a_axis).broadcast("b")
            }
            (_, SbpParallel::Split(b_axis)) => {
                SbpSignatureBuilder::new().broadcast("a").split("b", b_axis)
            }
            // Both operands replicated: the output is not split on this axis.
            _ => continue,
        };
        builder.split("out", axis).build_into(list);
    }

    Ok(())
}

/// Elementwise `a + b` with broadcasting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastAddOp;

impl SbpOperator for BroadcastAddOp {
    fn op_type_name(&self) -> &'static str {
        "broadcast_add"
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
        get_broadcast_split_signatures(logical_blob_desc4ibn, list)?;
        SbpSignatureBuilder::new()
            .partial_sum_many(&["a", "b", "out"])
            .build_into(list);
        Ok(())
    }
}

/// Elementwise `a - b` with broadcasting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastSubOp;

impl SbpOperator for BroadcastSubOp {
    fn op_type_name(&self) -> &'static str {
        "broadcast_sub"
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
        get_broadcast_split_signatures(logical_blob_desc4ibn, list)?;
        SbpSignatureBuilder::new()
            .partial_sum_many(&["a", "b", "out"])
            .build_into(list);
        Ok(())
    }
}

/// Elementwise `a * b` with broadcasting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastMulOp;

impl SbpOperator for BroadcastMulOp {
    fn op_type_name(&self) -> &'static str {
        "broadcast_mul"
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
        get_broadcast_split_signatures(logical_blob_desc4ibn, list)?;
        SbpSignatureBuilder::new()
            .partial_sum("a")
            .broadcast("b")
            .partial_sum("out")
            .build_into(list);
        SbpSignatureBuilder::new()
            .broadcast("a")
            .partial_sum("b")
            .partial_sum("out")
            .build_into(list);
        Ok(())
    }
}

/// Elementwise `a / b` with broadcasting.
///
/// Only the dividend may hold partial sums: dividing each partial
/// contribution by a replicated divisor and summing equals dividing the sum.
/// The divisor never gets a partial sum signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastDivOp;

impl SbpOperator for BroadcastDivOp {
    fn op_type_name(&self) -> &'static str {
        "broadcast_div"
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
        get_broadcast_split_signatures(logical_blob_desc4ibn, list)?;
        SbpSignatureBuilder::new()
            .partial_sum("a")
            .broadcast("b")
            .partial_sum("out")
            .build_into(list);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_utils::lookup_from;
    use crate::{DataType, TensorDesc};
    use alloc::string::ToString;
    use alloc::vec;
    use pretty_assertions::assert_eq;

    fn signatures_of(op: &dyn SbpOperator, a: &[usize], b: &[usize]) -> SbpSignatureList {
        let lookup = lookup_from(vec![
            ("a", TensorDesc::new(a.to_vec(), DataType::Float32)),
            ("b", TensorDesc::new(b.to_vec(), DataType::Float32)),
        ]);
        let mut list = SbpSignatureList::new();
        op.get_sbp_signatures(&lookup, &mut list).unwrap();
        list
    }

    #[test]
    fn test_broadcast_div_partial_sum_only_on_dividend() {
        let list = signatures_of(&BroadcastDivOp, &[4, 3], &[4, 3]);
        let last = list.signatures().last().unwrap();

        assert_eq!(last.get("a"), Some(SbpParallel::PartialSum));
        assert_eq!(last.get("b"), Some(SbpParallel::Broadcast));
        assert_eq!(last.get("out"), Some(SbpParallel::PartialSum));
        assert!(!list.any_binds("b", SbpParallel::PartialSum));
        assert_eq!(
            list.signatures()
                .iter()
                .filter(|sig| sig.get("a") == Some(SbpParallel::PartialSum))
                .count(),
            1
        );
    }

    #[test]
    fn test_broadcast_split_signatures_same_shape() {
        let list = signatures_of(&BroadcastDivOp, &[4, 3], &[4, 3]);
        let rendered: vec::Vec<_> = list.signatures().iter().map(|s| s.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "{a: S(0), b: S(0), out: S(0)}",
                "{a: S(1), b: S(1), out: S(1)}",
                "{a: P, b: B, out: P}",
            ]
        );
    }

    #[test]
    fn test_broadcast_split_signatures_right_aligned() {
        // b broadcasts over the leading axis and its unit axis.
        let list = signatures_of(&BroadcastAddOp, &[2, 4, 3], &[1, 3]);
        let rendered: vec::Vec<_> = list.signatures().iter().map(|s| s.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "{a: S(0), b: B, out: S(0)}",
                "{a: S(1), b: B, out: S(1)}",
                "{a: S(2), b: S(1), out: S(2)}",
                "{a: P, b: P, out: P}",
            ]
        );
    }

    #[test]
    fn test_broadcast_mul_partial_sum_on_either_side() {
        let list = signatures_of(&BroadcastMulOp, &[5], &[5]);

        assert_eq!(list.len(), 3);
        assert!(list.any_binds("a", SbpParallel::PartialSum));
        assert!(list.any_binds("b", SbpParallel::PartialSum));
        assert!(
            list.signatures()
                .iter()
                .all(|sig| !(sig.get("a") == Some(SbpParallel::PartialSum)
                    && sig.get("b") == Some(SbpParallel::PartialSum)))
        );
    }

    #[test]
    fn test_broadcast_signatures_are_idempotent() {
        let first = signatures_of(&BroadcastSubOp, &[8, 1, 6], &[7, 6]);
        let second = signatures_of(&BroadcastSubOp, &[8, 1, 6], &[7, 6]);

        assert_eq!(first, second);
    }

    #[test]
    fn test_broadcast_lookup_failure_is_propagated() {
        let lookup = lookup_from(vec![("a", TensorDesc::new([4, 3], DataType::Float32))]);
        let mut list = SbpSignatureList::new();

        let result = BroadcastDivOp.get_sbp_signatures(&lookup, &mut list);

        assert_eq!(
            result,
            Err(SbpError::LogicalBlobDescNotFound("b".to_string()))
        );
        assert!(list.is_empty());
    }

    #[test]
    fn test_broadcast_incompatible_shapes() {
        let lookup = lookup_from(vec![
            ("a", TensorDesc::new([4, 3], DataType::Float32)),
            ("b", TensorDesc::new([4, 2], DataType::Float32)),
        ]);
        let mut list = SbpSignatureList::new();

        let err = BroadcastAddOp.get_sbp_signatures(&lookup, &mut list).unwrap_err();

        assert_eq!(err.to_string(), "shapes [4, 3] and [4, 2] are not broadcast compatible");
    }
}
