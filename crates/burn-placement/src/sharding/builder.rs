use alloc::collections::BTreeMap;
use alloc::string::String;

use super::{SbpParallel, SbpSignature, SbpSignatureList};

/// Fluent builder assembling an [`SbpSignature`].
///
/// Binding a name a second time replaces the earlier binding.
///
/// # Example
///
/// ```rust
/// use burn_placement::sharding::{SbpSignatureBuilder, SbpSignatureList};
///
/// let mut list = SbpSignatureList::new();
/// SbpSignatureBuilder::new()
///     .partial_sum("a")
///     .broadcast("b")
///     .partial_sum("out")
///     .build_into(&mut list);
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SbpSignatureBuilder {
    bn_in_op2sbp_parallel: BTreeMap<String, SbpParallel>,
}

impl SbpSignatureBuilder {
    /// Creates a builder with no binding.
    pub fn new() -> Self {
        Self::default()
    }

    fn bind<S: Into<String>>(mut self, bn: S, sbp: SbpParallel) -> Self {
        self.bn_in_op2sbp_parallel.insert(bn.into(), sbp);
        self
    }

    /// Marks `bn` as split along `axis`.
    pub fn split<S: Into<String>>(self, bn: S, axis: usize) -> Self {
        self.bind(bn, SbpParallel::Split(axis))
    }

    /// Marks every name of `bns` as split along `axis`.
    pub fn split_many(self, bns: &[&str], axis: usize) -> Self {
        bns.iter().fold(self, |builder, bn| builder.split(*bn, axis))
    }

    /// Marks `bn` as broadcast.
    pub fn broadcast<S: Into<String>>(self, bn: S) -> Self {
        self.bind(bn, SbpParallel::Broadcast)
    }

    /// Marks every name of `bns` as broadcast.
    pub fn broadcast_many(self, bns: &[&str]) -> Self {
        bns.iter().fold(self, |builder, bn| builder.broadcast(*bn))
    }

    /// Marks `bn` as a partial sum.
    pub fn partial_sum<S: Into<String>>(self, bn: S) -> Self {
        self.bind(bn, SbpParallel::PartialSum)
    }

    /// Marks every name of `bns` as a partial sum.
    pub fn partial_sum_many(self, bns: &[&str]) -> Self {
        bns.iter().fold(self, |builder, bn| builder.partial_sum(*bn))
    }

    /// Builds the signature.
    pub fn build(&self) -> SbpSignature {
        SbpSignature::from_map(self.bn_in_op2sbp_parallel.clone())
    }

    /// Builds the signature and appends it to `list`.
    pub fn build_into(&self, list: &mut SbpSignatureList) {
        list.push(self.build());
    }

    /// Turns this builder into a template expanded once per axis in `0..num_axes`.
    ///
    /// Every split binding of the template is re-targeted to the expanded
    /// axis; other bindings are copied as is.
    pub fn split_per_axis(self, num_axes: usize) -> SplitSignatureListBuilder {
        SplitSignatureListBuilder {
            template: self,
            num_axes,
        }
    }
}

/// Expands a signature template into one signature per split axis.
///
/// Built by [`SbpSignatureBuilder::split_per_axis`].
#[derive(Clone, Debug)]
pub struct SplitSignatureListBuilder {
    template: SbpSignatureBuilder,
    num_axes: usize,
}

impl SplitSignatureListBuilder {
    /// Appends `num_axes` signatures to `list`, in axis order.
    pub fn build_into(&self, list: &mut SbpSignatureList) {
        for axis in 0..self.num_axes {
            let map = self
                .template
                .bn_in_op2sbp_parallel
                .iter()
                .map(|(bn, sbp)| {
                    let sbp = match sbp {
                        SbpParallel::Split(_) => SbpParallel::Split(axis),
                        other => *other,
                    };
                    (bn.clone(), sbp)
                })
                .collect();
            list.push(SbpSignature::from_map(map));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_appends_without_clearing() {
        let mut list = SbpSignatureList::new();
        SbpSignatureBuilder::new()
            .split_many(&["a", "b", "out"], 0)
            .build_into(&mut list);
        SbpSignatureBuilder::new()
            .partial_sum("a")
            .broadcast("b")
            .partial_sum("out")
            .build_into(&mut list);

        assert_eq!(list.len(), 2);
        assert_eq!(list.signatures()[0].get("b"), Some(SbpParallel::Split(0)));
        assert_eq!(list.signatures()[1].get("b"), Some(SbpParallel::Broadcast));
    }

    #[test]
    fn test_builder_rebinding_keeps_last() {
        let sig = SbpSignatureBuilder::new()
            .broadcast("x")
            .partial_sum("x")
            .build();

        assert_eq!(sig.len(), 1);
        assert_eq!(sig.get("x"), Some(SbpParallel::PartialSum));
    }

    #[test]
    fn test_split_per_axis_expands_every_axis() {
        let mut list = SbpSignatureList::new();
        SbpSignatureBuilder::new()
            .split_many(&["in", "out"], 0)
            .broadcast("scale")
            .split_per_axis(3)
            .build_into(&mut list);

        assert_eq!(list.len(), 3);
        for (axis, sig) in list.signatures().iter().enumerate() {
            assert_eq!(sig.get("in"), Some(SbpParallel::Split(axis)));
            assert_eq!(sig.get("out"), Some(SbpParallel::Split(axis)));
            assert_eq!(sig.get("scale"), Some(SbpParallel::Broadcast));
        }
    }

    #[test]
    fn test_split_per_axis_rank_zero_adds_nothing() {
        let mut list = SbpSignatureList::new();
        SbpSignatureBuilder::new()
            .split_many(&["in", "out"], 0)
            .split_per_axis(0)
            .build_into(&mut list);

        assert!(list.is_empty());
    }
}
