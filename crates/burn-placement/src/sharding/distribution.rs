use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Describes how one tensor argument is distributed over the execution units
/// of a parallel description.
///
/// A descriptor only carries meaning relative to a fixed number of units, which
/// is not encoded here (see [`ParallelDesc`](super::ParallelDesc)).
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum SbpParallel {
    /// The tensor is partitioned along the given axis; each unit holds a contiguous slice.
    Split(usize),
    /// Every unit holds an identical full copy.
    Broadcast,
    /// Every unit holds a partial contribution; the logical value is their elementwise sum.
    PartialSum,
}

impl SbpParallel {
    /// Whether the tensor is split along some axis.
    pub fn is_split(&self) -> bool {
        matches!(self, SbpParallel::Split(_))
    }

    /// Whether the tensor is replicated on every unit.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, SbpParallel::Broadcast)
    }

    /// Whether the tensor holds partial sums.
    pub fn is_partial_sum(&self) -> bool {
        matches!(self, SbpParallel::PartialSum)
    }

    /// The split axis, if this is a split.
    pub fn split_axis(&self) -> Option<usize> {
        match self {
            SbpParallel::Split(axis) => Some(*axis),
            _ => None,
        }
    }
}

impl fmt::Display for SbpParallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SbpParallel::Split(axis) => write!(f, "S({axis})"),
            SbpParallel::Broadcast => f.write_str("B"),
            SbpParallel::PartialSum => f.write_str("P"),
        }
    }
}

/// One legal combination of distributions for the arguments of an operator.
///
/// Maps each input/output blob name of the operator to exactly one
/// [`SbpParallel`]. Entries are kept ordered by name so that signatures compare
/// and print deterministically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SbpSignature {
    bn_in_op2sbp_parallel: BTreeMap<String, SbpParallel>,
}

impl SbpSignature {
    pub(crate) fn from_map(bn_in_op2sbp_parallel: BTreeMap<String, SbpParallel>) -> Self {
        Self {
            bn_in_op2sbp_parallel,
        }
    }

    /// Distribution of the blob named `bn`, if the signature binds it.
    pub fn get(&self, bn: &str) -> Option<SbpParallel> {
        self.bn_in_op2sbp_parallel.get(bn).copied()
    }

    /// Iterates over `(blob name, distribution)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SbpParallel)> {
        self.bn_in_op2sbp_parallel
            .iter()
            .map(|(bn, sbp)| (bn.as_str(), *sbp))
    }

    /// Number of bound blob names.
    pub fn len(&self) -> usize {
        self.bn_in_op2sbp_parallel.len()
    }

    /// Whether no blob name is bound.
    pub fn is_empty(&self) -> bool {
        self.bn_in_op2sbp_parallel.is_empty()
    }
}

impl fmt::Display for SbpSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (bn, sbp)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{bn}: {sbp}")?;
        }
        f.write_str("}")
    }
}

/// Alternative legal signatures of one operator.
///
/// The list is only ever appended to, so several stages (a shared base stage
/// and an operator specific one) can contribute to it in turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SbpSignatureList {
    signatures: Vec<SbpSignature>,
}

impl SbpSignatureList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a signature.
    pub fn push(&mut self, signature: SbpSignature) {
        self.signatures.push(signature);
    }

    /// The signatures, in insertion order.
    pub fn signatures(&self) -> &[SbpSignature] {
        &self.signatures
    }

    /// Number of signatures.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the list holds no signature.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Whether any signature assigns `sbp` to the blob named `bn`.
    pub fn any_binds(&self, bn: &str, sbp: SbpParallel) -> bool {
        self.signatures.iter().any(|sig| sig.get(bn) == Some(sbp))
    }
}

impl<'a> IntoIterator for &'a SbpSignatureList {
    type Item = &'a SbpSignature;
    type IntoIter = core::slice::Iter<'a, SbpSignature>;

    fn into_iter(self) -> Self::IntoIter {
        self.signatures.iter()
    }
}
