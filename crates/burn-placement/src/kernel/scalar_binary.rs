use core::marker::PhantomData;

use super::{BinaryFunc, InOut, KernelComputeContext, KernelError, OpKernel};
use crate::Element;

/// Where the scalar sits relative to the tensor element.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum OperandOrder {
    /// `f(scalar, x)` where the order does not matter (add, multiply).
    Commutative,
    /// `f(scalar, x)`, e.g. scalar divided by each element.
    Left,
    /// `f(x, scalar)`, e.g. each element divided by the scalar.
    Right,
}

/// CPU kernel computing `out[i] = f(scalar, in[i])` or `f(in[i], scalar)`.
///
/// Reads `in` and writes `out` through the blobs bound in the compute
/// context. When both are bound to the same blob the buffer is updated in
/// place, strictly index by index: each element is read right before it is
/// overwritten. Every element is checked before the first write, so a
/// failing invocation leaves `out` untouched.
#[derive(Debug)]
pub struct ScalarBinaryKernel<F, E> {
    order: OperandOrder,
    _func: PhantomData<fn() -> (F, E)>,
}

impl<F, E> ScalarBinaryKernel<F, E> {
    /// Creates a kernel applying the scalar in position `order`.
    pub fn new(order: OperandOrder) -> Self {
        Self {
            order,
            _func: PhantomData,
        }
    }

    /// Position of the scalar.
    pub fn order(&self) -> OperandOrder {
        self.order
    }
}

impl<F: BinaryFunc, E: Element> ScalarBinaryKernel<F, E> {
    fn apply(&self, scalar: E, x: E, index: usize) -> Result<E, KernelError> {
        let result = match self.order {
            OperandOrder::Commutative | OperandOrder::Left => F::invoke(scalar, x),
            OperandOrder::Right => F::invoke(x, scalar),
        };
        result.ok_or(KernelError::ArithmeticFault {
            func: F::NAME,
            index,
        })
    }

    /// Fails on the first element `f` is undefined for, before anything is written.
    fn check_all(&self, scalar: E, input: &[E]) -> Result<(), KernelError> {
        for (i, x) in input.iter().enumerate() {
            self.apply(scalar, *x, i)?;
        }
        Ok(())
    }
}

impl<F: BinaryFunc, E: Element> OpKernel for ScalarBinaryKernel<F, E> {
    fn compute(&self, ctx: &mut KernelComputeContext) -> Result<(), KernelError> {
        let scalar = ctx.scalar_operand()?.cast::<E>()?;

        match ctx.in_out_mut("in", "out")? {
            InOut::Aliased(blob) => {
                let out = blob.body_mut::<E>()?;
                self.check_all(scalar, out)?;
                log::trace!("{} in place on {} element(s)", F::NAME, out.len());
                for (i, x) in out.iter_mut().enumerate() {
                    *x = self.apply(scalar, *x, i)?;
                }
            }
            InOut::Distinct { input, output } => {
                let input = input.body::<E>()?;
                let out = output.body_mut::<E>()?;
                if input.len() != out.len() {
                    return Err(KernelError::ElementCountMismatch {
                        input: input.len(),
                        output: out.len(),
                    });
                }
                self.check_all(scalar, input)?;
                log::trace!("{} on {} element(s)", F::NAME, out.len());
                for (i, (y, x)) in out.iter_mut().zip(input).enumerate() {
                    *y = self.apply(scalar, *x, i)?;
                }
            }
        }

        Ok(())
    }

    fn always_compute_when_all_outputs_empty(&self) -> bool {
        false
    }
}
