use crate::Element;

/// A binary elementwise function.
pub trait BinaryFunc: Send + Sync + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Applies the function, or returns `None` when the result is undefined.
    fn invoke<E: Element>(lhs: E, rhs: E) -> Option<E>;
}

/// `lhs + rhs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Add;

impl BinaryFunc for Add {
    const NAME: &'static str = "add";

    fn invoke<E: Element>(lhs: E, rhs: E) -> Option<E> {
        Some(Element::add(lhs, rhs))
    }
}

/// `lhs * rhs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mul;

impl BinaryFunc for Mul {
    const NAME: &'static str = "mul";

    fn invoke<E: Element>(lhs: E, rhs: E) -> Option<E> {
        Some(Element::mul(lhs, rhs))
    }
}

/// `lhs / rhs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Div;

impl BinaryFunc for Div {
    const NAME: &'static str = "div";

    fn invoke<E: Element>(lhs: E, rhs: E) -> Option<E> {
        Element::checked_div(lhs, rhs)
    }
}
