use core::fmt::Debug;

use bytemuck::Pod;
use half::{bf16, f16};
use num_traits::NumCast;

use crate::DataType;

/// Element types a blob body can hold and kernels can compute on.
///
/// Integer arithmetic wraps on overflow; division reports failure instead of
/// panicking, so a kernel can surface it as an error.
pub trait Element: Pod + NumCast + PartialEq + Debug + Send + Sync + 'static {
    /// Data type tag of this element type.
    const DATA_TYPE: DataType;

    /// `self + rhs`.
    fn add(self, rhs: Self) -> Self;

    /// `self * rhs`.
    fn mul(self, rhs: Self) -> Self;

    /// `self / rhs`, or `None` when the quotient is undefined for this type.
    fn checked_div(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_int_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;

                fn add(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                fn mul(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }

                fn checked_div(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_div(self, rhs)
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dtype;

                fn add(self, rhs: Self) -> Self {
                    self + rhs
                }

                fn mul(self, rhs: Self) -> Self {
                    self * rhs
                }

                fn checked_div(self, rhs: Self) -> Option<Self> {
                    Some(self / rhs)
                }
            }
        )*
    };
}

impl_int_element!(i8 => Int8, u8 => UInt8, i32 => Int32, i64 => Int64);
impl_float_element!(f16 => Float16, bf16 => BFloat16, f32 => Float32, f64 => Float64);
