use std::fmt::{Debug, Display};
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

use num_traits::{Float, Num, NumCast, ToPrimitive};

/// Element type of a [`Matrix`](crate::math::matrix::Matrix).
///
/// Any signed arithmetic type qualifies: `i32`, `i64`, `f32`, `f64`, ...
/// Unsigned integers are excluded because negation is part of the
/// matrix contract.
pub trait Scalar:
    Num + Neg<Output = Self> + Copy + PartialEq + PartialOrd + AddAssign + SubAssign + MulAssign + Debug + Display
{
}

impl<T> Scalar for T where
    T: Num + Neg<Output = T> + Copy + PartialEq + PartialOrd + AddAssign + SubAssign + MulAssign + Debug + Display
{
}

/// Floating-point element type required by the propagation engine
/// (activations need `exp`, `tanh`, ...).
pub trait Real: Scalar + Float {}

impl<T> Real for T where T: Scalar + Float {}

/// Converts an `f64` configuration value into the element type.
pub(crate) fn cast<T: Real>(value: f64) -> T {
    <T as NumCast>::from(value).unwrap_or_else(T::nan)
}

/// Widens an element to `f64` for reporting.
pub(crate) fn to_f64<T: Real>(value: T) -> f64 {
    ToPrimitive::to_f64(&value).unwrap_or(f64::NAN)
}
