pub mod matrix;
pub mod ops;
pub mod scalar;

pub use matrix::{dot, Matrix, Shape};
pub use scalar::{Real, Scalar};
