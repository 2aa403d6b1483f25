use serde::{Deserialize, Serialize};

use crate::math::scalar::Real;

/// Element-wise nonlinearity applied after every layer's weighted sum.
///
/// Each variant's derivative is expressed in terms of the activation's own
/// output `a = g(z)`, so backpropagation only needs the retained forward
/// activations and never the pre-activation sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Logistic sigmoid, `g'(a) = a(1 - a)`.
    #[default]
    Sigmoid,
    /// `g'(a) = 1 - a²`.
    Tanh,
    /// `g'(a) = 1` for `a > 0`, else `0`.
    #[serde(rename = "relu")]
    ReLU,
    Identity,
}

impl ActivationFunction {
    pub fn function<T: Real>(&self, x: T) -> T {
        match self {
            ActivationFunction::Sigmoid => T::one() / (T::one() + (-x).exp()),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => {
                if x > T::zero() {
                    x
                } else {
                    T::zero()
                }
            }
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative evaluated at the activation output `a`, not at the
    /// pre-activation input.
    pub fn derivative<T: Real>(&self, a: T) -> T {
        match self {
            ActivationFunction::Sigmoid => a * (T::one() - a),
            ActivationFunction::Tanh => T::one() - a * a,
            ActivationFunction::ReLU => {
                if a > T::zero() {
                    T::one()
                } else {
                    T::zero()
                }
            }
            ActivationFunction::Identity => T::one(),
        }
    }
}
