use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::math::matrix::Matrix;
use crate::math::scalar::Real;

/// Weight shapes for a fully connected stack.
///
/// `[(input, N), (N, N) × (H - 1), (N, output)]`, or `[(input, output)]`
/// when there are no hidden layers. Any bias input must already be
/// counted in `input`.
pub fn layer_shapes(
    input: usize,
    output: usize,
    hidden_layers: usize,
    neurons_per_layer: usize,
) -> Vec<(usize, usize)> {
    if hidden_layers == 0 {
        return vec![(input, output)];
    }

    let mut shapes = Vec::with_capacity(hidden_layers + 1);
    shapes.push((input, neurons_per_layer));
    for _ in 1..hidden_layers {
        shapes.push((neurons_per_layer, neurons_per_layer));
    }
    shapes.push((neurons_per_layer, output));
    shapes
}

/// Serializable description of a uniform fully connected network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub input: usize,
    pub output: usize,
    #[serde(default)]
    pub hidden_layers: usize,
    #[serde(default)]
    pub neurons_per_layer: usize,
}

impl Topology {
    pub fn new(input: usize, output: usize, hidden_layers: usize, neurons_per_layer: usize) -> Topology {
        Topology {
            input,
            output,
            hidden_layers,
            neurons_per_layer,
        }
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.input == 0 || self.output == 0 {
            return Err(NetworkError::InvalidConfig(format!(
                "input and output sizes must be non-zero, got {} and {}",
                self.input, self.output
            )));
        }
        if self.hidden_layers > 0 && self.neurons_per_layer == 0 {
            return Err(NetworkError::InvalidConfig(
                "hidden layers need at least one neuron each".to_owned(),
            ));
        }
        Ok(())
    }

    /// Weight shapes for this topology. With `hidden_bias`, every weight
    /// after the first gets an extra row for the bias input.
    pub fn weight_shapes(&self, hidden_bias: bool) -> Vec<(usize, usize)> {
        layer_shapes(self.input, self.output, self.hidden_layers, self.neurons_per_layer)
            .into_iter()
            .enumerate()
            .map(|(i, (rows, cols))| {
                if hidden_bias && i > 0 {
                    (rows + 1, cols)
                } else {
                    (rows, cols)
                }
            })
            .collect()
    }

    /// Allocates weights of the right shapes, uniform in [-1, 1].
    pub fn random_weights<T: Real, R: Rng + ?Sized>(&self, hidden_bias: bool, rng: &mut R) -> Result<Vec<Matrix<T>>, NetworkError> {
        self.validate()?;
        Ok(self
            .weight_shapes(hidden_bias)
            .into_iter()
            .map(|(rows, cols)| Matrix::random_with(rows, cols, &mut *rng))
            .collect())
    }
}
