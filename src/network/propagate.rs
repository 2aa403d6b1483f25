use tracing::{debug, warn};

use crate::activation::activation::ActivationFunction;
use crate::error::{MatrixError, NetworkError};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::math::scalar::{cast, Real};
use crate::network::config::{GradientMode, NetworkConfig};

/// Forward and backward propagation over a stack of weight matrices.
///
/// The propagator owns only hyper-parameters; weights are borrowed per
/// call, so the same instance drives any stack whose shapes chain. Weight
/// `i` maps the activation of layer `i` (plus the bias column, for hidden
/// layers with a bias configured) to layer `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Propagator<T> {
    activation: ActivationFunction,
    learning_rate: T,
    gradient: GradientMode,
    hidden_bias: Option<T>,
}

impl<T: Real> Propagator<T> {
    /// Fails with [`NetworkError::InvalidConfig`] when `config` does not
    /// validate, e.g. a non-positive or NaN learning rate.
    pub fn new(config: &NetworkConfig) -> Result<Propagator<T>, NetworkError> {
        config.validate()?;
        Ok(Propagator {
            activation: config.activation,
            learning_rate: cast(config.learning_rate),
            gradient: config.gradient,
            hidden_bias: config.hidden_bias.map(cast),
        })
    }

    pub fn learning_rate(&self) -> T {
        self.learning_rate
    }

    /// Activated output of one layer: `g(A · W)`.
    pub fn forward_one(&self, input: &Matrix<T>, weights: &Matrix<T>) -> Result<Matrix<T>, MatrixError> {
        let g = self.activation;
        let mut z = input.dot(weights)?;
        z.map_in_place(|x| g.function(x));
        Ok(z)
    }

    /// Inference only: runs every layer and returns the output activation.
    pub fn forwards(&self, input: &Matrix<T>, weights: &[Matrix<T>]) -> Result<Matrix<T>, MatrixError> {
        let mut current = input.clone();
        for (i, w) in weights.iter().enumerate() {
            current = self.forward_one(&current, w)?;
            if i + 1 < weights.len() {
                current = self.with_bias(current);
            }
        }
        Ok(current)
    }

    /// Runs every layer and keeps each activation: the input batch first,
    /// then one matrix per weight. Hidden activations include the bias
    /// column when one is configured.
    pub fn forward(&self, input: &Matrix<T>, weights: &[Matrix<T>]) -> Result<Vec<Matrix<T>>, MatrixError> {
        let mut activations = Vec::with_capacity(weights.len() + 1);
        activations.push(input.clone());

        for (i, w) in weights.iter().enumerate() {
            let previous = &activations[activations.len() - 1];
            let mut a = self.forward_one(previous, w)?;
            if i + 1 < weights.len() {
                a = self.with_bias(a);
            }
            activations.push(a);
        }

        Ok(activations)
    }

    /// One gradient-descent step on `weights` for the batch `input`/`target`.
    ///
    /// Returns the loss of the pre-update output. Every shape is checked
    /// before the first weight is touched, so an `Err` leaves the stack
    /// unchanged.
    pub fn train(&self, input: &Matrix<T>, target: &Matrix<T>, weights: &mut [Matrix<T>]) -> Result<T, MatrixError> {
        let activations = self.forward(input, weights)?;
        assert_eq!(
            activations.len(),
            weights.len() + 1,
            "forward pass must yield one activation per weight plus the input"
        );

        let output = &activations[weights.len()];
        let loss = MseLoss::loss(output, target)?;
        if !loss.is_finite() {
            warn!(loss = ?loss, "training loss is not finite");
        }

        let g = self.activation;
        let step = match self.gradient {
            GradientMode::Sum => self.learning_rate,
            GradientMode::Mean => self.learning_rate / cast(input.rows() as f64),
        };

        // D = (Y - A_out) ⊙ g'(A_out)
        let mut delta = MseLoss::derivative(output, target)?.hadamard(&output.map(|a| g.derivative(a)))?;

        for i in (0..weights.len()).rev() {
            let a = &activations[i];
            let gradient = a.transpose().dot(&delta)?;

            // The propagated delta must read W_i before it is updated.
            if i > 0 {
                let mut back = delta.dot(&weights[i].transpose())?;
                let local = if self.hidden_bias.is_some() {
                    back = back.without_last_column();
                    a.without_last_column()
                } else {
                    a.clone()
                };
                delta = back.hadamard(&local.map(|x| g.derivative(x)))?;
            }

            weights[i] += gradient * step;
        }

        debug!(loss = ?loss, layers = weights.len(), rows = input.rows(), "training step");
        Ok(loss)
    }

    fn with_bias(&self, a: Matrix<T>) -> Matrix<T> {
        match self.hidden_bias {
            Some(bias) => a.with_column(bias),
            None => a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: usize, cols: usize, values: &[f64]) -> Matrix<f64> {
        Matrix::from_flat(rows, cols, values.to_vec()).unwrap()
    }

    fn identity_propagator(learning_rate: f64) -> Propagator<f64> {
        Propagator::new(&NetworkConfig::new(ActivationFunction::Identity, learning_rate)).unwrap()
    }

    #[test]
    fn forward_one_applies_the_activation() {
        let p: Propagator<f64> = Propagator::new(&NetworkConfig::default()).unwrap();
        let out = p.forward_one(&m(1, 2, &[1.0, -1.0]), &m(2, 1, &[1.0, 1.0])).unwrap();
        assert_eq!(out, m(1, 1, &[0.5]));
    }

    #[test]
    fn forward_retains_every_activation() {
        let p = identity_propagator(0.1);
        let weights = vec![m(2, 3, &[1.0; 6]), m(3, 1, &[1.0; 3])];
        let acts = p.forward(&m(1, 2, &[1.0, 2.0]), &weights).unwrap();
        assert_eq!(acts.len(), 3);
        assert_eq!(acts[1], m(1, 3, &[3.0, 3.0, 3.0]));
        assert_eq!(acts[2], m(1, 1, &[9.0]));
        assert_eq!(p.forwards(&m(1, 2, &[1.0, 2.0]), &weights).unwrap(), acts[2]);
    }

    #[test]
    fn hidden_bias_is_appended_to_hidden_layers_only() {
        let config = NetworkConfig::new(ActivationFunction::Identity, 0.1).with_hidden_bias(1.0);
        let p: Propagator<f64> = Propagator::new(&config).unwrap();
        let weights = vec![m(2, 2, &[1.0, 0.0, 0.0, 1.0]), m(3, 1, &[1.0, 1.0, 10.0])];
        let acts = p.forward(&m(1, 2, &[2.0, 3.0]), &weights).unwrap();
        assert_eq!(acts[1], m(1, 3, &[2.0, 3.0, 1.0]));
        assert_eq!(acts[2], m(1, 1, &[15.0]));
    }

    #[test]
    fn single_layer_update_matches_the_delta_rule() {
        // Identity activation: g'(a) = 1, so ΔW = η · Aᵀ(Y - A W).
        let p = identity_propagator(0.5);
        let mut weights = vec![m(2, 1, &[0.0, 0.0])];
        let input = m(1, 2, &[1.0, 2.0]);
        let target = m(1, 1, &[1.0]);

        let loss = p.train(&input, &target, &mut weights).unwrap();

        assert_eq!(loss, 0.5);
        assert_eq!(weights[0], m(2, 1, &[0.5, 1.0]));
    }

    #[test]
    fn delta_uses_pre_update_weights() {
        // Two identity layers, one sample, hand-computed:
        //   A1 = [1], W1 = [1], W2 = [2]  =>  A2 = [1], A3 = [2]
        //   D2 = Y - A3 = [1]
        //   G2 = A2ᵀ D2 = [1];  D1 = D2 W2ᵀ = [2] (old W2)
        //   G1 = A1ᵀ D1 = [2]
        // With η = 1: W2 = [3], W1 = [3]. Using the updated W2 would
        // have produced W1 = [4].
        let p = identity_propagator(1.0);
        let mut weights = vec![m(1, 1, &[1.0]), m(1, 1, &[2.0])];
        p.train(&m(1, 1, &[1.0]), &m(1, 1, &[3.0]), &mut weights).unwrap();
        assert_eq!(weights[1], m(1, 1, &[3.0]));
        assert_eq!(weights[0], m(1, 1, &[3.0]));
    }

    #[test]
    fn batch_gradients_are_summed_by_default() {
        let input = m(2, 1, &[1.0, 1.0]);
        let target = m(2, 1, &[1.0, 1.0]);

        let mut summed = vec![m(1, 1, &[0.0])];
        identity_propagator(0.5).train(&input, &target, &mut summed).unwrap();
        assert_eq!(summed[0], m(1, 1, &[1.0]));

        let config = NetworkConfig::new(ActivationFunction::Identity, 0.5).with_gradient(GradientMode::Mean);
        let mut averaged = vec![m(1, 1, &[0.0])];
        Propagator::new(&config).unwrap().train(&input, &target, &mut averaged).unwrap();
        assert_eq!(averaged[0], m(1, 1, &[0.5]));
    }

    #[test]
    fn bad_target_leaves_weights_untouched() {
        let p = identity_propagator(0.1);
        let mut weights = vec![m(2, 1, &[0.3, -0.2])];
        let before = weights.clone();
        let err = p.train(&m(1, 2, &[1.0, 1.0]), &m(1, 2, &[1.0, 1.0]), &mut weights).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { op: "mse", .. }));
        assert_eq!(weights, before);
    }

    #[test]
    fn bad_input_width_is_a_dimension_mismatch() {
        let p = identity_propagator(0.1);
        let weights = vec![m(2, 1, &[0.3, -0.2])];
        let err = p.forwards(&m(1, 3, &[1.0, 1.0, 1.0]), &weights).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { op: "dot", .. }));
    }

    #[test]
    fn invalid_learning_rates_are_rejected() {
        for lr in [0.0, -0.5, f64::NAN] {
            let config = NetworkConfig::new(ActivationFunction::Sigmoid, lr);
            let err = Propagator::<f64>::new(&config).unwrap_err();
            assert!(matches!(err, NetworkError::InvalidConfig(_)));
        }
        let p = Propagator::<f32>::new(&NetworkConfig::default()).unwrap();
        assert!((p.learning_rate() - 0.1).abs() < 1e-7);
    }
}
