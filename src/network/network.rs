use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::error::NetworkError;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::math::scalar::Real;
use crate::network::config::NetworkConfig;
use crate::network::propagate::Propagator;
use crate::network::spec::NetworkSpec;
use crate::network::topology::Topology;

/// A feed-forward network: an ordered weight stack plus the hyper-parameters
/// that drive it.
///
/// Shapes are validated once in [`Network::new`]; the stack is never resized
/// afterwards, only updated in place by [`Network::train`].
#[derive(Debug, Clone)]
pub struct Network<T = f64> {
    weights: Vec<Matrix<T>>,
    config: NetworkConfig,
    propagator: Propagator<T>,
}

impl<T: Real> Network<T> {
    /// Builds a network from an existing weight stack.
    pub fn new(weights: Vec<Matrix<T>>, config: NetworkConfig) -> Result<Network<T>, NetworkError> {
        let propagator = Propagator::new(&config)?;
        if weights.is_empty() {
            return Err(NetworkError::EmptyStack);
        }

        let bias_inputs = usize::from(config.hidden_bias.is_some());
        for (i, pair) in weights.windows(2).enumerate() {
            let produced = pair[0].cols() + bias_inputs;
            if produced != pair[1].rows() {
                return Err(NetworkError::IncompatibleLayers {
                    layer: i,
                    next: i + 1,
                    produced,
                    expected: pair[1].rows(),
                });
            }
        }

        debug!(
            layers = weights.len(),
            inputs = weights[0].rows(),
            outputs = weights[weights.len() - 1].cols(),
            "network built"
        );

        Ok(Network {
            propagator,
            weights,
            config,
        })
    }

    /// Random weights (uniform in [-1, 1]) for `topology`.
    pub fn random<R: Rng + ?Sized>(topology: &Topology, config: NetworkConfig, rng: &mut R) -> Result<Network<T>, NetworkError> {
        let weights = topology.random_weights(config.hidden_bias.is_some(), rng)?;
        Network::new(weights, config)
    }

    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Network<T>, NetworkError> {
        Network::random(&spec.topology, spec.config, rng)
    }

    /// Inference only; returns the output activation for `input`.
    pub fn forwards(&self, input: &Matrix<T>) -> Result<Matrix<T>, NetworkError> {
        Ok(self.propagator.forwards(input, &self.weights)?)
    }

    /// Every activation from the input batch to the output layer.
    pub fn forward(&self, input: &Matrix<T>) -> Result<Vec<Matrix<T>>, NetworkError> {
        Ok(self.propagator.forward(input, &self.weights)?)
    }

    /// One training step on a batch; returns the loss before the update.
    pub fn train(&mut self, input: &Matrix<T>, target: &Matrix<T>) -> Result<T, NetworkError> {
        Ok(self.propagator.train(input, target, &mut self.weights)?)
    }

    /// Loss of the current weights on a batch, without training.
    pub fn mse(&self, input: &Matrix<T>, target: &Matrix<T>) -> Result<T, NetworkError> {
        let output = self.forwards(input)?;
        Ok(MseLoss::loss(&output, target)?)
    }

    pub fn weights(&self) -> &[Matrix<T>] {
        &self.weights
    }

    pub fn into_weights(self) -> Vec<Matrix<T>> {
        self.weights
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn depth(&self) -> usize {
        self.weights.len()
    }

    /// Columns the input batch must have, bias input included.
    pub fn input_size(&self) -> usize {
        self.weights[0].rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights[self.weights.len() - 1].cols()
    }
}

impl<T: Real> fmt::Display for Network<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.weights.iter().enumerate() {
            writeln!(f, "W{} ({}):", i + 1, w.shape())?;
            writeln!(f, "{w}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::error::MatrixError;
    use crate::math::matrix::Shape;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn zeros(rows: usize, cols: usize) -> Matrix<f64> {
        Matrix::zeros(rows, cols)
    }

    #[test]
    fn rejects_an_empty_stack() {
        let err = Network::<f64>::new(vec![], NetworkConfig::default()).unwrap_err();
        assert!(matches!(err, NetworkError::EmptyStack));
    }

    #[test]
    fn rejects_weights_that_do_not_chain() {
        let err = Network::new(vec![zeros(3, 2), zeros(3, 1)], NetworkConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::IncompatibleLayers { layer: 0, next: 1, produced: 2, expected: 3 }
        ));
    }

    #[test]
    fn hidden_bias_changes_the_chaining_rule() {
        let config = NetworkConfig::default().with_hidden_bias(1.0);
        assert!(Network::new(vec![zeros(3, 2), zeros(3, 1)], config).is_ok());
        assert!(Network::new(vec![zeros(3, 2), zeros(2, 1)], config).is_err());
    }

    #[test]
    fn rejects_an_invalid_learning_rate() {
        let config = NetworkConfig::new(ActivationFunction::Sigmoid, -1.0);
        assert!(matches!(
            Network::new(vec![zeros(2, 1)], config),
            Err(NetworkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn forwards_does_not_mutate() {
        let mut rng = StdRng::seed_from_u64(3);
        let net: Network<f64> = Network::random(&Topology::new(3, 2, 2, 4), NetworkConfig::default(), &mut rng).unwrap();
        let before = net.weights().to_vec();
        let input = Matrix::from_flat(2, 3, vec![0.0, 1.0, 1.0, 1.0, 0.0, 1.0]).unwrap();

        let first = net.forwards(&input).unwrap();
        let second = net.forwards(&input).unwrap();

        assert_eq!(first, second);
        assert_eq!(net.weights(), before.as_slice());
        assert_eq!(first.shape(), Shape::new(2, 2));
    }

    #[test]
    fn train_reports_matrix_errors() {
        let mut net = Network::new(vec![zeros(2, 1)], NetworkConfig::default()).unwrap();
        let input = Matrix::from_flat(1, 3, vec![1.0, 1.0, 1.0]).unwrap();
        let target = Matrix::from_flat(1, 1, vec![1.0]).unwrap();
        let err = net.train(&input, &target).unwrap_err();
        assert!(matches!(err, NetworkError::Matrix(MatrixError::DimensionMismatch { op: "dot", .. })));
    }

    #[test]
    fn sizes_come_from_the_outer_weights() {
        let net = Network::new(vec![zeros(3, 4), zeros(4, 2)], NetworkConfig::default()).unwrap();
        assert_eq!(net.depth(), 2);
        assert_eq!(net.input_size(), 3);
        assert_eq!(net.output_size(), 2);
    }

    fn xor_data() -> (Matrix<f64>, Matrix<f64>) {
        let x = Matrix::from_flat(4, 3, vec![
            0.0, 0.0, 1.0,
            0.0, 1.0, 1.0,
            1.0, 0.0, 1.0,
            1.0, 1.0, 1.0,
        ]).unwrap();
        let y = Matrix::from_flat(4, 1, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        (x, y)
    }

    fn assert_learned_xor(net: &Network<f64>, x: &Matrix<f64>, y: &Matrix<f64>) {
        let out = net.forwards(x).unwrap();
        assert!(out.at(0, 0) < 0.5, "0 xor 0 gave {}", out.at(0, 0));
        assert!(out.at(1, 0) > 0.5, "0 xor 1 gave {}", out.at(1, 0));
        assert!(out.at(2, 0) > 0.5, "1 xor 0 gave {}", out.at(2, 0));
        assert!(out.at(3, 0) < 0.5, "1 xor 1 gave {}", out.at(3, 0));
        assert!(net.mse(x, y).unwrap() < 0.05);
    }

    #[test]
    fn learns_xor_with_two_hidden_neurons() {
        let (x, y) = xor_data();
        let w1 = Matrix::from_flat(3, 2, vec![0.2, -0.1, 0.7, 0.9, -0.1, 0.3]).unwrap();
        let w2 = Matrix::from_flat(2, 1, vec![-0.9, 0.4]).unwrap();
        let mut net = Network::new(vec![w1, w2], NetworkConfig::default()).unwrap();

        let initial = net.mse(&x, &y).unwrap();
        for _ in 0..10_000 {
            net.train(&x, &y).unwrap();
        }

        assert!(net.mse(&x, &y).unwrap() < initial);
        assert_learned_xor(&net, &x, &y);
    }

    #[test]
    fn learns_xor_with_a_hidden_bias() {
        let (x, y) = xor_data();
        let w1 = Matrix::from_flat(3, 2, vec![0.5, -0.6, -0.4, 0.8, 0.3, 0.2]).unwrap();
        let w2 = Matrix::from_flat(3, 1, vec![0.7, -0.5, 0.2]).unwrap();
        let config = NetworkConfig::default().with_hidden_bias(1.0);
        let mut net = Network::new(vec![w1, w2], config).unwrap();

        for _ in 0..10_000 {
            net.train(&x, &y).unwrap();
        }

        assert_learned_xor(&net, &x, &y);
    }

    #[test]
    fn display_lists_every_weight() {
        let net = Network::new(vec![zeros(3, 2), zeros(2, 1)], NetworkConfig::default()).unwrap();
        let text = net.to_string();
        assert!(text.starts_with("W1 (3x2):\n"));
        assert!(text.contains("W2 (2x1):\n"));
    }
}
