use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::NetworkError;

/// How the per-sample gradients of a batch are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Sum over the batch rows, so larger batches take larger steps.
    #[default]
    Sum,
    /// Sum divided by the number of rows in the batch.
    Mean,
}

/// Hyper-parameters fixed for the lifetime of one network.
///
/// Fields:
/// - `activation`: nonlinearity `g` applied after every layer
/// - `learning_rate`: gradient-descent step size η, must be positive
/// - `gradient`: batch gradient aggregation
/// - `hidden_bias`: when set, a constant column with this value is
///   appended to every hidden activation, so each weight
///   after the first carries one extra row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub activation: ActivationFunction,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub gradient: GradientMode,
    #[serde(default)]
    pub hidden_bias: Option<f64>,
}

fn default_learning_rate() -> f64 {
    0.1
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            activation: ActivationFunction::Sigmoid,
            learning_rate: default_learning_rate(),
            gradient: GradientMode::Sum,
            hidden_bias: None,
        }
    }
}

impl NetworkConfig {
    pub fn new(activation: ActivationFunction, learning_rate: f64) -> Self {
        NetworkConfig {
            activation,
            learning_rate,
            ..NetworkConfig::default()
        }
    }

    pub fn with_gradient(mut self, gradient: GradientMode) -> Self {
        self.gradient = gradient;
        self
    }

    pub fn with_hidden_bias(mut self, bias: f64) -> Self {
        self.hidden_bias = Some(bias);
        self
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetworkError::InvalidConfig(format!(
                "learning rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        if let Some(bias) = self.hidden_bias {
            if !bias.is_finite() {
                return Err(NetworkError::InvalidConfig(format!(
                    "hidden bias must be finite, got {bias}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = NetworkConfig::default();
        assert_eq!(config.activation, ActivationFunction::Sigmoid);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.gradient, GradientMode::Sum);
        assert_eq!(config.hidden_bias, None);
    }

    #[test]
    fn rejects_non_positive_learning_rates() {
        for lr in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(NetworkConfig::new(ActivationFunction::Sigmoid, lr).validate().is_err());
        }
        assert!(NetworkConfig::default().with_hidden_bias(f64::NAN).validate().is_err());
    }

    #[test]
    fn missing_json_fields_fall_back_to_defaults() {
        let config: NetworkConfig = serde_json::from_str(r#"{ "activation": "tanh" }"#).unwrap();
        assert_eq!(config.activation, ActivationFunction::Tanh);
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.gradient, GradientMode::Sum);
    }
}
