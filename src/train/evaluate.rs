use serde::{Deserialize, Serialize};

use crate::error::{MatrixError, NetworkError};
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::math::scalar::{cast, to_f64, Real};
use crate::network::network::Network;
use crate::train::loop_fn::{batch_ranges, resolve_batch_size};

/// Result of scoring a network on a held-out dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean of the per-batch MSE values.
    pub mse: f64,
    /// Rows whose every output lands on the same side of 0.5 as the target.
    pub correct: usize,
    pub total: usize,
}

impl Evaluation {
    /// Fraction of rows classified correctly, in [0, 1].
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// Runs inference batch by batch and scores the outputs against `targets`.
/// The network is not modified.
pub fn evaluate<T: Real>(
    network: &Network<T>,
    inputs: &Matrix<T>,
    targets: &Matrix<T>,
    batch_size: Option<usize>,
) -> Result<Evaluation, NetworkError> {
    if inputs.rows() != targets.rows() {
        return Err(MatrixError::DimensionMismatch {
            op: "evaluate",
            lhs: inputs.shape(),
            rhs: targets.shape(),
        }
        .into());
    }
    let batch_size = resolve_batch_size(batch_size, inputs.rows())?;
    let threshold: T = cast(0.5);

    let mut total_mse = 0.0;
    let mut batches = 0;
    let mut correct = 0;

    for range in batch_ranges(inputs.rows(), batch_size) {
        let x = inputs.select_rows(range.clone())?;
        let y = targets.select_rows(range)?;
        let output = network.forwards(&x)?;

        total_mse += to_f64(MseLoss::loss(&output, &y)?);
        batches += 1;

        correct += output
            .iter_rows()
            .zip(y.iter_rows())
            .filter(|(out, expected)| {
                out.iter()
                    .zip(expected.iter())
                    .all(|(&o, &e)| (o > threshold) == (e > threshold))
            })
            .count();
    }

    Ok(Evaluation {
        mse: total_mse / batches as f64,
        correct,
        total: inputs.rows(),
    })
}
