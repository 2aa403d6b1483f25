use std::ops::Range;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{MatrixError, NetworkError};
use crate::math::matrix::Matrix;
use crate::math::scalar::{to_f64, Real};
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns the mean training
/// loss of the **last completed epoch**.
///
/// # Arguments
/// - `network`: mutable reference to the network; modified in place
/// - `inputs`: one sample per row, bias column included
/// - `targets`: expected outputs, one row per input row
/// - `config`: epochs, batch size, logging interval, optional progress channel
///
/// Batches are consecutive row ranges in dataset order; a trailing partial
/// batch is trained on as well. With zero epochs the current loss of the
/// whole dataset is returned and nothing is trained.
pub fn train_loop<T: Real>(
    network: &mut Network<T>,
    inputs: &Matrix<T>,
    targets: &Matrix<T>,
    config: &TrainConfig,
) -> Result<f64, NetworkError> {
    if inputs.rows() != targets.rows() {
        return Err(MatrixError::DimensionMismatch {
            op: "train_loop",
            lhs: inputs.shape(),
            rhs: targets.shape(),
        }
        .into());
    }
    let batch_size = resolve_batch_size(config.batch_size, inputs.rows())?;

    if config.epochs == 0 {
        return Ok(to_f64(network.mse(inputs, targets)?));
    }

    let mut progress_tx = config.progress_tx.clone();
    let mut last_train_loss = 0.0;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let (train_loss, batches) = run_one_epoch(network, inputs, targets, batch_size)?;
        last_train_loss = train_loss;

        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if config.log_every > 0 && (epoch % config.log_every == 0 || epoch == config.epochs) {
            info!(epoch, total = config.epochs, loss = train_loss, elapsed_ms, "epoch finished");
        }

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(tx) = &progress_tx {
            let stats = EpochStats {
                epoch,
                total_epochs: config.epochs,
                train_loss,
                batches,
                elapsed_ms,
            };
            if tx.send(stats).is_err() {
                debug!(epoch, "progress receiver dropped, no longer reporting");
                progress_tx = None;
            }
        }
    }

    Ok(last_train_loss)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Consecutive `batch_size`-row ranges covering `0..rows`.
pub(crate) fn batch_ranges(rows: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..rows)
        .step_by(batch_size)
        .map(move |start| start..(start + batch_size).min(rows))
}

pub(crate) fn resolve_batch_size(requested: Option<usize>, rows: usize) -> Result<usize, NetworkError> {
    match requested {
        Some(0) => Err(NetworkError::InvalidConfig("batch_size must be at least 1".to_owned())),
        Some(n) => Ok(n.min(rows)),
        None => Ok(rows),
    }
}

/// Runs one pass of batch gradient descent over the data.
/// Returns the mean pre-update loss over all batches and the batch count.
fn run_one_epoch<T: Real>(
    network: &mut Network<T>,
    inputs: &Matrix<T>,
    targets: &Matrix<T>,
    batch_size: usize,
) -> Result<(f64, usize), NetworkError> {
    if batch_size >= inputs.rows() {
        let loss = network.train(inputs, targets)?;
        return Ok((to_f64(loss), 1));
    }

    let mut total_loss = 0.0;
    let mut batches = 0;

    for range in batch_ranges(inputs.rows(), batch_size) {
        let x = inputs.select_rows(range.clone())?;
        let y = targets.select_rows(range)?;
        total_loss += to_f64(network.train(&x, &y)?);
        batches += 1;
    }

    Ok((total_loss / batches as f64, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::network::config::NetworkConfig;
    use std::sync::mpsc;

    fn nand() -> (Matrix<f64>, Matrix<f64>) {
        let x = Matrix::from_flat(4, 3, vec![
            0.0, 0.0, 1.0,
            0.0, 1.0, 1.0,
            1.0, 0.0, 1.0,
            1.0, 1.0, 1.0,
        ]).unwrap();
        let y = Matrix::from_flat(4, 1, vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        (x, y)
    }

    fn single_layer() -> Network<f64> {
        let w = Matrix::from_flat(3, 1, vec![0.1, -0.2, 0.05]).unwrap();
        Network::new(vec![w], NetworkConfig::new(ActivationFunction::Sigmoid, 0.5)).unwrap()
    }

    #[test]
    fn batch_ranges_cover_a_trailing_partial_batch() {
        let ranges: Vec<_> = batch_ranges(5, 2).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let (x, y) = nand();
        let mut net = single_layer();
        let err = train_loop(&mut net, &x, &y, &TrainConfig::new(1).with_batch_size(0)).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidConfig(_)));
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let (x, _) = nand();
        let y = Matrix::zeros(3, 1);
        let mut net = single_layer();
        assert!(train_loop(&mut net, &x, &y, &TrainConfig::new(1)).is_err());
    }

    #[test]
    fn nand_loss_decreases() {
        let (x, y) = nand();
        let mut net = single_layer();
        let initial = net.mse(&x, &y).unwrap();
        let last = train_loop(&mut net, &x, &y, &TrainConfig::new(2000)).unwrap();
        assert!(last < initial);
        assert!(net.mse(&x, &y).unwrap() < 0.05);
    }

    #[test]
    fn zero_epochs_reports_current_loss_only() {
        let (x, y) = nand();
        let mut net = single_layer();
        let before = net.weights().to_vec();
        let loss = train_loop(&mut net, &x, &y, &TrainConfig::new(0)).unwrap();
        assert_eq!(loss, net.mse(&x, &y).unwrap());
        assert_eq!(net.weights(), before.as_slice());
    }

    #[test]
    fn progress_is_sent_once_per_epoch() {
        let (x, y) = nand();
        let mut net = single_layer();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig::new(3).with_batch_size(3).with_progress(tx);

        train_loop(&mut net, &x, &y, &config).unwrap();
        drop(config);

        let stats: Vec<EpochStats> = rx.iter().collect();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[2].epoch, 3);
        assert!(stats.iter().all(|s| s.batches == 2 && s.total_epochs == 3));
    }

    #[test]
    fn dropped_receiver_does_not_stop_training() {
        let (x, y) = nand();
        let mut net = single_layer();
        let (tx, rx) = mpsc::channel();
        drop(rx);
        assert!(train_loop(&mut net, &x, &y, &TrainConfig::new(5).with_progress(tx)).is_ok());
    }
}
