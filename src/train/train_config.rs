use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: number of full passes over the training data
/// - `batch_size`: rows per training step; `None` trains on the whole
///   dataset as a single batch
/// - `log_every`: emit an `info!` line every this many epochs (0 = never)
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch. If the receiver is dropped the loop
///   simply stops reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub log_every: usize,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Full-batch training for `epochs` epochs with no logging and no
    /// progress channel.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size: None,
            log_every: 0,
            progress_tx: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}
