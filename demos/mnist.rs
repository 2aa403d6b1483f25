/// MNIST digit classification with strata-nn.
///
/// Architecture: 785 (784 pixels + bias) → 64 (Sigmoid, + bias) → 10 (Sigmoid)
/// Loss:         MSE on one-hot targets
/// Update:       mean-gradient batch descent, lr = 0.5, batch size 32
///
/// Run with:
///   cargo run --example mnist --release -- [epochs]
///
/// Data files must be present at demos/mnist_data/ (IDX binary format).

use std::error::Error;
use std::sync::mpsc;
use std::thread;

use strata_nn::{
    evaluate, read_idx_pair, render_image, train_loop, ActivationFunction, EpochStats,
    GradientMode, Matrix, Network, NetworkConfig, Topology, TrainConfig,
};
use tracing_subscriber::EnvFilter;

const DATA_DIR: &str = "demos/mnist_data";
const CLASSES: usize = 10;
const SAMPLES_SHOWN: usize = 3;

/// Index of the largest value in a row.
fn argmax(row: &[f64]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn argmax_accuracy(outputs: &Matrix, targets: &Matrix) -> f64 {
    let correct = outputs
        .iter_rows()
        .zip(targets.iter_rows())
        .filter(|(out, want)| argmax(out) == argmax(want))
        .count();
    correct as f64 / outputs.rows() as f64 * 100.0
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let epochs: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 10,
    };

    // --- Load data ---
    println!("Loading MNIST data from {DATA_DIR}...");
    let train = read_idx_pair(
        format!("{DATA_DIR}/train-images-idx3-ubyte"),
        format!("{DATA_DIR}/train-labels-idx1-ubyte"),
        CLASSES,
        Some((28, 28)),
    )?;
    let test = read_idx_pair(
        format!("{DATA_DIR}/t10k-images-idx3-ubyte"),
        format!("{DATA_DIR}/t10k-labels-idx1-ubyte"),
        CLASSES,
        Some((28, 28)),
    )?;
    println!("  Training set: {} images", train.inputs.rows());
    println!("  Test set:     {} images", test.inputs.rows());

    let train_x = train.inputs.with_column(1.0);
    let test_x = test.inputs.with_column(1.0);

    // --- Build network ---
    let config = NetworkConfig::new(ActivationFunction::Sigmoid, 0.5)
        .with_gradient(GradientMode::Mean)
        .with_hidden_bias(1.0);
    let topology = Topology::new(train_x.cols(), CLASSES, 1, 64);
    let mut network: Network = Network::random(&topology, config, &mut rand::thread_rng())?;

    // --- Train, printing one line per epoch from a listener thread ---
    let (tx, rx) = mpsc::channel::<EpochStats>();
    let printer = thread::spawn(move || {
        for stats in rx {
            println!(
                "{:>4}/{:<4}  loss {:>10.6}  ({} batches, {} ms)",
                stats.epoch, stats.total_epochs, stats.train_loss, stats.batches, stats.elapsed_ms
            );
        }
    });

    let train_config = TrainConfig::new(epochs)
        .with_batch_size(32)
        .with_log_every(0)
        .with_progress(tx);
    train_loop(&mut network, &train_x, &train.targets, &train_config)?;
    drop(train_config);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    // --- Evaluate on test set ---
    let eval = evaluate(&network, &test_x, &test.targets, Some(1_000))?;
    let outputs = network.forwards(&test_x)?;
    println!("\nTest MSE:                 {:.6}", eval.mse);
    println!("Thresholded accuracy:     {:.2}%", eval.accuracy() * 100.0);
    println!("Argmax accuracy:          {:.2}%", argmax_accuracy(&outputs, &test.targets));

    // --- Sample predictions ---
    for i in 0..SAMPLES_SHOWN.min(test.inputs.rows()) {
        println!(
            "\nlabel {}, predicted {}",
            argmax(test.targets.row(i)),
            argmax(outputs.row(i))
        );
        print!("{}", render_image(test.inputs.row(i), test.image_cols, test.image_rows));
    }

    Ok(())
}
