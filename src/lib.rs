pub mod math;
pub mod activation;
pub mod network;
pub mod loss;
pub mod train;
pub mod dataset;
pub mod error;

// Convenience re-exports
pub use math::matrix::{dot, Matrix, Shape};
pub use math::scalar::{Real, Scalar};
pub use activation::activation::ActivationFunction;
pub use network::config::{GradientMode, NetworkConfig};
pub use network::network::Network;
pub use network::propagate::Propagator;
pub use network::spec::NetworkSpec;
pub use network::topology::{layer_shapes, Topology};
pub use loss::mse::{mse, MseLoss};
pub use train::evaluate::{evaluate, Evaluation};
pub use train::loop_fn::train_loop;
pub use train::train_config::TrainConfig;
pub use train::epoch_stats::EpochStats;
pub use dataset::{parse_idx_pair, read_idx_pair, render_image, IdxDataset};
pub use error::{IdxError, MatrixError, NetworkError};
