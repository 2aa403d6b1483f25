pub mod config;
pub mod network;
pub mod propagate;
pub mod spec;
pub mod topology;

pub use config::{GradientMode, NetworkConfig};
pub use network::Network;
pub use propagate::Propagator;
pub use spec::NetworkSpec;
pub use topology::{layer_shapes, Topology};
