use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::network::config::NetworkConfig;
use crate::network::topology::Topology;

/// A serializable description of a network's architecture and
/// hyper-parameters.
///
/// Only the shape of the network and how it trains are stored; trained
/// weights are never written. Loading a spec and calling
/// [`Network::from_spec`](crate::network::network::Network::from_spec)
/// yields a freshly initialized network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, used by the demos for log lines.
    pub name: String,
    pub topology: Topology,
    #[serde(default)]
    pub config: NetworkConfig,
}

impl NetworkSpec {
    pub fn new(name: impl Into<String>, topology: Topology, config: NetworkConfig) -> NetworkSpec {
        NetworkSpec {
            name: name.into(),
            topology,
            config,
        }
    }

    pub fn validate(&self) -> Result<(), NetworkError> {
        self.topology.validate()?;
        self.config.validate()
    }

    pub fn to_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<NetworkSpec, NetworkError> {
        let spec: NetworkSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<(), NetworkError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a spec from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec, NetworkError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}
