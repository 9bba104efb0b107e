//! Main configuration module.
//!
//! All node settings live in one `delcore.toml` file. Every section has
//! serde defaults so a minimal file only needs the node key and the
//! delegate list.

use crate::error::{ConfigError, ConfigResult};
use crate::genesis::GenesisConfig;
use delcore_types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Top-level configuration for a delcore node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Node identity
    pub node: NodeConfig,

    /// Admission and execution timing policy
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// RPC server settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Store backend settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The fixed delegate membership
    #[serde(default)]
    pub delegates: Vec<DelegateEntry>,

    /// Balances seeded on first start
    #[serde(default)]
    pub genesis: GenesisConfig,
}

impl Config {
    /// Loads configuration from a TOML file and validates it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        info!("loading configuration from {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)?;

        debug!("configuration parsed, validating");
        config.validate()?;

        info!(
            delegates = config.delegates.len(),
            is_delegate = config.node.is_delegate,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Loads configuration from a TOML string. Useful for testing.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges and internal consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.node.private_key.trim().is_empty() {
            return Err(ConfigError::Invalid("node.private_key must be set".into()));
        }
        if self.consensus.tx_receive_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "consensus.tx_receive_timeout_ms must be positive".into(),
            ));
        }
        if self.consensus.gossip_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "consensus.gossip_timeout_ms must be positive".into(),
            ));
        }
        if self.consensus.max_gossip_attempts == 0 {
            return Err(ConfigError::Invalid(
                "consensus.max_gossip_attempts must be positive".into(),
            ));
        }

        // The cache must outlive a transaction's full admission window, or
        // receipts would vanish while their gossip is still circulating.
        let admission_window_ms = self.consensus.gossip_timeout_ms
            * self.delegates.len().max(1) as u64
            + self.consensus.tx_receive_timeout_ms;
        if self.consensus.cache_ttl_secs * 1000 <= admission_window_ms {
            return Err(ConfigError::Invalid(format!(
                "consensus.cache_ttl_secs ({}) must exceed the admission window ({admission_window_ms} ms)",
                self.consensus.cache_ttl_secs
            )));
        }

        if self.node.is_delegate && self.delegates.is_empty() {
            return Err(ConfigError::Invalid(
                "a delegate node needs a non-empty [[delegates]] list".into(),
            ));
        }

        Ok(())
    }
}

/// Node identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Hex-encoded secp256k1 private key
    pub private_key: String,
    /// This node's reachable RPC endpoint, as peers should dial it
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Whether this node is a member of the delegate set
    #[serde(default)]
    pub is_delegate: bool,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:1975".to_string()
}

/// Admission and execution timing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// How far in the past a transaction's timestamp may lie at ingress
    pub tx_receive_timeout_ms: u64,
    /// Per-delegate hop budget for a rumor round
    pub gossip_timeout_ms: u64,
    /// Re-submission bound per transaction hash before the gossip is dropped
    pub max_gossip_attempts: u32,
    /// Cache horizon for transactions, receipts, and gossips
    pub cache_ttl_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            tx_receive_timeout_ms: 3_000,
            gossip_timeout_ms: 200,
            max_gossip_attempts: 8,
            cache_ttl_secs: 120,
        }
    }
}

/// RPC server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Listen address for the HTTP JSON-RPC server
    pub listen: String,
    /// Maximum concurrent connections
    pub max_connections: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:1975".to_string(),
            max_connections: 512,
        }
    }
}

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory store; state is lost on restart
    Memory,
    /// RocksDB store at `storage.path`
    #[default]
    Rocksdb,
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use
    pub backend: StorageBackend,
    /// Database directory for the RocksDB backend
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rocksdb,
            path: "./data/delcore".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. `info` or `delcore_dpos=debug,info`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One member of the fixed delegate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateEntry {
    /// The delegate's account address
    pub address: Address,
    /// The delegate's reachable RPC endpoint
    pub endpoint: String,
}
