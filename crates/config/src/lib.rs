//! # delcore Config
//!
//! Single-file TOML configuration for delcore nodes: node identity, the
//! admission timing policy, RPC and store settings, the fixed delegate
//! membership, and genesis balances.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod genesis;

pub use config::{
    Config, ConsensusConfig, DelegateEntry, LoggingConfig, NodeConfig, RpcConfig, StorageBackend,
    StorageConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use genesis::{GenesisAccount, GenesisConfig};
