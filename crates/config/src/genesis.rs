//! Genesis balances, seeded into the store on first start.

use delcore_types::Address;
use serde::{Deserialize, Serialize};

/// Balances written at first start, before any transaction executes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenesisConfig {
    /// Accounts to fund
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

/// One funded genesis account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Account address
    pub address: Address,
    /// Initial balance in tokens
    pub balance: u64,
}
