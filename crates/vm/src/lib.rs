//! # delcore VM
//!
//! The smart-contract execution boundary.
//!
//! The embedded engine itself is a collaborator; the core only depends on
//! the [`Vm`] trait and on the [`abi`] codec used to decode contract return
//! buffers into typed receipt values.
//!
//! - [`Vm`] / [`VmResult`] - deploy and execute entry points
//! - [`abi`] - interface-descriptor parsing, return-value unpacking, and
//!   call-parameter conversion
//! - [`MockVm`] - scriptable engine for tests
//! - [`NullVm`] - stand-in when no engine is embedded

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod abi;

mod mock;

pub use mock::{MockVm, NullVm};

use delcore_types::{Address, Transaction};
use thiserror::Error;

/// Errors surfaced by the VM boundary.
#[derive(Error, Debug)]
pub enum VmError {
    /// No engine is embedded in this node.
    #[error("vm unavailable")]
    Unavailable,

    /// Contract deployment failed.
    #[error("deploy failed: {0}")]
    Deploy(String),

    /// Contract method execution failed.
    #[error("execution failed: {0}")]
    Execution(String),

    /// The interface descriptor or return buffer could not be decoded.
    #[error(transparent)]
    Abi(#[from] abi::AbiError),
}

/// Result type for VM operations.
pub type VmResult<T> = std::result::Result<T, VmError>;

/// Outcome of a deploy or execute call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VmOutcome {
    /// Address of the deployed or invoked contract
    pub contract_address: Address,
    /// Hex-encoded JSON interface descriptor of the contract
    pub abi: String,
    /// The method that was executed, empty for plain deployment
    pub method: String,
    /// Raw return buffer, ABI-encoded against the method's outputs
    pub result_bytes: Vec<u8>,
    /// Engine-reported execution error, if any
    pub error: Option<String>,
}

/// The embedded smart-contract engine, opaque to the core.
pub trait Vm: Send + Sync {
    /// Deploys the contract artifact carried by `tx`.
    fn deploy(&self, tx: &Transaction) -> VmResult<VmOutcome>;

    /// Invokes `tx.method` on the contract deployed at `tx.to`.
    fn execute(&self, tx: &Transaction) -> VmResult<VmOutcome>;
}
