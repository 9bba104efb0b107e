//! Engine stand-ins: a scriptable mock and a disabled engine.

use crate::{Vm, VmError, VmOutcome, VmResult};
use delcore_types::{Address, Transaction};
use parking_lot::Mutex;

enum Scripted {
    Outcome(VmOutcome),
    Error(String),
}

/// A scriptable engine for tests.
///
/// By default both entry points succeed: deploy derives the contract
/// address from the transaction hash and echoes the transaction's ABI;
/// execute returns an empty result buffer. Individual outcomes or errors
/// can be scripted per entry point.
#[derive(Default)]
pub struct MockVm {
    deploy: Mutex<Option<Scripted>>,
    execute: Mutex<Option<Scripted>>,
}

impl MockVm {
    /// Creates a mock with default outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts deploy outcomes until overridden.
    pub fn script_deploy_outcome(&self, outcome: VmOutcome) {
        *self.deploy.lock() = Some(Scripted::Outcome(outcome));
    }

    /// Scripts deploy to fail.
    pub fn script_deploy_error(&self, message: impl Into<String>) {
        *self.deploy.lock() = Some(Scripted::Error(message.into()));
    }

    /// Scripts execute outcomes until overridden.
    pub fn script_execute_outcome(&self, outcome: VmOutcome) {
        *self.execute.lock() = Some(Scripted::Outcome(outcome));
    }

    /// Scripts execute to fail.
    pub fn script_execute_error(&self, message: impl Into<String>) {
        *self.execute.lock() = Some(Scripted::Error(message.into()));
    }

    /// The contract address the default deploy outcome derives from a
    /// transaction: the first 20 bytes of its hash.
    pub fn derived_contract_address(tx: &Transaction) -> Address {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&tx.hash.as_bytes()[..20]);
        Address::from(bytes)
    }
}

impl Vm for MockVm {
    fn deploy(&self, tx: &Transaction) -> VmResult<VmOutcome> {
        match self.deploy.lock().as_ref() {
            Some(Scripted::Outcome(outcome)) => Ok(outcome.clone()),
            Some(Scripted::Error(message)) => Err(VmError::Deploy(message.clone())),
            None => Ok(VmOutcome {
                contract_address: Self::derived_contract_address(tx),
                abi: tx.abi.clone(),
                method: String::new(),
                result_bytes: Vec::new(),
                error: None,
            }),
        }
    }

    fn execute(&self, tx: &Transaction) -> VmResult<VmOutcome> {
        match self.execute.lock().as_ref() {
            Some(Scripted::Outcome(outcome)) => Ok(outcome.clone()),
            Some(Scripted::Error(message)) => Err(VmError::Execution(message.clone())),
            None => Ok(VmOutcome {
                contract_address: tx.to.unwrap_or_default(),
                abi: tx.abi.clone(),
                method: tx.method.clone(),
                result_bytes: Vec::new(),
                error: None,
            }),
        }
    }
}

/// The engine used when no VM is embedded: every call fails with
/// [`VmError::Unavailable`], which the execution worker turns into an
/// `InternalError` receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVm;

impl Vm for NullVm {
    fn deploy(&self, _tx: &Transaction) -> VmResult<VmOutcome> {
        Err(VmError::Unavailable)
    }

    fn execute(&self, _tx: &Transaction) -> VmResult<VmOutcome> {
        Err(VmError::Unavailable)
    }
}
