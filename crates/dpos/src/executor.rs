//! The execution worker: deterministic state mutation under a per-hash
//! lock, committed in a single store transaction.

use crate::service::DposService;
use delcore_core::{StoreError, StoreResult, StoreTxn};
use delcore_storage::model;
use delcore_types::{Account, Address, Gossip, Receipt, Status, TxType};
use delcore_vm::abi::{Abi, AbiValue};
use delcore_vm::VmOutcome;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Runs the worker loop: one execution attempt per timeout signal.
pub(crate) async fn run_execution_worker(
    service: Arc<DposService>,
    mut rx: mpsc::UnboundedReceiver<()>,
) {
    let mut shutdown = service.shutdown_rx.clone();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            signal = rx.recv() => match signal {
                Some(()) => service.run_pending_execution(),
                None => break,
            }
        }
    }
    debug!("execution worker stopped");
}

/// Stamps a failure status onto the receipt and caches it.
fn fail(service: &DposService, receipt: &mut Receipt, status: Status, detail: String) {
    let now = service.ctx.clock.now_ms();
    receipt.set_status_with_detail(status, detail, now);
    service.ctx.cache.put_receipt(receipt.clone());
}

/// Loads an account, fabricating a fresh zero-balance one when the key is
/// absent. Key-not-found is "new account", never an error.
fn load_or_create(txn: &mut dyn StoreTxn, address: &Address, now_ms: u64) -> StoreResult<Account> {
    match model::get_account(txn, address) {
        Ok(account) => Ok(account),
        Err(StoreError::NotFound) => Ok(Account::new(*address, now_ms)),
        Err(e) => Err(e),
    }
}

/// Executes one quorum-released gossip.
///
/// Holds the per-hash lock from the idempotence check through commit. On
/// success all of `{from, to, tx, receipt(Ok), gossip}` become observable
/// atomically; on failure none of them do and the receipt carries the
/// terminal status in cache. A commit conflict means another delegate's
/// execution won the race and is accepted silently.
pub(crate) fn execute(service: &DposService, gossip: &Gossip, receipt: &mut Receipt) {
    let ctx = &service.ctx;
    let policy = ctx.policy;
    let tx = &gossip.transaction;
    let hash = tx.hash;

    let _guard = service.locks.acquire(hash);
    let mut txn = ctx.store.begin(true);

    // Another attempt may have committed while we waited on the lock.
    match model::has_transaction(txn.as_mut(), &hash) {
        Ok(true) => {
            debug!(hash = %hash, "transaction already committed");
            txn.discard();
            return;
        }
        Ok(false) => {}
        Err(e) => {
            fail(service, receipt, Status::InternalError, e.to_string());
            txn.discard();
            return;
        }
    }

    let now = ctx.clock.now_ms();

    let mut from_account = match load_or_create(txn.as_mut(), &tx.from, now) {
        Ok(account) => account,
        Err(e) => {
            fail(service, receipt, Status::InternalError, e.to_string());
            txn.discard();
            return;
        }
    };
    // A transfer back to the sender nets to zero; track one copy only.
    let mut to_account = match tx.to {
        Some(to) if to != tx.from => match load_or_create(txn.as_mut(), &to, now) {
            Ok(account) => Some(account),
            Err(e) => {
                fail(service, receipt, Status::InternalError, e.to_string());
                txn.discard();
                return;
            }
        },
        _ => None,
    };

    // Staleness gate: the origin delegate's rumor must have followed the
    // transaction within the receive window.
    if gossip.first_rumor_time().saturating_sub(tx.time) >= policy.tx_receive_timeout_ms {
        warn!(hash = %hash, "transaction exceeded the receive window before execution");
        fail(
            service,
            receipt,
            Status::TransactionTimeOut,
            Status::TransactionTimeOut.human_readable().to_string(),
        );
        txn.discard();
        return;
    }

    match tx.tx_type {
        TxType::TransferTokens => {
            if tx.to.is_none() {
                fail(
                    service,
                    receipt,
                    Status::InvalidTransaction,
                    "transfer without recipient".to_string(),
                );
                txn.discard();
                return;
            }
            if !from_account.can_debit(tx.value) {
                warn!(hash = %hash, value = tx.value, "insufficient tokens");
                fail(
                    service,
                    receipt,
                    Status::InsufficientTokens,
                    Status::InsufficientTokens.human_readable().to_string(),
                );
                txn.discard();
                return;
            }
            if let Some(to_account) = to_account.as_mut() {
                from_account.debit(tx.value);
                to_account.credit(tx.value);
            }
            info!(hash = %hash, rumors = gossip.rumors.len(), "transferred tokens");
        }
        TxType::DeploySmartContract => {
            let outcome = match ctx.vm.deploy(tx) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(hash = %hash, error = %e, "contract deployment failed");
                    fail(service, receipt, Status::InternalError, e.to_string());
                    txn.discard();
                    return;
                }
            };
            if let Err(e) = process_vm_outcome(&outcome, receipt) {
                error!(hash = %hash, error = %e, "deployment result processing failed");
                fail(service, receipt, Status::InternalError, e.to_string());
                txn.discard();
                return;
            }
            let contract = Account::contract(outcome.contract_address, hash, now);
            if let Err(e) = model::put_account(txn.as_mut(), &contract) {
                fail(service, receipt, Status::InternalError, e.to_string());
                txn.discard();
                return;
            }
            receipt.contract_address = Some(outcome.contract_address);
            info!(hash = %hash, contract = %outcome.contract_address, "deployed contract");
        }
        TxType::ExecuteSmartContract => {
            let Some(to) = tx.to else {
                fail(
                    service,
                    receipt,
                    Status::InvalidTransaction,
                    "contract call without target".to_string(),
                );
                txn.discard();
                return;
            };
            // The deploying transaction carries the contract's interface.
            let contract_tx = match model::transaction_by_contract_address(txn.as_mut(), &to) {
                Ok(contract_tx) => contract_tx,
                Err(e) => {
                    error!(hash = %hash, contract = %to, error = %e, "unable to resolve contract");
                    fail(service, receipt, Status::InternalError, e.to_string());
                    txn.discard();
                    return;
                }
            };
            let abi = match Abi::from_hex(&contract_tx.abi) {
                Ok(abi) => abi,
                Err(e) => {
                    fail(service, receipt, Status::InternalError, e.to_string());
                    txn.discard();
                    return;
                }
            };
            let converted = match abi.convert_params(&tx.method, &tx.params) {
                Ok(values) => values,
                Err(e) => {
                    fail(service, receipt, Status::InternalError, e.to_string());
                    txn.discard();
                    return;
                }
            };
            let mut call = tx.clone();
            call.abi = contract_tx.abi.clone();
            call.params = converted.iter().map(AbiValue::to_json).collect();

            let outcome = match ctx.vm.execute(&call) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(hash = %hash, error = %e, "contract execution failed");
                    fail(service, receipt, Status::InternalError, e.to_string());
                    txn.discard();
                    return;
                }
            };
            if let Err(e) = process_vm_outcome(&outcome, receipt) {
                fail(service, receipt, Status::InternalError, e.to_string());
                txn.discard();
                return;
            }
            receipt.contract_address = Some(to);
            info!(hash = %hash, contract = %to, "executed contract");
        }
    }

    // Persist in order: from, to, tx, receipt(Ok), gossip.
    from_account.updated = now;
    if let Err(e) = model::put_account(txn.as_mut(), &from_account) {
        fail(service, receipt, Status::InternalError, e.to_string());
        txn.discard();
        return;
    }
    if let Some(mut to_account) = to_account {
        to_account.updated = now;
        if let Err(e) = model::put_account(txn.as_mut(), &to_account) {
            fail(service, receipt, Status::InternalError, e.to_string());
            txn.discard();
            return;
        }
    }
    if let Err(e) = model::put_transaction(txn.as_mut(), tx) {
        fail(service, receipt, Status::InternalError, e.to_string());
        txn.discard();
        return;
    }
    receipt.set_status(Status::Ok, now);
    if let Err(e) = model::put_receipt(txn.as_mut(), receipt) {
        fail(service, receipt, Status::InternalError, e.to_string());
        txn.discard();
        return;
    }
    if let Err(e) = model::put_gossip(txn.as_mut(), gossip) {
        fail(service, receipt, Status::InternalError, e.to_string());
        txn.discard();
        return;
    }

    match txn.commit() {
        Ok(()) => {}
        Err(StoreError::Conflict) => {
            // Another delegate's execution committed this hash first.
            debug!(hash = %hash, "commit conflict, accepting the other writer");
        }
        Err(e) => {
            error!(hash = %hash, error = %e, "commit failed");
            fail(service, receipt, Status::InternalError, e.to_string());
            return;
        }
    }

    // Both the commit and the silently accepted conflict leave an Ok
    // receipt observable in cache; the gossip's cache life ends here.
    service.ctx.cache.put_receipt(receipt.clone());
    service.ctx.cache.evict_transaction(&hash);
    service.clear_gossip_attempts(&hash);

    if let Ok(payload) = serde_json::to_value(&receipt) {
        let _ = service.ctx.publisher.publish("receipts", &payload);
    }
}

/// Folds a VM outcome into the receipt.
///
/// An engine-reported error aborts; otherwise the returned descriptor is
/// decoded and the result buffer unpacked against the executed method's
/// outputs. An absent method or empty buffer leaves `contract_result`
/// unset.
fn process_vm_outcome(
    outcome: &VmOutcome,
    receipt: &mut Receipt,
) -> Result<(), delcore_vm::VmError> {
    if let Some(error) = &outcome.error {
        return Err(delcore_vm::VmError::Execution(error.clone()));
    }
    if outcome.abi.trim().is_empty() {
        return Ok(());
    }
    let abi = Abi::from_hex(&outcome.abi)?;
    if let Some(values) = abi.unpack_values(&outcome.method, &outcome.result_bytes)? {
        receipt.contract_result = Some(values.iter().map(AbiValue::to_json).collect());
    }
    Ok(())
}
