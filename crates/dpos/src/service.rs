//! The DPoS service façade: ingress, gossip merge, queries, and worker
//! lifecycle.

use crate::context::CoreContext;
use crate::executor;
use crate::gossip;
use crate::locks::HashLocks;
use crate::queue::GossipQueue;
use crate::{CoreError, Result};
use delcore_storage::model;
use delcore_types::{
    Address, ApiResponse, Gossip, NodeInfo, Receipt, Rumor, Status, Transaction, H256,
};
use delcore_core::{StoreError, SubscriptionRequest};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-hash gossip retry accounting.
#[derive(Default)]
pub(crate) struct AttemptState {
    /// Channel re-submissions consumed so far
    pub(crate) resubmissions: u32,
    /// Peers already offered this gossip, to avoid resampling
    pub(crate) contacted: HashSet<Address>,
}

/// Worker-shared mutable state: one PRNG seeded at construction and the
/// per-hash retry ledger.
pub(crate) struct SyncState {
    pub(crate) rng: StdRng,
    pub(crate) attempts: HashMap<H256, AttemptState>,
}

/// The transaction admission and execution service.
///
/// One instance runs per node. Ingress and queries are called from any
/// task; the two worker loops started by [`DposService::start`] are the
/// only consumers of the gossip and timeout channels.
pub struct DposService {
    pub(crate) ctx: CoreContext,
    pub(crate) queue: GossipQueue,
    pub(crate) locks: HashLocks,
    pub(crate) gossip_tx: mpsc::UnboundedSender<Gossip>,
    pub(crate) timeout_tx: mpsc::UnboundedSender<()>,
    pub(crate) sync_state: Mutex<SyncState>,
    gossip_rx: Mutex<Option<mpsc::UnboundedReceiver<Gossip>>>,
    timeout_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
    shutdown_tx: watch::Sender<bool>,
    pub(crate) shutdown_rx: watch::Receiver<bool>,
}

impl DposService {
    /// Creates the service and its worker channels.
    pub fn new(ctx: CoreContext) -> Arc<Self> {
        let (gossip_tx, gossip_rx) = mpsc::unbounded_channel();
        let (timeout_tx, timeout_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Arc::new(Self {
            ctx,
            queue: GossipQueue::new(),
            locks: HashLocks::new(),
            gossip_tx,
            timeout_tx,
            sync_state: Mutex::new(SyncState {
                rng: StdRng::from_entropy(),
                attempts: HashMap::new(),
            }),
            gossip_rx: Mutex::new(Some(gossip_rx)),
            timeout_rx: Mutex::new(Some(timeout_rx)),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Starts the gossip and execution workers.
    ///
    /// Panics if called twice; the receivers are handed out once.
    pub fn start(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let gossip_rx = self
            .gossip_rx
            .lock()
            .take()
            .expect("gossip worker already started");
        let timeout_rx = self
            .timeout_rx
            .lock()
            .take()
            .expect("execution worker already started");

        let gossip_handle = tokio::spawn(gossip::run_gossip_worker(Arc::clone(self), gossip_rx));
        let exec_handle =
            tokio::spawn(executor::run_execution_worker(Arc::clone(self), timeout_rx));
        info!("dpos workers started");
        (gossip_handle, exec_handle)
    }

    /// Signals both workers to drain and stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// This node's signing address.
    pub fn address(&self) -> Address {
        self.ctx.signer.address()
    }

    /// Whether this node is a member of the delegate set.
    pub fn is_delegate(&self) -> bool {
        self.ctx.directory.this_node().is_delegate()
    }

    /// The execution queue, exposed for observability.
    pub fn queue(&self) -> &GossipQueue {
        &self.queue
    }

    // ========================================================================
    // Ingress
    // ========================================================================

    /// Admits a client-submitted transaction.
    ///
    /// The returned receipt's status encodes the outcome: `Pending` when
    /// the transaction entered the gossip pipeline, a terminal status
    /// otherwise. Preconditions run in order: signature/hash verification,
    /// the receive window, the persisted-duplicate check, then the
    /// in-flight check.
    pub fn submit(&self, tx: Transaction) -> Receipt {
        let now = self.ctx.clock.now_ms();

        if !self.is_delegate() {
            return Receipt::with_status(tx.hash, Status::NotDelegate, now);
        }

        if let Err(e) = tx.verify() {
            info!(hash = %tx.hash, error = %e, "invalid transaction");
            let mut receipt = Receipt::with_status(tx.hash, Status::InvalidTransaction, now);
            receipt.human_readable_status = e.to_string();
            return receipt;
        }

        let elapsed = now.saturating_sub(tx.time);
        if elapsed > self.ctx.policy.tx_receive_timeout_ms {
            warn!(hash = %tx.hash, elapsed, "transaction arrived outside the receive window");
            return Receipt::with_status(tx.hash, Status::TransactionTimeOut, now);
        }

        let mut txn = self.ctx.store.begin(false);
        let persisted = model::has_transaction(txn.as_mut(), &tx.hash);
        txn.discard();
        match persisted {
            Ok(true) => {
                info!(hash = %tx.hash, "duplicate transaction");
                return Receipt::with_status(tx.hash, Status::DuplicateTransaction, now);
            }
            Ok(false) => {}
            Err(e) => {
                let mut receipt = Receipt::with_status(tx.hash, Status::InternalError, now);
                receipt.human_readable_status = e.to_string();
                return receipt;
            }
        }

        if self.ctx.cache.transactions.contains(&tx.hash) {
            info!(hash = %tx.hash, "already processing transaction");
            return Receipt::with_status(tx.hash, Status::AlreadyProcessingTransaction, now);
        }

        let receipt = Receipt::new(tx.hash, now);
        self.ctx.cache.put_receipt(receipt.clone());

        let mut gossip = Gossip::new(tx.clone());
        match self.own_rumor(tx.hash, now) {
            Ok(rumor) => {
                gossip.add_rumor(rumor);
            }
            Err(e) => {
                let mut receipt = Receipt::with_status(tx.hash, Status::InternalError, now);
                receipt.human_readable_status = e.to_string();
                self.ctx.cache.put_receipt(receipt.clone());
                return receipt;
            }
        }
        self.ctx.cache.put_gossip(gossip.clone());
        self.ctx.cache.put_transaction(tx);

        let _ = self.gossip_tx.send(gossip);
        receipt
    }

    // ========================================================================
    // Gossip synchronization
    // ========================================================================

    /// Merges a peer-offered gossip with the cached state for the same
    /// transaction and replaces the cache entry atomically.
    ///
    /// Unverifiable rumors are dropped, never propagated. This node's own
    /// rumor is added when absent, but only once the embedded transaction
    /// itself verifies.
    pub fn synchronize_gossip(&self, incoming: &Gossip) -> Result<Gossip> {
        let now = self.ctx.clock.now_ms();
        let hash = incoming.transaction.hash;

        if self.ctx.cache.receipts.get(&hash).is_none() {
            self.ctx.cache.put_receipt(Receipt::new(hash, now));
        }

        let mut merged = match self.ctx.cache.gossips.get(&hash) {
            Some(ours) => {
                let mut merged = ours;
                for rumor in &incoming.rumors {
                    if rumor.tx_hash == hash
                        && !merged.contains_rumor(&rumor.address)
                        && rumor.verify().is_ok()
                    {
                        merged.add_rumor(rumor.clone());
                    }
                }
                merged
            }
            None => incoming.sanitized(),
        };

        if !merged.contains_rumor(&self.address()) {
            incoming
                .transaction
                .verify()
                .map_err(|e| CoreError::Validation(e.to_string()))?;
            merged.add_rumor(self.own_rumor(hash, now)?);
        }

        self.ctx.cache.put_gossip(merged.clone());
        Ok(merged)
    }

    /// Feeds a gossip into the worker channel.
    pub fn enqueue_gossip(&self, gossip: Gossip) {
        let _ = self.gossip_tx.send(gossip);
    }

    /// Signs this node's rumor for `tx_hash`.
    pub(crate) fn own_rumor(&self, tx_hash: H256, now_ms: u64) -> Result<Rumor> {
        let address = self.address();
        let hash = Rumor::digest(&address, &tx_hash, now_ms);
        let signature = self
            .ctx
            .signer
            .sign(&hash)
            .map_err(|e| CoreError::Signer(e.to_string()))?;
        Ok(Rumor {
            hash,
            address,
            tx_hash,
            time: now_ms,
            signature,
        })
    }

    // ========================================================================
    // Gossip worker support
    // ========================================================================

    /// Picks a uniformly random delegate that has not rumored for this
    /// gossip, is not this node, and was not already offered this gossip.
    ///
    /// When every un-rumored delegate has been attempted, the attempted set
    /// resets: the rumor-set snapshot has moved on and resampling is fair
    /// again.
    pub(crate) fn pick_gossip_peer(
        &self,
        gossip: &Gossip,
        delegates: &[NodeInfo],
    ) -> Option<NodeInfo> {
        use rand::Rng;

        let own = self.address();
        let hash = gossip.transaction.hash;
        let mut state = self.sync_state.lock();

        let unrumored: Vec<&NodeInfo> = delegates
            .iter()
            .filter(|d| d.address != own && !gossip.contains_rumor(&d.address))
            .collect();
        if unrumored.is_empty() {
            return None;
        }

        let attempts = state.attempts.entry(hash).or_default();
        let mut fresh: Vec<&NodeInfo> = unrumored
            .iter()
            .copied()
            .filter(|d| !attempts.contacted.contains(&d.address))
            .collect();
        if fresh.is_empty() {
            attempts.contacted.clear();
            fresh = unrumored;
        }

        let index = state.rng.gen_range(0..fresh.len());
        Some(fresh[index].clone())
    }

    /// Records that `peer` was offered the gossip for `hash`.
    pub(crate) fn mark_peer_attempted(&self, hash: H256, peer: Address) {
        self.sync_state
            .lock()
            .attempts
            .entry(hash)
            .or_default()
            .contacted
            .insert(peer);
    }

    /// Re-submits a gossip to the worker channel, bounded per hash.
    ///
    /// Returns false when the bound is exhausted and the gossip was
    /// dropped instead.
    pub(crate) fn requeue_gossip(&self, gossip: Gossip, reason: &str) -> bool {
        let hash = gossip.transaction.hash;
        let give_up = {
            let mut state = self.sync_state.lock();
            let attempts = state.attempts.entry(hash).or_default();
            attempts.resubmissions += 1;
            attempts.resubmissions > self.ctx.policy.max_gossip_attempts
        };
        if give_up {
            warn!(hash = %hash, reason, "gossip retry budget exhausted, dropping");
            self.clear_gossip_attempts(&hash);
            return false;
        }
        debug!(hash = %hash, reason, "re-submitting gossip");
        let _ = self.gossip_tx.send(gossip);
        true
    }

    /// Drops the retry ledger entry for `hash`.
    pub(crate) fn clear_gossip_attempts(&self, hash: &H256) {
        self.sync_state.lock().attempts.remove(hash);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn delegate_gate(&self) -> Option<ApiResponse> {
        if self.is_delegate() {
            None
        } else {
            Some(ApiResponse::with_status(Status::NotDelegate))
        }
    }

    /// Looks up a transaction, cache first, then the store.
    pub fn get_transaction(&self, hash: &H256) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        if let Some(tx) = self.ctx.cache.transactions.get(hash) {
            return ApiResponse::ok_with_data(&tx);
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::get_transaction(txn.as_mut(), hash);
        txn.discard();
        match result {
            Ok(tx) => ApiResponse::ok_with_data(&tx),
            Err(StoreError::NotFound) => ApiResponse::with_detail(
                Status::NotFound,
                format!("unable to find transaction [hash={hash}]"),
            ),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Looks up a receipt, cache first, then the store.
    pub fn get_receipt(&self, hash: &H256) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        if let Some(receipt) = self.ctx.cache.receipts.get(hash) {
            return ApiResponse::ok_with_data(&receipt);
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::get_receipt(txn.as_mut(), hash);
        txn.discard();
        match result {
            Ok(receipt) => ApiResponse::ok_with_data(&receipt),
            Err(StoreError::NotFound) => ApiResponse::with_detail(
                Status::NotFound,
                format!("unable to find receipt [hash={hash}]"),
            ),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Looks up an account in the store.
    pub fn get_account(&self, address: &Address) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::get_account(txn.as_mut(), address);
        txn.discard();
        match result {
            Ok(account) => ApiResponse::ok_with_data(&account),
            Err(StoreError::NotFound) => ApiResponse::with_status(Status::NotFound),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Looks up a gossip, cache first, then the store.
    pub fn get_gossip(&self, hash: &H256) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        if let Some(gossip) = self.ctx.cache.gossips.get(hash) {
            return ApiResponse::ok_with_data(&gossip);
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::get_gossip(txn.as_mut(), hash);
        txn.discard();
        match result {
            Ok(gossip) => ApiResponse::ok_with_data(&gossip),
            Err(StoreError::NotFound) => ApiResponse::with_status(Status::NotFound),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// One page of persisted transactions. Pages are 1-based.
    pub fn get_transactions(&self, page: usize) -> ApiResponse {
        self.paged(page, model::transactions_page)
    }

    /// One page of persisted accounts. Pages are 1-based.
    pub fn get_accounts(&self, page: usize) -> ApiResponse {
        self.paged(page, model::accounts_page)
    }

    /// One page of persisted gossips. Pages are 1-based.
    pub fn get_gossips(&self, page: usize) -> ApiResponse {
        self.paged(page, model::gossips_page)
    }

    fn paged<T: serde::Serialize>(
        &self,
        page: usize,
        loader: impl Fn(&mut dyn delcore_core::StoreTxn, usize) -> delcore_core::StoreResult<Vec<T>>,
    ) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        let mut txn = self.ctx.store.begin(false);
        let result = loader(txn.as_mut(), page);
        txn.discard();
        match result {
            Ok(rows) => ApiResponse::ok_with_data(&rows),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Every persisted transaction sent by `from`.
    pub fn get_transactions_by_from(&self, from: &Address) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::transactions_by_from(txn.as_mut(), from);
        txn.discard();
        match result {
            Ok(rows) => ApiResponse::ok_with_data(&rows),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// Every persisted transaction received by `to`.
    pub fn get_transactions_by_to(&self, to: &Address) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        let mut txn = self.ctx.store.begin(false);
        let result = model::transactions_by_to(txn.as_mut(), to);
        txn.discard();
        match result {
            Ok(rows) => ApiResponse::ok_with_data(&rows),
            Err(e) => ApiResponse::with_detail(Status::InternalError, e.to_string()),
        }
    }

    /// The current delegate set.
    pub fn delegate_nodes(&self) -> ApiResponse {
        ApiResponse::ok_with_data(&self.ctx.directory.delegates())
    }

    /// A snapshot of the execution queue.
    pub fn dump_queue(&self) -> ApiResponse {
        ApiResponse::ok_with_data(&self.queue.dump())
    }

    /// Hands a subscription request to the pub/sub collaborator.
    pub fn create_subscription(&self, req: &SubscriptionRequest) -> ApiResponse {
        if let Some(resp) = self.delegate_gate() {
            return resp;
        }
        match self.ctx.publisher.create_subscription(req) {
            Ok(hash) => ApiResponse::ok_with_data(&json!({ "hash": hash })),
            Err(e) => ApiResponse::with_detail(Status::TopicNotFound, e.to_string()),
        }
    }

    /// Placeholder for recognized-but-unsupported endpoints.
    pub fn unavailable(&self) -> ApiResponse {
        ApiResponse::with_status(Status::UnavailableFeature)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Pops at most one gossip off the queue and executes it.
    ///
    /// Called by the execution worker on each timeout signal; exposed so
    /// tests can drive execution deterministically.
    pub fn run_pending_execution(&self) {
        if !self.queue.has_available() {
            return;
        }
        let Some(gossip) = self.queue.pop() else {
            return;
        };
        let hash = gossip.transaction.hash;
        let now = self.ctx.clock.now_ms();

        let Some(mut receipt) = self.ctx.cache.receipts.get(&hash) else {
            tracing::error!(hash = %hash, "receipt not found for released gossip");
            self.ctx
                .cache
                .put_receipt(Receipt::with_status(hash, Status::ReceiptNotFound, now));
            return;
        };

        executor::execute(self, &gossip, &mut receipt);
    }
}
