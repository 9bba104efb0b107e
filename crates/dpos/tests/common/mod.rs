//! Shared fixtures for the dpos test suite.

#![allow(dead_code)]

use async_trait::async_trait;
use delcore_cache::ChainCache;
use delcore_core::{
    Clock, KeypairSigner, ManualClock, PeerClient, PeerError, StaticDirectory, Store, StoreError,
    StoreResult, StoreTxn, TopicRegistry,
};
use delcore_crypto::PrivateKey;
use delcore_dpos::{CoreContext, DposService, Policy};
use delcore_storage::MemStore;
use delcore_types::{Address, Gossip, NodeInfo, NodeType, Rumor, Transaction, H256};
use delcore_vm::{MockVm, Vm};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Deterministic delegate keypairs.
pub fn delegate_keys(count: usize) -> Vec<PrivateKey> {
    (0..count)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[31] = (i + 1) as u8;
            PrivateKey::from_bytes(&bytes).unwrap()
        })
        .collect()
}

/// Delegate descriptors matching [`delegate_keys`].
pub fn delegate_nodes(keys: &[PrivateKey]) -> Vec<NodeInfo> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| NodeInfo::delegate(key.address(), format!("http://delegate-{i}:1975")))
        .collect()
}

/// Peer client that always fails; for tests that never leave the node.
pub struct UnreachablePeers;

#[async_trait]
impl PeerClient for UnreachablePeers {
    async fn peer_gossip(&self, node: &NodeInfo, _gossip: &Gossip) -> Result<Gossip, PeerError> {
        Err(PeerError::Transport(format!("{} unreachable", node.endpoint)))
    }
}

/// Routes peer gossip calls to in-process services by delegate address.
#[derive(Default)]
pub struct LoopbackPeers {
    services: Mutex<HashMap<Address, Arc<DposService>>>,
}

impl LoopbackPeers {
    pub fn register(&self, address: Address, service: Arc<DposService>) {
        self.services.lock().insert(address, service);
    }
}

#[async_trait]
impl PeerClient for LoopbackPeers {
    async fn peer_gossip(&self, node: &NodeInfo, gossip: &Gossip) -> Result<Gossip, PeerError> {
        let service = self
            .services
            .lock()
            .get(&node.address)
            .cloned()
            .ok_or_else(|| PeerError::Transport(format!("{} unreachable", node.endpoint)))?;
        service
            .synchronize_gossip(gossip)
            .map_err(|e| PeerError::Rejected(e.to_string()))
    }
}

/// A store whose next writable commit loses the optimistic race.
pub struct ConflictingStore {
    inner: MemStore,
    armed: AtomicBool,
}

impl ConflictingStore {
    pub fn new(inner: MemStore) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl Store for ConflictingStore {
    fn begin(&self, writable: bool) -> Box<dyn StoreTxn + '_> {
        Box::new(ConflictingTxn {
            inner: self.inner.begin(writable),
            writable,
            armed: &self.armed,
        })
    }
}

struct ConflictingTxn<'a> {
    inner: Box<dyn StoreTxn + 'a>,
    writable: bool,
    armed: &'a AtomicBool,
}

impl StoreTxn for ConflictingTxn<'_> {
    fn get(&mut self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn scan_prefix(
        &mut self,
        prefix: &[u8],
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.inner.scan_prefix(prefix, offset, limit)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.writable && self.armed.swap(false, Ordering::SeqCst) {
            self.inner.discard();
            return Err(StoreError::Conflict);
        }
        self.inner.commit()
    }

    fn discard(self: Box<Self>) {
        self.inner.discard();
    }
}

/// One node's worth of wiring for tests.
pub struct Harness {
    pub service: Arc<DposService>,
    pub store: MemStore,
    pub cache: Arc<ChainCache>,
    pub clock: Arc<ManualClock>,
    pub keys: Vec<PrivateKey>,
    pub nodes: Vec<NodeInfo>,
    pub vm: Arc<MockVm>,
}

/// Default test policy: tight enough that tests never wait on real time.
pub fn test_policy() -> Policy {
    Policy {
        tx_receive_timeout_ms: 3_000,
        gossip_timeout_ms: 200,
        max_gossip_attempts: 3,
    }
}

/// Builds a delegate service over `delegate_count` members; this node is
/// delegate zero, pinned to a manual clock at t = 1_000_000 ms.
pub fn harness(delegate_count: usize) -> Harness {
    harness_with(delegate_count, true, MemStore::new(), None)
}

/// Builds a harness with explicit role, store, and peer client.
pub fn harness_with(
    delegate_count: usize,
    is_delegate: bool,
    store: MemStore,
    peers: Option<Arc<dyn PeerClient>>,
) -> Harness {
    let keys = delegate_keys(delegate_count);
    let nodes = delegate_nodes(&keys);
    let cache = Arc::new(ChainCache::new(Duration::from_secs(120)));
    let clock = Arc::new(ManualClock::at(1_000_000));
    let vm = Arc::new(MockVm::new());

    let this = if is_delegate {
        nodes[0].clone()
    } else {
        NodeInfo {
            address: keys[0].address(),
            node_type: NodeType::Other,
            endpoint: "http://observer:1975".into(),
        }
    };

    let ctx = CoreContext {
        store: Arc::new(store.clone()),
        cache: Arc::clone(&cache),
        directory: Arc::new(StaticDirectory::new(this, nodes.clone())),
        vm: Arc::clone(&vm) as Arc<dyn Vm>,
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
        signer: Arc::new(KeypairSigner::new(keys[0].clone())),
        peers: peers.unwrap_or_else(|| Arc::new(UnreachablePeers)),
        publisher: Arc::new(TopicRegistry::new(["receipts"])),
        policy: test_policy(),
    };

    Harness {
        service: DposService::new(ctx),
        store,
        cache,
        clock,
        keys,
        nodes,
        vm,
    }
}

/// Like [`harness`], but commits go through a [`ConflictingStore`] so a
/// test can make the next writable commit lose the race.
pub fn conflict_harness(delegate_count: usize) -> (Harness, Arc<ConflictingStore>) {
    let keys = delegate_keys(delegate_count);
    let nodes = delegate_nodes(&keys);
    let cache = Arc::new(ChainCache::new(Duration::from_secs(120)));
    let clock = Arc::new(ManualClock::at(1_000_000));
    let vm = Arc::new(MockVm::new());
    let store = MemStore::new();
    let conflicting = Arc::new(ConflictingStore::new(store.clone()));

    let ctx = CoreContext {
        store: Arc::clone(&conflicting) as Arc<dyn Store>,
        cache: Arc::clone(&cache),
        directory: Arc::new(StaticDirectory::new(nodes[0].clone(), nodes.clone())),
        vm: Arc::clone(&vm) as Arc<dyn Vm>,
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
        signer: Arc::new(KeypairSigner::new(keys[0].clone())),
        peers: Arc::new(UnreachablePeers),
        publisher: Arc::new(TopicRegistry::new(["receipts"])),
        policy: test_policy(),
    };

    let harness = Harness {
        service: DposService::new(ctx),
        store,
        cache,
        clock,
        keys,
        nodes,
        vm,
    };
    (harness, conflicting)
}

impl Harness {
    /// The manual clock's current time.
    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// A transfer from delegate zero's account, signed and timestamped now.
    pub fn signed_transfer(&self, to: Address, value: u64) -> Transaction {
        Transaction::transfer(self.keys[0].address(), to, value, self.now())
            .finalize(self.keys[0].signing_key())
            .unwrap()
    }

    /// A rumor from delegate `index` for `tx_hash` at `time`.
    pub fn rumor(&self, index: usize, tx_hash: H256, time: u64) -> Rumor {
        Rumor::signed(
            self.keys[index].signing_key(),
            self.keys[index].address(),
            tx_hash,
            time,
        )
        .unwrap()
    }

    /// A gossip carrying `tx` with rumors from the first `rumor_count`
    /// delegates, all stamped at the transaction's own time.
    pub fn gossip_with_rumors(&self, tx: &Transaction, rumor_count: usize) -> Gossip {
        let mut gossip = Gossip::new(tx.clone());
        for i in 0..rumor_count {
            gossip.add_rumor(self.rumor(i, tx.hash, tx.time));
        }
        gossip
    }
}
