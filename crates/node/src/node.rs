//! Node assembly and lifecycle.

use alloy_primitives::U256;
use anyhow::{Context, Result};
use delcore_cache::ChainCache;
use delcore_config::{Config, StorageBackend};
use delcore_core::{
    KeypairSigner, Signer, StaticDirectory, Store, SystemClock, TopicRegistry,
};
use delcore_crypto::PrivateKey;
use delcore_dpos::{CoreContext, DposService, Policy};
use delcore_rpc::{serve, HttpPeerClient, RpcServerConfig, ServerHandle};
use delcore_storage::{model, MemStore, RocksStore};
use delcore_types::{Account, NodeInfo, NodeType};
use delcore_vm::NullVm;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Topics available to subscribers.
const TOPICS: [&str; 1] = ["receipts"];

/// A fully wired delcore node.
pub struct Node {
    config: Config,
    service: Arc<DposService>,
    store: Arc<dyn Store>,
    rpc_handle: Option<ServerHandle>,
    rpc_addr: Option<SocketAddr>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl Node {
    /// Wires every component from configuration and seeds genesis
    /// balances. No worker or server runs until [`Node::start`].
    pub fn new(config: Config) -> Result<Self> {
        let key = PrivateKey::from_hex(&config.node.private_key)
            .context("node.private_key is not a valid secp256k1 key")?;
        let signer = Arc::new(KeypairSigner::new(key));

        let node_type = if config.node.is_delegate {
            NodeType::Delegate
        } else {
            NodeType::Other
        };
        let this_node = NodeInfo {
            address: signer.address(),
            node_type,
            endpoint: config.node.endpoint.clone(),
        };
        let members: Vec<NodeInfo> = config
            .delegates
            .iter()
            .map(|d| NodeInfo::delegate(d.address, d.endpoint.clone()))
            .collect();

        let store: Arc<dyn Store> = match config.storage.backend {
            StorageBackend::Memory => {
                warn!("memory store selected; state will not survive a restart");
                Arc::new(MemStore::new())
            }
            StorageBackend::Rocksdb => Arc::new(
                RocksStore::open(&config.storage.path)
                    .with_context(|| format!("opening store at {}", config.storage.path))?,
            ),
        };

        let policy = Policy {
            tx_receive_timeout_ms: config.consensus.tx_receive_timeout_ms,
            gossip_timeout_ms: config.consensus.gossip_timeout_ms,
            max_gossip_attempts: config.consensus.max_gossip_attempts,
        };

        let ctx = CoreContext {
            store: Arc::clone(&store),
            cache: Arc::new(ChainCache::new(Duration::from_secs(
                config.consensus.cache_ttl_secs,
            ))),
            directory: Arc::new(StaticDirectory::new(this_node, members)),
            vm: Arc::new(NullVm),
            clock: Arc::new(SystemClock),
            signer,
            peers: Arc::new(HttpPeerClient::default()),
            publisher: Arc::new(TopicRegistry::new(TOPICS)),
            policy,
        };

        let node = Self {
            service: DposService::new(ctx),
            store,
            config,
            rpc_handle: None,
            rpc_addr: None,
            worker_handles: Vec::new(),
        };
        node.seed_genesis()?;
        Ok(node)
    }

    /// Writes genesis balances for accounts not yet present. Already-funded
    /// accounts are left untouched, so restarts are no-ops.
    fn seed_genesis(&self) -> Result<()> {
        if self.config.genesis.accounts.is_empty() {
            return Ok(());
        }
        let mut txn = self.store.begin(true);
        let mut seeded = 0usize;
        let now = delcore_core::Clock::now_ms(&SystemClock);
        for genesis in &self.config.genesis.accounts {
            match model::get_account(txn.as_mut(), &genesis.address) {
                Ok(_) => continue,
                Err(delcore_core::StoreError::NotFound) => {}
                Err(e) => return Err(e).context("reading genesis account"),
            }
            let mut account = Account::new(genesis.address, now);
            account.balance = U256::from(genesis.balance);
            model::put_account(txn.as_mut(), &account).context("writing genesis account")?;
            seeded += 1;
        }
        if seeded > 0 {
            txn.commit().context("committing genesis accounts")?;
            info!(seeded, "genesis balances written");
        } else {
            txn.discard();
        }
        Ok(())
    }

    /// Starts the dpos workers and the RPC server.
    pub async fn start(&mut self) -> Result<()> {
        let (gossip, exec) = self.service.start();
        self.worker_handles.push(gossip);
        self.worker_handles.push(exec);

        let rpc_config = RpcServerConfig {
            listen: self
                .config
                .rpc
                .listen
                .parse()
                .with_context(|| format!("invalid rpc listen address {}", self.config.rpc.listen))?,
            max_connections: self.config.rpc.max_connections,
            ..Default::default()
        };
        let (handle, addr) = serve(rpc_config, Arc::clone(&self.service)).await?;
        self.rpc_handle = Some(handle);
        self.rpc_addr = Some(addr);

        info!(
            address = %self.service.address(),
            is_delegate = self.service.is_delegate(),
            rpc = %addr,
            "node started"
        );
        Ok(())
    }

    /// Stops the RPC server, drains the workers, and waits for them.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.rpc_handle.take() {
            let _ = handle.stop();
        }
        self.service.shutdown();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.await;
        }
        info!("node stopped");
    }

    /// The wired dpos service.
    pub fn service(&self) -> &Arc<DposService> {
        &self.service
    }

    /// The bound RPC address, once started.
    pub fn rpc_addr(&self) -> Option<SocketAddr> {
        self.rpc_addr
    }
}
