//! JSON-RPC method definitions and their service-backed implementations.

use async_trait::async_trait;
use delcore_core::SubscriptionRequest;
use delcore_dpos::DposService;
use delcore_types::{Address, ApiResponse, Gossip, Transaction, H256};
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::debug;

/// Client-facing methods. Every method answers the `ApiResponse`
/// envelope; failures are statuses, not JSON-RPC errors.
#[rpc(server, client, namespace = "dc")]
pub trait DelegateApi {
    /// Submits a signed transaction for admission.
    #[method(name = "submitTransaction")]
    async fn submit_transaction(&self, tx: Transaction) -> RpcResult<ApiResponse>;

    /// Returns a transaction by hash.
    #[method(name = "getTransaction")]
    async fn get_transaction(&self, hash: H256) -> RpcResult<ApiResponse>;

    /// Returns the receipt for a transaction hash.
    #[method(name = "getReceipt")]
    async fn get_receipt(&self, hash: H256) -> RpcResult<ApiResponse>;

    /// Returns an account by address.
    #[method(name = "getAccount")]
    async fn get_account(&self, address: Address) -> RpcResult<ApiResponse>;

    /// Returns the gossip state for a transaction hash.
    #[method(name = "getGossip")]
    async fn get_gossip(&self, hash: H256) -> RpcResult<ApiResponse>;

    /// Returns one page of persisted transactions. Pages are 1-based.
    #[method(name = "getTransactions")]
    async fn get_transactions(&self, page: usize) -> RpcResult<ApiResponse>;

    /// Returns every transaction sent by an address.
    #[method(name = "getTransactionsByFromAddress")]
    async fn get_transactions_by_from(&self, address: Address) -> RpcResult<ApiResponse>;

    /// Returns every transaction received by an address.
    #[method(name = "getTransactionsByToAddress")]
    async fn get_transactions_by_to(&self, address: Address) -> RpcResult<ApiResponse>;

    /// Returns one page of persisted accounts. Pages are 1-based.
    #[method(name = "getAccounts")]
    async fn get_accounts(&self, page: usize) -> RpcResult<ApiResponse>;

    /// Returns one page of persisted gossips. Pages are 1-based.
    #[method(name = "getGossips")]
    async fn get_gossips(&self, page: usize) -> RpcResult<ApiResponse>;

    /// Returns the current delegate set.
    #[method(name = "getDelegates")]
    async fn get_delegates(&self) -> RpcResult<ApiResponse>;

    /// Returns a snapshot of the execution queue.
    #[method(name = "dumpQueue")]
    async fn dump_queue(&self) -> RpcResult<ApiResponse>;

    /// Registers a publish/subscribe subscription.
    #[method(name = "createSubscription")]
    async fn create_subscription(&self, req: SubscriptionRequest) -> RpcResult<ApiResponse>;
}

/// Delegate-to-delegate methods.
#[rpc(server, client, namespace = "peer")]
pub trait PeerApi {
    /// The symmetric gossip exchange: merge the offered gossip and return
    /// this node's post-merge state.
    #[method(name = "gossip")]
    async fn gossip(&self, gossip: Gossip) -> RpcResult<Gossip>;
}

/// [`DelegateApiServer`] backed by the dpos service.
pub struct DelegateApiImpl {
    service: Arc<DposService>,
}

impl DelegateApiImpl {
    /// Wraps a service.
    pub fn new(service: Arc<DposService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DelegateApiServer for DelegateApiImpl {
    async fn submit_transaction(&self, tx: Transaction) -> RpcResult<ApiResponse> {
        let hash = tx.hash;
        let receipt = self.service.submit(tx);
        debug!(%hash, status = %receipt.status, "submitTransaction");
        Ok(ApiResponse::with_detail(
            receipt.status,
            receipt.human_readable_status.clone(),
        )
        .with_data(&receipt))
    }

    async fn get_transaction(&self, hash: H256) -> RpcResult<ApiResponse> {
        Ok(self.service.get_transaction(&hash))
    }

    async fn get_receipt(&self, hash: H256) -> RpcResult<ApiResponse> {
        Ok(self.service.get_receipt(&hash))
    }

    async fn get_account(&self, address: Address) -> RpcResult<ApiResponse> {
        Ok(self.service.get_account(&address))
    }

    async fn get_gossip(&self, hash: H256) -> RpcResult<ApiResponse> {
        Ok(self.service.get_gossip(&hash))
    }

    async fn get_transactions(&self, page: usize) -> RpcResult<ApiResponse> {
        Ok(self.service.get_transactions(page))
    }

    async fn get_transactions_by_from(&self, address: Address) -> RpcResult<ApiResponse> {
        Ok(self.service.get_transactions_by_from(&address))
    }

    async fn get_transactions_by_to(&self, address: Address) -> RpcResult<ApiResponse> {
        Ok(self.service.get_transactions_by_to(&address))
    }

    async fn get_accounts(&self, page: usize) -> RpcResult<ApiResponse> {
        Ok(self.service.get_accounts(page))
    }

    async fn get_gossips(&self, page: usize) -> RpcResult<ApiResponse> {
        Ok(self.service.get_gossips(page))
    }

    async fn get_delegates(&self) -> RpcResult<ApiResponse> {
        Ok(self.service.delegate_nodes())
    }

    async fn dump_queue(&self) -> RpcResult<ApiResponse> {
        Ok(self.service.dump_queue())
    }

    async fn create_subscription(&self, req: SubscriptionRequest) -> RpcResult<ApiResponse> {
        Ok(self.service.create_subscription(&req))
    }
}

/// [`PeerApiServer`] backed by the dpos service.
pub struct PeerApiImpl {
    service: Arc<DposService>,
}

impl PeerApiImpl {
    /// Wraps a service.
    pub fn new(service: Arc<DposService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl PeerApiServer for PeerApiImpl {
    async fn gossip(&self, gossip: Gossip) -> RpcResult<Gossip> {
        let merged = self
            .service
            .synchronize_gossip(&gossip)
            .map_err(|e| ErrorObjectOwned::owned(-32000, e.to_string(), None::<()>))?;
        // Keep the merged state circulating on this side as well; the
        // exchange converges both peers.
        self.service.enqueue_gossip(merged.clone());
        Ok(merged)
    }
}
