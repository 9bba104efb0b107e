//! RPC server assembly.

use crate::api::{DelegateApiImpl, DelegateApiServer, PeerApiImpl, PeerApiServer};
use crate::RpcError;
use delcore_dpos::DposService;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Listen address.
    pub listen: SocketAddr,
    /// Maximum number of connections.
    pub max_connections: u32,
    /// Maximum request body size in bytes.
    pub max_request_size: u32,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:1975".parse().expect("static address"),
            max_connections: 512,
            max_request_size: 10 * 1024 * 1024,
        }
    }
}

/// Builds the full method set over one service.
pub fn build_module(service: Arc<DposService>) -> Result<RpcModule<()>, RpcError> {
    let mut module = RpcModule::new(());
    module
        .merge(DelegateApiImpl::new(Arc::clone(&service)).into_rpc())
        .map_err(|e| RpcError::Internal(format!("failed to merge dc api: {e}")))?;
    module
        .merge(PeerApiImpl::new(service).into_rpc())
        .map_err(|e| RpcError::Internal(format!("failed to merge peer api: {e}")))?;
    Ok(module)
}

/// Starts the HTTP JSON-RPC server and returns its handle and bound
/// address.
pub async fn serve(
    config: RpcServerConfig,
    service: Arc<DposService>,
) -> Result<(ServerHandle, SocketAddr), RpcError> {
    let module = build_module(service)?;

    let server = ServerBuilder::default()
        .max_connections(config.max_connections)
        .max_request_body_size(config.max_request_size)
        .build(config.listen)
        .await
        .map_err(|e| RpcError::Bind(e.to_string()))?;

    let addr = server
        .local_addr()
        .map_err(|e| RpcError::Bind(e.to_string()))?;
    let handle = server.start(module);
    info!(%addr, "rpc server listening");
    Ok((handle, addr))
}
