//! The gossip synchronization worker.
//!
//! Single consumer of the gossip channel. Each received gossip is handled
//! on its own child task so a slow peer RPC never head-of-line blocks the
//! loop; the only ordering between child tasks is that their pushes back
//! into the channel interleave in arrival order.

use crate::service::DposService;
use delcore_types::Gossip;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Runs the worker loop until shutdown or channel closure.
pub(crate) async fn run_gossip_worker(
    service: Arc<DposService>,
    mut rx: mpsc::UnboundedReceiver<Gossip>,
) {
    let mut shutdown = service.shutdown_rx.clone();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            received = rx.recv() => match received {
                Some(gossip) => {
                    let service = Arc::clone(&service);
                    tokio::spawn(async move {
                        handle_gossip(service, gossip).await;
                    });
                }
                None => break,
            }
        }
    }
    debug!("gossip worker stopped");
}

/// Processes one gossip: police timing, check quorum, and keep the rumor
/// spreading.
pub(crate) async fn handle_gossip(service: Arc<DposService>, gossip: Gossip) {
    // Quorum counting must only ever see verified, deduplicated rumors;
    // wire input is untrusted.
    let gossip = gossip.sanitized();
    let hash = gossip.transaction.hash;

    let delegates = service.ctx.directory.delegates();
    let n = delegates.len();
    if n == 0 {
        warn!(hash = %hash, "no delegates known, dropping gossip");
        return;
    }
    let policy = service.ctx.policy;

    // A rumor spread wider than the per-hop budget times the delegate
    // count is stale or malicious fan-in. Ignore it and keep listening;
    // well-timed gossip can still reach quorum.
    if gossip.rumors.len() > 1
        && !gossip.validate_time_delta(policy.gossip_timeout_ms * n as u64)
    {
        warn!(hash = %hash, "rumor time spread exceeds the gossip window, dropping");
        return;
    }

    let quorum = crate::quorum_threshold(n);
    if gossip.rumors.len() >= quorum && !service.queue.exists(&hash) {
        if service.queue.push(gossip.clone()) {
            debug!(hash = %hash, rumors = gossip.rumors.len(), quorum, "quorum reached, queued for execution");
            arm_execution_timer(&service, &gossip, n);
        }
    }

    if gossip.rumors.len() == n {
        debug!(hash = %hash, "all delegates have rumored");
        service.clear_gossip_attempts(&hash);
        return;
    }

    let Some(node) = service.pick_gossip_peer(&gossip, &delegates) else {
        warn!(hash = %hash, "no delegate left to rumor with");
        service.requeue_gossip(gossip, "no peer available");
        return;
    };

    service.mark_peer_attempted(hash, node.address);
    match service.ctx.peers.peer_gossip(&node, &gossip).await {
        Ok(merged) => {
            service.enqueue_gossip(merged);
        }
        Err(e) => {
            warn!(hash = %hash, peer = %node.address, error = %e, "peer gossip failed");
            service.requeue_gossip(gossip, "peer transport failure");
        }
    }
}

/// Arms the one-shot execution release timer for a freshly queued gossip.
///
/// The delay budgets one gossip hop per delegate plus the receive window;
/// a future-dated transaction shifts the timer forward so client-scheduled
/// transactions are honored.
fn arm_execution_timer(service: &Arc<DposService>, gossip: &Gossip, delegate_count: usize) {
    let policy = service.ctx.policy;
    let now = service.ctx.clock.now_ms();
    let future_delta = gossip.transaction.time.saturating_sub(now);
    let delay_ms = policy.gossip_timeout_ms * delegate_count as u64
        + policy.tx_receive_timeout_ms
        + future_delta;

    debug!(hash = %gossip.transaction.hash, delay_ms, "execution timer armed");
    let timeout_tx = service.timeout_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        let _ = timeout_tx.send(());
    });
}
