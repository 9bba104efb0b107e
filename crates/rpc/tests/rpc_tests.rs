//! RPC surface tests: in-process module calls and a live peer exchange.

use delcore_cache::ChainCache;
use delcore_core::{
    Clock, KeypairSigner, ManualClock, PeerClient, StaticDirectory, TopicRegistry,
};
use delcore_crypto::PrivateKey;
use delcore_dpos::{CoreContext, DposService, Policy};
use delcore_rpc::{build_module, serve, HttpPeerClient, RpcServerConfig};
use delcore_storage::MemStore;
use delcore_types::{
    Address, ApiResponse, Gossip, NodeInfo, Rumor, Status, Transaction,
};
use delcore_vm::MockVm;
use jsonrpsee::rpc_params;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    service: Arc<DposService>,
    keys: Vec<PrivateKey>,
    clock: Arc<ManualClock>,
}

fn fixture() -> Fixture {
    let keys: Vec<PrivateKey> = (1..=4u8)
        .map(|i| {
            let mut bytes = [0u8; 32];
            bytes[31] = i;
            PrivateKey::from_bytes(&bytes).unwrap()
        })
        .collect();
    let nodes: Vec<NodeInfo> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| NodeInfo::delegate(k.address(), format!("http://delegate-{i}:1975")))
        .collect();
    let clock = Arc::new(ManualClock::at(1_000_000));

    let ctx = CoreContext {
        store: Arc::new(MemStore::new()),
        cache: Arc::new(ChainCache::new(Duration::from_secs(120))),
        directory: Arc::new(StaticDirectory::new(nodes[0].clone(), nodes)),
        vm: Arc::new(MockVm::new()),
        clock: Arc::clone(&clock) as Arc<dyn Clock>,
        signer: Arc::new(KeypairSigner::new(keys[0].clone())),
        peers: Arc::new(HttpPeerClient::default()) as Arc<dyn PeerClient>,
        publisher: Arc::new(TopicRegistry::new(["receipts"])),
        policy: Policy::default(),
    };

    Fixture {
        service: DposService::new(ctx),
        keys,
        clock,
    }
}

fn signed_transfer(f: &Fixture, value: u64) -> Transaction {
    Transaction::transfer(
        f.keys[0].address(),
        Address::from([0xb0; 20]),
        value,
        f.clock.now_ms(),
    )
    .finalize(f.keys[0].signing_key())
    .unwrap()
}

#[tokio::test]
async fn test_submit_and_lookup_roundtrip() {
    let f = fixture();
    let module = build_module(Arc::clone(&f.service)).unwrap();
    let tx = signed_transfer(&f, 40);

    let resp: ApiResponse = module
        .call("dc_submitTransaction", rpc_params![tx.clone()])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::Pending);

    let resp: ApiResponse = module
        .call("dc_getReceipt", rpc_params![tx.hash])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::Ok);
    let receipt = resp.data.unwrap();
    assert_eq!(receipt["status"], "Pending");
    assert_eq!(receipt["transactionHash"], tx.hash.to_hex());

    let resp: ApiResponse = module
        .call("dc_getTransaction", rpc_params![tx.hash])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::Ok);
}

#[tokio::test]
async fn test_lookup_missing_entities() {
    let f = fixture();
    let module = build_module(Arc::clone(&f.service)).unwrap();

    let absent = delcore_types::H256::keccak256(b"absent");
    let resp: ApiResponse = module
        .call("dc_getReceipt", rpc_params![absent])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::NotFound);

    let resp: ApiResponse = module
        .call("dc_getAccount", rpc_params![Address::from([0x77; 20])])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::NotFound);
}

#[tokio::test]
async fn test_delegates_and_queue_dump() {
    let f = fixture();
    let module = build_module(Arc::clone(&f.service)).unwrap();

    let resp: ApiResponse = module.call("dc_getDelegates", rpc_params![]).await.unwrap();
    assert_eq!(resp.status, Status::Ok);
    assert_eq!(resp.data.unwrap().as_array().unwrap().len(), 4);

    let resp: ApiResponse = module.call("dc_dumpQueue", rpc_params![]).await.unwrap();
    assert_eq!(resp.status, Status::Ok);
    assert!(resp.data.unwrap().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_subscription_topic() {
    let f = fixture();
    let module = build_module(Arc::clone(&f.service)).unwrap();

    let req = delcore_core::SubscriptionRequest {
        topic: "blocks".into(),
        endpoint: "http://localhost:9000/hook".into(),
        headers: Default::default(),
        address: "0xabc".into(),
    };
    let resp: ApiResponse = module
        .call("dc_createSubscription", rpc_params![req])
        .await
        .unwrap();
    assert_eq!(resp.status, Status::TopicNotFound);
}

#[tokio::test]
async fn test_live_peer_gossip_exchange() {
    let f = fixture();
    let config = RpcServerConfig {
        listen: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    };
    let (handle, addr) = serve(config, Arc::clone(&f.service)).await.unwrap();

    // Offer a gossip rumored by delegate 1; the peer merges and adds its
    // own rumor, preserving the original signature byte-for-byte.
    let tx = signed_transfer(&f, 7);
    let mut offered = Gossip::new(tx.clone());
    let rumor = Rumor::signed(
        f.keys[1].signing_key(),
        f.keys[1].address(),
        tx.hash,
        tx.time,
    )
    .unwrap();
    offered.add_rumor(rumor.clone());

    let peer = HttpPeerClient::default();
    let node = NodeInfo::delegate(f.keys[0].address(), format!("http://{addr}"));
    let merged = peer.peer_gossip(&node, &offered).await.unwrap();

    assert_eq!(merged.rumors.len(), 2);
    let echoed = merged
        .rumors
        .iter()
        .find(|r| r.address == f.keys[1].address())
        .unwrap();
    assert_eq!(echoed.signature, rumor.signature);
    merged.rumors.iter().for_each(|r| r.verify().unwrap());

    handle.stop().unwrap();
}
