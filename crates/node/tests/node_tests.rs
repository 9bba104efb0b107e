//! Node wiring tests: genesis seeding and role gating.

use delcore_config::Config;
use delcore_node::Node;
use delcore_types::{Address, Status, Transaction};

fn config_toml(is_delegate: bool) -> String {
    format!(
        r#"
[node]
private_key = "0x0000000000000000000000000000000000000000000000000000000000000001"
is_delegate = {is_delegate}

[storage]
backend = "memory"
path = "unused"

[[delegates]]
address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
endpoint = "http://127.0.0.1:1975"

[[genesis.accounts]]
address = "0x3333333333333333333333333333333333333333"
balance = 500
"#
    )
}

#[tokio::test]
async fn test_genesis_accounts_are_seeded() {
    let config = Config::from_toml(&config_toml(true)).unwrap();
    let node = Node::new(config).unwrap();

    let address: Address = "0x3333333333333333333333333333333333333333"
        .parse()
        .unwrap();
    let resp = node.service().get_account(&address);
    assert_eq!(resp.status, Status::Ok);
    let account = resp.data.unwrap();
    assert_eq!(account["balance"], "0x1f4");
}

#[tokio::test]
async fn test_non_delegate_rejects_submission() {
    let config = Config::from_toml(&config_toml(false)).unwrap();
    let node = Node::new(config).unwrap();

    let tx = Transaction::transfer(
        Address::from([0x01; 20]),
        Address::from([0x02; 20]),
        1,
        0,
    );
    let receipt = node.service().submit(tx);
    assert_eq!(receipt.status, Status::NotDelegate);
}

#[tokio::test]
async fn test_genesis_seeding_is_idempotent_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!(
        r#"
[node]
private_key = "0x0000000000000000000000000000000000000000000000000000000000000001"
is_delegate = true

[storage]
backend = "rocksdb"
path = "{}"

[[delegates]]
address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
endpoint = "http://127.0.0.1:1975"

[[genesis.accounts]]
address = "0x3333333333333333333333333333333333333333"
balance = 500
"#,
        dir.path().display()
    );
    let address: Address = "0x3333333333333333333333333333333333333333"
        .parse()
        .unwrap();

    {
        let config = Config::from_toml(&toml).unwrap();
        let node = Node::new(config).unwrap();
        assert_eq!(node.service().get_account(&address).status, Status::Ok);
    }

    // Second start over the same database must not reseed.
    let config = Config::from_toml(&toml).unwrap();
    let node = Node::new(config).unwrap();
    let account = node.service().get_account(&address).data.unwrap();
    assert_eq!(account["balance"], "0x1f4");
}

#[tokio::test]
async fn test_rpc_server_starts_on_ephemeral_port() {
    let mut toml = config_toml(true);
    toml.push_str("\n[rpc]\nlisten = \"127.0.0.1:0\"\nmax_connections = 8\n");
    let config = Config::from_toml(&toml).unwrap();

    let mut node = Node::new(config).unwrap();
    node.start().await.unwrap();
    assert!(node.rpc_addr().is_some());
    node.shutdown().await;
}
