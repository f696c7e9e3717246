// Two nodes talking over loopback

use pow_ledger::config::{LedgerConfig, NodeConfig};
use pow_ledger::network::{Message, Node, Peer, Status};
use pow_ledger::wallet::{Keystore, TransactionBuilder};
use std::time::Duration;
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start_node(miner: &str) -> (Node, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = NodeConfig {
        port: addr.port(),
        ledger: LedgerConfig { difficulty: 1, ..LedgerConfig::default() },
        request_timeout: TIMEOUT,
        ..NodeConfig::default()
    };
    let node = Node::new(config, miner);

    let server = node.clone();
    tokio::spawn(async move { server.serve(listener).await });

    (node, addr.to_string())
}

async fn chain_len(addr: &str) -> usize {
    match Peer::exchange(addr, &Message::GetChain, TIMEOUT).await.unwrap() {
        Message::Chain(chain) => chain.len(),
        other => panic!("Unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_mined_block_propagates_to_neighbor() {
    let (node_a, addr_a) = start_node("miner-a").await;
    let (node_b, addr_b) = start_node("miner-b").await;
    node_a.ledger.set_neighbors(vec![addr_b.clone()]);
    node_b.ledger.set_neighbors(vec![addr_a.clone()]);

    let reply = Peer::exchange(&addr_b, &Message::Mine, TIMEOUT).await.unwrap();
    assert!(matches!(reply, Message::Status(Status { success: true, .. })));

    // Mining broadcasts consensus before replying
    assert_eq!(chain_len(&addr_b).await, 2);
    assert_eq!(chain_len(&addr_a).await, 2);
    assert_eq!(node_a.ledger.chain(), node_b.ledger.chain());
    assert_eq!(node_a.ledger.balance("miner-b"), 1.0);

    // Equal length: nothing to adopt
    let reply = Peer::exchange(&addr_a, &Message::Consensus, TIMEOUT).await.unwrap();
    assert_eq!(reply, Message::Status(Status::success("unchanged")));
}

#[tokio::test]
async fn test_submitted_transaction_is_relayed() {
    let (node_a, addr_a) = start_node("miner-a").await;
    let (node_b, addr_b) = start_node("miner-b").await;
    node_a.ledger.set_neighbors(vec![addr_b.clone()]);

    let mut keystore = Keystore::new();
    let from = keystore.create();
    let request = TransactionBuilder::new(&keystore).build(&from, "bob", 3.0).unwrap();

    let reply = Peer::exchange(&addr_a, &Message::SubmitTx(request), TIMEOUT).await.unwrap();
    assert_eq!(reply, Message::Status(Status::success("success")));
    assert_eq!(node_a.ledger.transaction_pool().len(), 1);

    // Relay runs in the background
    let mut relayed = false;
    for _ in 0..50 {
        if node_b.ledger.transaction_pool().len() == 1 {
            relayed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(relayed);
    assert_eq!(node_b.ledger.transaction_pool()[0].sender, from.as_str());
}

#[tokio::test]
async fn test_tampered_submission_rejected_over_network() {
    let (node, addr) = start_node("miner").await;

    let mut keystore = Keystore::new();
    let from = keystore.create();
    let mut request = TransactionBuilder::new(&keystore).build(&from, "bob", 3.0).unwrap();
    request.recipient = "mallory".to_string();

    match Peer::exchange(&addr, &Message::SubmitTx(request), TIMEOUT).await.unwrap() {
        Message::Status(status) => assert!(!status.success),
        other => panic!("Unexpected reply: {:?}", other),
    }
    assert!(node.ledger.transaction_pool().is_empty());
}

#[tokio::test]
async fn test_balance_after_mining() {
    let (_node, addr) = start_node("miner").await;

    Peer::exchange(&addr, &Message::Mine, TIMEOUT).await.unwrap();
    Peer::exchange(&addr, &Message::Mine, TIMEOUT).await.unwrap();

    let reply = Peer::exchange(&addr, &Message::GetBalance("miner".to_string()), TIMEOUT).await.unwrap();
    assert_eq!(reply, Message::Balance(2.0));
    assert_eq!(chain_len(&addr).await, 3);
}
