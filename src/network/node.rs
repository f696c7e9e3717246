// Network node - serves the ledger to clients and neighbors

use crate::config::NodeConfig;
use crate::consensus::ConsensusResolver;
use crate::core::Block;
use crate::ledger::{Ledger, TransactionRequest};
use crate::network::{
    Message, Peer, PeerDiscovery, RangeScanner, Status, NetworkChainSource, read_message,
    write_message,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Network node
#[derive(Clone)]
pub struct Node {
    /// Node configuration
    pub config: Arc<NodeConfig>,
    /// Shared ledger
    pub ledger: Arc<Ledger>,
    resolver: Arc<ConsensusResolver>,
    chains: NetworkChainSource,
    mining_started: Arc<AtomicBool>,
}

impl Node {
    /// Create a node whose rewards go to `miner_address`
    pub fn new(config: NodeConfig, miner_address: impl Into<String>) -> Self {
        let ledger = Ledger::new(miner_address, config.port, config.ledger.clone());
        let resolver = ConsensusResolver::new(ledger.config().difficulty);
        let chains = NetworkChainSource::new(config.request_timeout);

        Self {
            config: Arc::new(config),
            ledger: Arc::new(ledger),
            resolver: Arc::new(resolver),
            chains,
            mining_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the configured port, start neighbor discovery and serve forever
    pub async fn run(&self) -> Result<(), String> {
        let listener = TcpListener::bind(("0.0.0.0", self.ledger.port()))
            .await
            .map_err(|e| format!("Failed to bind: {}", e))?;

        self.spawn_neighbor_sync();
        self.serve(listener).await
    }

    /// Accept connections on `listener`, one task per connection
    pub async fn serve(&self, listener: TcpListener) -> Result<(), String> {
        let local = listener
            .local_addr()
            .map_err(|e| format!("Failed to read local address: {}", e))?;
        log::info!("Node listening on {}", local);

        loop {
            let (stream, addr) = listener
                .accept()
                .await
                .map_err(|e| format!("Failed to accept connection: {}", e))?;

            log::debug!("New connection from {}", addr);

            let node = self.clone();
            tokio::spawn(async move {
                if let Err(e) = node.handle_connection(stream).await {
                    log::error!("Connection {} error: {}", addr, e);
                }
            });
        }
    }

    /// Handle a single request/response exchange. A client that does not
    /// send its request within the request timeout is dropped.
    async fn handle_connection(&self, mut stream: TcpStream) -> Result<(), String> {
        let request = timeout(self.config.request_timeout, read_message(&mut stream))
            .await
            .map_err(|_| "Timed out waiting for request".to_string())??;
        log::debug!("Received {:?}", request.message_type());

        let reply = self.handle_message(request).await;
        write_message(&mut stream, &reply).await
    }

    /// Dispatch a request against the ledger and build the reply
    pub async fn handle_message(&self, message: Message) -> Message {
        match message {
            Message::GetChain => Message::Chain(self.ledger.chain()),
            Message::GetPool => Message::Pool(self.ledger.transaction_pool()),
            Message::SubmitTx(request) => match self.ledger.submit_request(&request) {
                Ok(()) => {
                    let node = self.clone();
                    tokio::spawn(async move { node.relay_transaction(request).await });
                    Message::Status(Status::success("success"))
                }
                Err(e) => {
                    log::warn!("Rejected submission: {}", e);
                    Message::Status(Status::fail(e.to_string()))
                }
            },
            Message::RelayTx(request) => match self.ledger.submit_request(&request) {
                Ok(()) => Message::Status(Status::success("success")),
                Err(e) => {
                    log::warn!("Rejected relayed transaction: {}", e);
                    Message::Status(Status::fail(e.to_string()))
                }
            },
            Message::Mine => match self.mine().await {
                Ok(block) => Message::Status(Status::success(block.hash().to_hex())),
                Err(e) => Message::Status(Status::fail(e)),
            },
            Message::StartMine => {
                self.start_mining();
                Message::Status(Status::success("success"))
            }
            Message::GetBalance(address) => Message::Balance(self.ledger.balance(&address)),
            Message::Consensus => {
                let outcome = if self.resolve_conflicts().await { "replaced" } else { "unchanged" };
                Message::Status(Status::success(outcome))
            }
            Message::ClearPool => {
                self.ledger.clear_pool();
                Message::Status(Status::success("success"))
            }
            other => Message::Status(Status::fail(format!(
                "Unexpected request: {}",
                other.message_type().as_str()
            ))),
        }
    }

    /// Seal the pool on the blocking pool, then ask neighbors to reconcile
    pub async fn mine(&self) -> Result<Block, String> {
        let ledger = Arc::clone(&self.ledger);
        let block = tokio::task::spawn_blocking(move || ledger.mine())
            .await
            .map_err(|e| format!("Mining task failed: {}", e))?
            .map_err(|e| e.to_string())?;

        self.broadcast_consensus().await;
        Ok(block)
    }

    /// Start the recurring mining timer. Returns false if already running.
    pub fn start_mining(&self) -> bool {
        if self.mining_started.swap(true, Ordering::SeqCst) {
            return false;
        }

        let node = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(node.config.mining_interval);
            loop {
                interval.tick().await;
                if let Err(e) = node.mine().await {
                    log::error!("Scheduled mining failed: {}", e);
                }
            }
        });
        log::info!("Mining timer started ({:?})", self.config.mining_interval);
        true
    }

    /// Re-run neighbor discovery on a timer
    pub fn spawn_neighbor_sync(&self) -> JoinHandle<()> {
        let node = self.clone();
        tokio::spawn(async move {
            let scanner = RangeScanner {
                host: node.config.host.clone(),
                port: node.ledger.port(),
                ip_offsets: node.config.neighbor_ip_offsets.clone(),
                ports: node.config.neighbor_ports.clone(),
                probe_timeout: node.config.probe_timeout,
            };
            let mut interval = tokio::time::interval(node.config.neighbor_sync_interval);
            loop {
                interval.tick().await;
                node.ledger.set_neighbors(scanner.discover().await);
            }
        })
    }

    /// Adopt the longest valid neighbor chain, if longer than ours
    pub async fn resolve_conflicts(&self) -> bool {
        self.resolver.resolve_conflicts(&self.ledger, &self.chains).await
    }

    async fn relay_transaction(&self, request: TransactionRequest) {
        for neighbor in self.ledger.neighbors() {
            let message = Message::RelayTx(request.clone());
            match Peer::exchange(&neighbor, &message, self.config.request_timeout).await {
                Ok(Message::Status(status)) if status.success => {}
                Ok(reply) => log::warn!("Relay to {} refused: {:?}", neighbor, reply),
                Err(e) => log::warn!("Relay to {} failed: {}", neighbor, e),
            }
        }
    }

    async fn broadcast_consensus(&self) {
        for neighbor in self.ledger.neighbors() {
            if let Err(e) = Peer::exchange(&neighbor, &Message::Consensus, self.config.request_timeout).await {
                log::warn!("Consensus request to {} failed: {}", neighbor, e);
            }
        }
    }
}
