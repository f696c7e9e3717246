// CLI commands

use clap::{Parser, Subcommand};
use crate::config::{NodeConfig, LedgerConfig, DEFAULT_HOST, DEFAULT_PORT, MINING_DIFFICULTY};
use crate::core::{Block, Transaction};
use crate::network::{Message, Node, Peer, Status};
use crate::wallet::{Address, KeyPair, Keystore, TransactionBuilder};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pow-ledger")]
#[command(about = "Minimal proof-of-work ledger node and client", long_about = None)]
pub struct Cli {
    /// Node to talk to for client commands
    #[arg(long, global = true, default_value = "127.0.0.1:5000")]
    pub node: String,

    /// Directory holding the keystore
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a ledger node
    Node {
        /// Host advertised to neighbors
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Leading zero hex digits required in block hashes
        #[arg(long, default_value_t = MINING_DIFFICULTY)]
        difficulty: usize,
        /// Seconds between scheduled mining rounds
        #[arg(long, default_value_t = 20)]
        mining_interval: u64,
        /// Reject transfers exceeding the sender's balance
        #[arg(long)]
        enforce_balance: bool,
        /// Start the mining timer immediately
        #[arg(long)]
        start_mining: bool,
    },

    /// Wallet commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Sign and submit a transfer from a keystore address
    Send {
        /// Recipient address
        to: String,
        /// Amount to transfer
        amount: f64,
        /// Sender address (uses default if not specified)
        #[arg(long)]
        from: Option<String>,
    },

    /// Print the node's chain
    Chain,

    /// Print the node's pending transactions
    Pool,

    /// Get balance for an address
    Balance {
        /// Address to check (uses default if not specified)
        address: Option<String>,
    },

    /// Mine one block now
    Mine,

    /// Start the node's recurring mining timer
    StartMining,

    /// Ask the node to adopt the longest valid neighbor chain
    Consensus,

    /// Drop the node's pending transactions
    ClearPool,
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new address
    New,

    /// List all addresses
    List,
}

/// CLI handler
pub struct CliHandler {
    keystore: Keystore,
    keystore_path: String,
    node_addr: String,
    request_timeout: Duration,
}

impl CliHandler {
    /// Create a new CLI handler
    pub fn new(data_dir: &str, node_addr: &str) -> Result<Self, String> {
        // Load or create keystore
        let keystore_path = format!("{}/keystore.json", data_dir);
        let keystore = if std::path::Path::new(&keystore_path).exists() {
            log::info!("Loading keystore from {}", keystore_path);
            Keystore::load(&keystore_path)?
        } else {
            Keystore::new()
        };

        Ok(Self {
            keystore,
            keystore_path,
            node_addr: node_addr.to_string(),
            request_timeout: NodeConfig::default().request_timeout,
        })
    }

    /// Save keystore to disk
    fn save_keystore(&self) -> Result<(), String> {
        if let Some(dir) = std::path::Path::new(&self.keystore_path).parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create data directory: {}", e))?;
        }
        self.keystore.save(&self.keystore_path)
    }

    /// Handle CLI command
    pub async fn handle(&mut self, cli: Cli) -> Result<(), String> {
        match cli.command {
            Commands::Node { host, port, difficulty, mining_interval, enforce_balance, start_mining } => {
                let config = NodeConfig {
                    host,
                    port,
                    ledger: LedgerConfig { difficulty, enforce_balance, ..LedgerConfig::default() },
                    mining_interval: Duration::from_secs(mining_interval),
                    ..NodeConfig::default()
                };
                self.run_node(config, start_mining).await
            }
            Commands::Wallet(cmd) => self.handle_wallet(cmd),
            Commands::Send { to, amount, from } => self.send(from, &to, amount).await,
            Commands::Chain => match self.request(Message::GetChain).await? {
                Message::Chain(chain) => {
                    println!("Chain ({} blocks):", chain.len());
                    for (height, block) in chain.iter().enumerate() {
                        print_block(height, block);
                    }
                    Ok(())
                }
                other => Err(unexpected(&other)),
            },
            Commands::Pool => match self.request(Message::GetPool).await? {
                Message::Pool(txs) => {
                    println!("Pending transactions ({}):", txs.len());
                    for tx in &txs {
                        print_transaction(tx);
                    }
                    Ok(())
                }
                other => Err(unexpected(&other)),
            },
            Commands::Balance { address } => {
                let addr = match address {
                    Some(a) => a,
                    None => self.default_address()?.0,
                };
                match self.request(Message::GetBalance(addr.clone())).await? {
                    Message::Balance(balance) => {
                        println!("Balance for {}: {}", addr, balance);
                        Ok(())
                    }
                    other => Err(unexpected(&other)),
                }
            }
            Commands::Mine => self.request_status(Message::Mine).await,
            Commands::StartMining => self.request_status(Message::StartMine).await,
            Commands::Consensus => self.request_status(Message::Consensus).await,
            Commands::ClearPool => self.request_status(Message::ClearPool).await,
        }
    }

    /// Run a node with a freshly generated miner key until it fails
    async fn run_node(&self, config: NodeConfig, start_mining: bool) -> Result<(), String> {
        let miner = KeyPair::generate();
        log::info!("private_key {}", miner.private_key_hex());
        log::info!("public_key {}", miner.public_key_hex());
        log::info!("blockchain_address {}", miner.address);

        let node = Node::new(config, miner.address.as_str());
        if start_mining {
            node.start_mining();
        }
        node.run().await
    }

    /// Handle wallet commands
    fn handle_wallet(&mut self, cmd: WalletCommands) -> Result<(), String> {
        match cmd {
            WalletCommands::New => {
                let addr = self.keystore.create();
                println!("New address: {}", addr);
                if let Some(kp) = self.keystore.get(&addr) {
                    println!("  Public key: {}", kp.public_key_hex());
                }
                self.save_keystore()
            }
            WalletCommands::List => {
                println!("Addresses ({}):", self.keystore.len());
                for addr in self.keystore.addresses() {
                    let marker = if self.keystore.default_address() == Some(addr) { "*" } else { " " };
                    println!(" {} {}", marker, addr);
                }
                Ok(())
            }
        }
    }

    async fn send(&self, from: Option<String>, to: &str, amount: f64) -> Result<(), String> {
        let from = match from {
            Some(a) => Address(a),
            None => self.default_address()?,
        };

        let request = TransactionBuilder::new(&self.keystore).build(&from, to, amount)?;
        log::debug!("Submitting {}", serde_json::to_string(&request).unwrap_or_default());

        self.request_status(Message::SubmitTx(request)).await
    }

    fn default_address(&self) -> Result<Address, String> {
        self.keystore
            .default_address()
            .cloned()
            .ok_or_else(|| "No default address. Create one with 'wallet new'".to_string())
    }

    async fn request(&self, message: Message) -> Result<Message, String> {
        Peer::exchange(&self.node_addr, &message, self.request_timeout).await
    }

    async fn request_status(&self, message: Message) -> Result<(), String> {
        match self.request(message).await? {
            Message::Status(Status { success: true, message }) => {
                println!("✓ {}", message);
                Ok(())
            }
            Message::Status(Status { success: false, message }) => Err(message),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(reply: &Message) -> String {
    format!("Unexpected reply: {}", reply.message_type().as_str())
}

/// Print block information
fn print_block(height: usize, block: &Block) {
    println!("Block {}:", height);
    println!("  Hash: {}", block.hash());
    println!("  Previous: {}", block.previous_hash);
    println!("  Timestamp: {}", block.timestamp);
    println!("  Nonce: {}", block.nonce);
    println!("  Transactions: {}", block.transactions.len());

    for tx in &block.transactions {
        print_transaction(tx);
    }
}

fn print_transaction(tx: &Transaction) {
    println!("    {}", tx);
}
