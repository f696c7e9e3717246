// Node configuration

use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const MINING_DIFFICULTY: usize = 3;
pub const MINING_REWARD: f64 = 1.0;

/// Ledger rules
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Required leading zero hex digits in a sealed block's hash
    pub difficulty: usize,
    /// Amount paid to the miner for each sealed block
    pub mining_reward: f64,
    /// Reject transfers exceeding the sender's replayed balance.
    /// Off by default: overspending is accepted and only visible through
    /// balance computation.
    pub enforce_balance: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: MINING_DIFFICULTY,
            mining_reward: MINING_REWARD,
            enforce_balance: false,
        }
    }
}

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host the node advertises; neighbors are probed around it
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    pub ledger: LedgerConfig,
    /// Offsets added to the host's final octet when probing for neighbors
    pub neighbor_ip_offsets: RangeInclusive<u8>,
    /// Ports probed for neighbors
    pub neighbor_ports: RangeInclusive<u16>,
    /// Per-probe connect timeout
    pub probe_timeout: Duration,
    /// Period of the recurring mining timer
    pub mining_interval: Duration,
    /// Period of neighbor re-discovery
    pub neighbor_sync_interval: Duration,
    /// Connect/read timeout for requests to other nodes
    pub request_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ledger: LedgerConfig::default(),
            neighbor_ip_offsets: 0..=1,
            neighbor_ports: 5000..=5003,
            probe_timeout: Duration::from_secs(1),
            mining_interval: Duration::from_secs(20),
            neighbor_sync_interval: Duration::from_secs(20),
            request_timeout: Duration::from_secs(10),
        }
    }
}
