// Node networking: framed request/response protocol over TCP

mod message;
mod peer;
mod discovery;
mod node;

pub use message::{Message, MessageType, Status, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use peer::{Peer, NetworkChainSource, read_message, write_message};
pub use discovery::{PeerDiscovery, RangeScanner, is_reachable};
pub use node::Node;
