// Network protocol messages

use crate::core::{
    Block, Transaction, Serializable, write_varint, write_string, read_string, read_count,
    read_array,
};
use crate::ledger::TransactionRequest;
use std::io::{Cursor, Read};

/// Header: 12-byte command name + 4-byte payload length
pub const HEADER_LEN: usize = 16;
/// Largest payload accepted from a peer
pub const MAX_PAYLOAD_LEN: usize = 32 * 1024 * 1024;

/// Network message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    GetChain,
    Chain,
    GetPool,
    Pool,
    SubmitTx,
    RelayTx,
    Mine,
    StartMine,
    GetBalance,
    Balance,
    Consensus,
    ClearPool,
    Status,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::GetChain => "getchain",
            MessageType::Chain => "chain",
            MessageType::GetPool => "getpool",
            MessageType::Pool => "pool",
            MessageType::SubmitTx => "submittx",
            MessageType::RelayTx => "relaytx",
            MessageType::Mine => "mine",
            MessageType::StartMine => "startmine",
            MessageType::GetBalance => "getbalance",
            MessageType::Balance => "balance",
            MessageType::Consensus => "consensus",
            MessageType::ClearPool => "clearpool",
            MessageType::Status => "status",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "getchain" => Some(MessageType::GetChain),
            "chain" => Some(MessageType::Chain),
            "getpool" => Some(MessageType::GetPool),
            "pool" => Some(MessageType::Pool),
            "submittx" => Some(MessageType::SubmitTx),
            "relaytx" => Some(MessageType::RelayTx),
            "mine" => Some(MessageType::Mine),
            "startmine" => Some(MessageType::StartMine),
            "getbalance" => Some(MessageType::GetBalance),
            "balance" => Some(MessageType::Balance),
            "consensus" => Some(MessageType::Consensus),
            "clearpool" => Some(MessageType::ClearPool),
            "status" => Some(MessageType::Status),
            _ => None,
        }
    }
}

/// Outcome of a request that changes node state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub success: bool,
    pub message: String,
}

impl Status {
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Network message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    GetChain,
    Chain(Vec<Block>),
    GetPool,
    Pool(Vec<Transaction>),
    /// Client submission; admitted and relayed to neighbors
    SubmitTx(TransactionRequest),
    /// Neighbor relay; admitted without further relay
    RelayTx(TransactionRequest),
    Mine,
    StartMine,
    GetBalance(String),
    Balance(f64),
    Consensus,
    ClearPool,
    Status(Status),
}

impl Message {
    /// Get message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::GetChain => MessageType::GetChain,
            Message::Chain(_) => MessageType::Chain,
            Message::GetPool => MessageType::GetPool,
            Message::Pool(_) => MessageType::Pool,
            Message::SubmitTx(_) => MessageType::SubmitTx,
            Message::RelayTx(_) => MessageType::RelayTx,
            Message::Mine => MessageType::Mine,
            Message::StartMine => MessageType::StartMine,
            Message::GetBalance(_) => MessageType::GetBalance,
            Message::Balance(_) => MessageType::Balance,
            Message::Consensus => MessageType::Consensus,
            Message::ClearPool => MessageType::ClearPool,
            Message::Status(_) => MessageType::Status,
        }
    }

    /// Serialize message to bytes: header followed by payload.
    /// Fails if the payload exceeds `MAX_PAYLOAD_LEN`.
    pub fn serialize(&self) -> Result<Vec<u8>, String> {
        let payload = self.serialize_payload();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(format!(
                "{} payload too large: {} bytes",
                self.message_type().as_str(),
                payload.len()
            ));
        }

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());

        // Message type (12 bytes, padded with zeros)
        let mut type_bytes = [0u8; 12];
        let type_str_bytes = self.message_type().as_str().as_bytes();
        let len = type_str_bytes.len().min(12);
        type_bytes[..len].copy_from_slice(&type_str_bytes[..len]);
        bytes.extend_from_slice(&type_bytes);

        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);

        Ok(bytes)
    }

    fn serialize_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Message::GetChain
            | Message::GetPool
            | Message::Mine
            | Message::StartMine
            | Message::Consensus
            | Message::ClearPool => {}
            Message::Chain(blocks) => {
                write_varint(&mut buf, blocks.len() as u64);
                for block in blocks {
                    block.write_to(&mut buf);
                }
            }
            Message::Pool(txs) => {
                write_varint(&mut buf, txs.len() as u64);
                for tx in txs {
                    tx.write_to(&mut buf);
                }
            }
            Message::SubmitTx(request) | Message::RelayTx(request) => request.write_to(&mut buf),
            Message::GetBalance(address) => write_string(&mut buf, address),
            Message::Balance(amount) => buf.extend_from_slice(&amount.to_le_bytes()),
            Message::Status(status) => {
                buf.push(status.success as u8);
                write_string(&mut buf, &status.message);
            }
        }
        buf
    }

    /// Parse a header into the message type and payload length
    pub fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(MessageType, usize), String> {
        let msg_type_str = std::str::from_utf8(&header[0..12])
            .map_err(|e| format!("Invalid message type: {}", e))?
            .trim_end_matches('\0');

        let msg_type = MessageType::from_string(msg_type_str)
            .ok_or_else(|| format!("Unknown message type: {}", msg_type_str))?;

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&header[12..16]);
        let payload_len = u32::from_le_bytes(len_bytes) as usize;

        if payload_len > MAX_PAYLOAD_LEN {
            return Err(format!("Payload too large: {} bytes", payload_len));
        }

        Ok((msg_type, payload_len))
    }

    /// Deserialize message from bytes
    pub fn deserialize(data: &[u8]) -> Result<Self, String> {
        if data.len() < HEADER_LEN {
            return Err("Message too short".to_string());
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&data[..HEADER_LEN]);
        let (msg_type, payload_len) = Self::parse_header(&header)?;

        if data.len() != HEADER_LEN + payload_len {
            return Err("Payload length mismatch".to_string());
        }

        Self::from_payload(msg_type, &data[HEADER_LEN..])
    }

    /// Decode the payload of a message whose type is already known
    pub fn from_payload(msg_type: MessageType, payload: &[u8]) -> Result<Self, String> {
        let mut cursor = Cursor::new(payload);

        let message = match msg_type {
            MessageType::GetChain => Message::GetChain,
            MessageType::GetPool => Message::GetPool,
            MessageType::Mine => Message::Mine,
            MessageType::StartMine => Message::StartMine,
            MessageType::Consensus => Message::Consensus,
            MessageType::ClearPool => Message::ClearPool,
            MessageType::Chain => Message::Chain(read_list(&mut cursor)?),
            MessageType::Pool => Message::Pool(read_list(&mut cursor)?),
            MessageType::SubmitTx => Message::SubmitTx(TransactionRequest::read_from(&mut cursor)?),
            MessageType::RelayTx => Message::RelayTx(TransactionRequest::read_from(&mut cursor)?),
            MessageType::GetBalance => Message::GetBalance(read_string(&mut cursor)?),
            MessageType::Balance => Message::Balance(f64::from_le_bytes(read_array(&mut cursor)?)),
            MessageType::Status => {
                let [flag]: [u8; 1] = read_array(&mut cursor)?;
                Message::Status(Status {
                    success: flag != 0,
                    message: read_string(&mut cursor)?,
                })
            }
        };

        if cursor.position() as usize != payload.len() {
            return Err(format!("Trailing bytes in {} payload", msg_type.as_str()));
        }

        Ok(message)
    }
}

fn read_list<T: Serializable, R: Read>(reader: &mut R) -> Result<Vec<T>, String> {
    let count = read_count(reader)?;
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        items.push(T::read_from(reader)?);
    }
    Ok(items)
}
