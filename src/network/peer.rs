// Peer connection management

use crate::consensus::ChainSource;
use crate::core::Block;
use crate::network::message::{HEADER_LEN, Message};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use std::time::Duration;

/// Write one framed message
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &Message) -> Result<(), String> {
    let bytes = message.serialize()?;
    writer
        .write_all(&bytes)
        .await
        .map_err(|e| format!("Failed to send message: {}", e))?;

    writer
        .flush()
        .await
        .map_err(|e| format!("Failed to flush: {}", e))
}

/// Read one framed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, String> {
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| format!("Failed to read header: {}", e))?;

    let (msg_type, payload_len) = Message::parse_header(&header)?;

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader
            .read_exact(&mut payload)
            .await
            .map_err(|e| format!("Failed to read payload: {}", e))?;
    }

    Message::from_payload(msg_type, &payload)
}

/// Outbound connection to another node. One request, one response.
pub struct Peer {
    addr: String,
    stream: TcpStream,
    request_timeout: Duration,
}

impl Peer {
    /// Connect to a peer, giving up after `request_timeout`
    pub async fn connect(addr: &str, request_timeout: Duration) -> Result<Self, String> {
        let stream = timeout(request_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| format!("Timed out connecting to {}", addr))?
            .map_err(|e| format!("Failed to connect to {}: {}", addr, e))?;

        Ok(Self {
            addr: addr.to_string(),
            stream,
            request_timeout,
        })
    }

    /// Send a request and wait for the response
    pub async fn request(&mut self, message: &Message) -> Result<Message, String> {
        write_message(&mut self.stream, message).await?;

        timeout(self.request_timeout, read_message(&mut self.stream))
            .await
            .map_err(|_| format!("Timed out waiting for {}", self.addr))?
    }

    /// Connect, send one request and return the response
    pub async fn exchange(addr: &str, message: &Message, request_timeout: Duration) -> Result<Message, String> {
        let mut peer = Self::connect(addr, request_timeout).await?;
        peer.request(message).await
    }
}

/// Fetches chains from other nodes over TCP
#[derive(Debug, Clone)]
pub struct NetworkChainSource {
    pub request_timeout: Duration,
}

impl NetworkChainSource {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl ChainSource for NetworkChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, String> {
        match Peer::exchange(peer, &Message::GetChain, self.request_timeout).await? {
            Message::Chain(chain) => Ok(chain),
            other => Err(format!("Unexpected reply to getchain: {:?}", other.message_type())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::Status;

    #[tokio::test]
    async fn test_framed_messages_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        write_message(&mut client, &Message::GetBalance("addr".to_string())).await.unwrap();
        let received = read_message(&mut server).await.unwrap();
        assert_eq!(received, Message::GetBalance("addr".to_string()));

        write_message(&mut server, &Message::Status(Status::success("ok"))).await.unwrap();
        assert_eq!(read_message(&mut client).await.unwrap(), Message::Status(Status::success("ok")));
    }

    #[tokio::test]
    async fn test_read_fails_on_closed_stream() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_message(&mut server).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_chain_from_closed_port_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let source = NetworkChainSource::new(Duration::from_millis(500));
        assert!(source.fetch_chain(&addr).await.is_err());
    }
}
