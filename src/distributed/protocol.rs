//! Coordinator/worker protocol
//!
//! One request, one reply per TCP connection. Messages are serialized with
//! MessagePack (rmp-serde) and framed with a length prefix.
//!
//! # Protocol Version
//!
//! Current version: 1
//!
//! # Message Flow
//!
//! ```text
//! Coordinator                     Worker
//!     |                              |
//!     |---- TRANSFORM(records) ----->|
//!     |                              |
//!     |<--- TRANSFORMED(records) ----|   or
//!     |<--- ERROR(reason) -----------|
//! ```
//!
//! # Message Framing
//!
//! Each message is prefixed with a 4-byte length field (little-endian u32):
//!
//! ```text
//! [4 bytes: message length][N bytes: MessagePack-serialized message]
//! ```

use crate::cut::CutArgs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version
///
/// Coordinator and workers must agree on it; workers reject other versions.
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest accepted frame body
pub const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Protocol message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Shard to transform (Coordinator → Worker)
    Transform(TransformRequest),

    /// Transformed shard (Worker → Coordinator)
    Transformed(TransformResponse),

    /// Request rejected or failed (Worker → Coordinator)
    Error(ErrorMessage),
}

/// Transform request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub protocol_version: u32,

    /// Correlates logs on both sides
    pub request_id: String,

    /// Shard records
    pub records: Vec<String>,

    /// Cut parameters shared by every shard
    pub args: CutArgs,
}

/// Transform reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResponse {
    pub request_id: String,
    pub records: Vec<String>,
}

/// Error reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Worker identifier (hostname)
    pub node_id: String,

    /// Request this answers, empty if the request could not be decoded
    pub request_id: String,

    /// Error description
    pub error: String,
}

/// Serialize a message with its length prefix
pub fn serialize_message(msg: &Message) -> Result<Vec<u8>> {
    let msg_bytes = rmp_serde::to_vec(msg).context("Failed to serialize message")?;

    if msg_bytes.len() > MAX_MESSAGE_LEN {
        anyhow::bail!(
            "Message too large: {} bytes (max {} bytes)",
            msg_bytes.len(),
            MAX_MESSAGE_LEN
        );
    }

    let msg_len = msg_bytes.len() as u32;
    let mut framed = Vec::with_capacity(4 + msg_bytes.len());
    framed.extend_from_slice(&msg_len.to_le_bytes());
    framed.extend_from_slice(&msg_bytes);

    Ok(framed)
}

/// Deserialize one framed message from a buffer
///
/// Returns the message and the number of bytes consumed, prefix included.
pub fn deserialize_message(buf: &[u8]) -> Result<(Message, usize)> {
    if buf.len() < 4 {
        anyhow::bail!("Buffer too small for message length (need 4 bytes, got {})", buf.len());
    }

    let msg_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if buf.len() < 4 + msg_len {
        anyhow::bail!("Incomplete message (need {} bytes, got {})", 4 + msg_len, buf.len());
    }

    let msg = rmp_serde::from_slice(&buf[4..4 + msg_len]).context("Failed to deserialize message")?;

    Ok((msg, 4 + msg_len))
}

/// Read one framed message
pub async fn read_message<S>(stream: &mut S) -> Result<Message>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .context("Failed to read message length")?;

    let msg_len = u32::from_le_bytes(len_buf) as usize;
    if msg_len > MAX_MESSAGE_LEN {
        anyhow::bail!("Message too large: {} bytes (max {} bytes)", msg_len, MAX_MESSAGE_LEN);
    }

    let mut msg_buf = vec![0u8; msg_len];
    stream
        .read_exact(&mut msg_buf)
        .await
        .context("Failed to read message body")?;

    let msg = rmp_serde::from_slice(&msg_buf).context("Failed to deserialize message")?;

    Ok(msg)
}

/// Write one framed message and flush
pub async fn write_message<S>(stream: &mut S, msg: &Message) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let framed = serialize_message(msg)?;

    stream.write_all(&framed).await.context("Failed to write message")?;
    stream.flush().await.context("Failed to flush stream")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Message {
        Message::Transform(TransformRequest {
            protocol_version: PROTOCOL_VERSION,
            request_id: "req-1".to_string(),
            records: vec!["a b".to_string(), "c d".to_string()],
            args: CutArgs::new("2", " ", false).unwrap(),
        })
    }

    #[test]
    fn test_serialize_deserialize_transform() {
        let msg = request();

        let bytes = serialize_message(&msg).unwrap();
        let (deserialized, consumed) = deserialize_message(&bytes).unwrap();

        assert_eq!(consumed, bytes.len());
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn test_serialize_deserialize_error() {
        let msg = Message::Error(ErrorMessage {
            node_id: "worker-1".to_string(),
            request_id: "req-1".to_string(),
            error: "Test error".to_string(),
        });

        let bytes = serialize_message(&msg).unwrap();
        let (deserialized, _) = deserialize_message(&bytes).unwrap();

        match deserialized {
            Message::Error(err) => {
                assert_eq!(err.node_id, "worker-1");
                assert_eq!(err.error, "Test error");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_message_framing() {
        let bytes = serialize_message(&request()).unwrap();

        assert!(bytes.len() >= 4);
        let msg_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(bytes.len(), 4 + msg_len);
    }

    #[test]
    fn test_incomplete_buffer() {
        let bytes = serialize_message(&request()).unwrap();

        assert!(deserialize_message(&bytes[..2]).is_err());
        assert!(deserialize_message(&bytes[..bytes.len() - 1]).is_err());
    }

    #[tokio::test]
    async fn test_stream_read_write() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        write_message(&mut client, &request()).await.unwrap();
        let received = read_message(&mut server).await.unwrap();

        assert_eq!(received, request());
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_frame() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let len = (MAX_MESSAGE_LEN as u32 + 1).to_le_bytes();
        client.write_all(&len).await.unwrap();

        let err = read_message(&mut server).await.unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_read_rejects_garbage_body() {
        let (mut client, mut server) = tokio::io::duplex(64);

        client.write_all(&3u32.to_le_bytes()).await.unwrap();
        client.write_all(&[0xc1, 0xc1, 0xc1]).await.unwrap();

        assert!(read_message(&mut server).await.is_err());
    }
}
