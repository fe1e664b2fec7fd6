//! Fan-out of one message to every registered connection but its sender.
//!
//! Delivery works on a registry snapshot, so slow or stalled recipients never
//! hold the registry lock. Each recipient is written independently: a failed
//! write is logged and reported, and the loop moves on. A failed recipient
//! stays registered. Only its own session removes it, once its read side
//! fails.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::{connection::ConnectionId, error::RegistryError, registry::ConnectionRegistry};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose write succeeded
    pub delivered: usize,
    /// Recipients whose write failed
    pub failed: Vec<ConnectionId>,
}

/// Broadcasts chat lines through a shared [`ConnectionRegistry`].
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster delivers through.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Deliver `message` from `nickname` to everyone except `originator`.
    ///
    /// Both are relayed byte for byte; nothing is decoded or validated.
    /// Recipients are the registry contents at call time. A connection that
    /// registers afterwards does not receive this message.
    pub async fn broadcast(
        &self,
        nickname: &[u8],
        message: &[u8],
        originator: ConnectionId,
    ) -> Result<BroadcastReport, RegistryError> {
        let line = format_line(nickname, message);
        let mut report = BroadcastReport::default();

        for entry in self.registry.snapshot()? {
            if entry.id() == originator {
                continue;
            }

            match entry.connection.send(&line).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        recipient = %entry.nickname,
                        connection = %entry.id(),
                        error = %e,
                        "error sending message"
                    );
                    report.failed.push(entry.id());
                },
            }
        }

        Ok(report)
    }
}

/// Render the relayed form of a chat message: `<nickname>: <message>\n`.
pub fn format_line(nickname: &[u8], message: &[u8]) -> Bytes {
    let mut line = BytesMut::with_capacity(nickname.len() + message.len() + 3);
    line.put_slice(nickname);
    line.put_slice(b": ");
    line.put_slice(message);
    line.put_u8(b'\n');
    line.freeze()
}
