//! Connection identity and the shared write handle.
//!
//! A session owns the read half of its stream. The write half is wrapped in a
//! [`ConnectionHandle`] which the registry and every concurrent broadcast can
//! clone. Clones share one writer behind an async mutex, so two broadcasts
//! targeting the same recipient each land a whole line.

use std::{fmt, io, sync::Arc};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

/// Boxed write half of a connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Opaque, process-unique connection identity.
///
/// Allocated by [`ConnectionRegistry::next_id`](crate::ConnectionRegistry::next_id).
/// Equality on this id is what excludes a sender from its own broadcast and
/// locates the registry entry on removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared write side of a live connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    writer: Arc<Mutex<BoxedWriter>>,
}

impl ConnectionHandle {
    /// Wrap a writer under the given identity.
    pub fn new<W>(id: ConnectionId, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self { id, writer: Arc::new(Mutex::new(Box::new(writer))) }
    }

    /// Identity of this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Write all of `bytes` and flush.
    pub async fn send(&self, bytes: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }

    /// Shut down the write side, signalling end-of-stream to the peer.
    pub async fn close(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn send_writes_whole_buffer() {
        let (local, mut remote) = tokio::io::duplex(64);
        let handle = ConnectionHandle::new(ConnectionId::new(1), local);

        handle.send(b"alice: hi\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = remote.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"alice: hi\n");
    }

    #[tokio::test]
    async fn close_signals_end_of_stream() {
        let (local, mut remote) = tokio::io::duplex(64);
        let handle = ConnectionHandle::new(ConnectionId::new(1), local);

        handle.close().await.unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(remote.read(&mut buf).await.unwrap(), 0);
    }

    #[test]
    fn equality_is_by_identity() {
        let (a, _ra) = tokio::io::duplex(8);
        let (b, _rb) = tokio::io::duplex(8);

        let first = ConnectionHandle::new(ConnectionId::new(3), a);
        let same_id = ConnectionHandle::new(ConnectionId::new(3), b);

        assert_eq!(first, first.clone());
        assert_eq!(first, same_id);
        assert_eq!(ConnectionId::new(3).to_string(), "#3");
    }
}
