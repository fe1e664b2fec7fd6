//! Per-connection receive loop.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────────┐  nickname   ┌────────┐  EOF / read error  ┌────────┐
//! │ AwaitingNickname │────────────>│ Active │───────────────────>│ Closed │
//! └──────────────────┘             └────────┘                    └────────┘
//!          │                         │    ^                          ^
//!          │ EOF / read error        └────┘ chunk → broadcast        │
//!          └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The session registers on entering `Active` and removes itself exactly once
//! on reaching `Closed`, whatever the cause. There is no message framing: a
//! message is whatever one read of at most [`MAX_CHUNK`] bytes returns, so
//! application lines may be split or merged. Chunks are relayed as raw bytes,
//! so a multi-byte character cut by a read boundary is reassembled by the
//! recipient.

use std::{io, net::SocketAddr};

use bytes::{Bytes, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadHalf},
    task::JoinHandle,
};

use crate::{
    broadcaster::Broadcaster,
    connection::{ConnectionHandle, ConnectionId},
};

/// Upper bound on bytes taken from the socket per read.
pub const MAX_CHUNK: usize = 1024;

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, waiting for the first chunk (the nickname)
    AwaitingNickname,
    /// Registered and relaying
    Active {
        /// Nickname announced in the handshake, as sent
        nickname: Bytes,
    },
    /// Terminal; the connection has been deregistered
    Closed,
}

/// Result of one read from the connection.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A chunk of at most [`MAX_CHUNK`] bytes, exactly as read
    Data(Bytes),
    /// The peer closed its write side
    EndOfStream,
    /// The read failed
    Failed(io::Error),
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Connection identity
    pub id: ConnectionId,
    /// Nickname decoded for display, if the handshake completed
    pub nickname: Option<String>,
    /// Chunks handed to the broadcaster
    pub messages_relayed: usize,
}

/// Receive loop for one connection.
pub struct ClientSession<S> {
    reader: ReadHalf<S>,
    connection: ConnectionHandle,
    broadcaster: Broadcaster,
    buf: BytesMut,
    nickname: Option<String>,
    messages_relayed: usize,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Take ownership of `stream` under a fresh connection identity.
    pub fn new(stream: S, broadcaster: Broadcaster) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        let id = broadcaster.registry().next_id();

        Self {
            reader,
            connection: ConnectionHandle::new(id, writer),
            broadcaster,
            buf: BytesMut::with_capacity(MAX_CHUNK),
            nickname: None,
            messages_relayed: 0,
        }
    }

    /// Identity of this session's connection.
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Drive the session until the connection ends.
    pub async fn run(mut self) -> SessionSummary {
        let mut state = SessionState::AwaitingNickname;
        while state != SessionState::Closed {
            state = self.step(state).await;
        }

        self.close().await;

        SessionSummary {
            id: self.id(),
            nickname: self.nickname,
            messages_relayed: self.messages_relayed,
        }
    }

    async fn step(&mut self, state: SessionState) -> SessionState {
        match state {
            SessionState::AwaitingNickname => match self.read_chunk().await {
                ReadOutcome::Data(nickname) => self.activate(nickname),
                outcome => self.end(&outcome),
            },
            SessionState::Active { nickname } => match self.read_chunk().await {
                ReadOutcome::Data(message) => {
                    match self.broadcaster.broadcast(&nickname, &message, self.id()).await {
                        Ok(_) => {
                            self.messages_relayed += 1;
                            SessionState::Active { nickname }
                        },
                        Err(e) => {
                            tracing::error!(connection = %self.id(), error = %e, "broadcast failed");
                            SessionState::Closed
                        },
                    }
                },
                outcome => self.end(&outcome),
            },
            SessionState::Closed => SessionState::Closed,
        }
    }

    async fn read_chunk(&mut self) -> ReadOutcome {
        self.buf.clear();
        self.buf.resize(MAX_CHUNK, 0);

        match self.reader.read(&mut self.buf[..]).await {
            Ok(0) => ReadOutcome::EndOfStream,
            Ok(n) => ReadOutcome::Data(self.buf.split_to(n).freeze()),
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    fn activate(&mut self, nickname: Bytes) -> SessionState {
        let display_name = String::from_utf8_lossy(&nickname).into_owned();
        let registry = self.broadcaster.registry();
        let online = match registry.add(display_name.clone(), self.connection.clone()) {
            Ok(online) => online,
            Err(e) => {
                tracing::error!(connection = %self.id(), error = %e, "registration failed");
                return SessionState::Closed;
            },
        };

        tracing::info!(connection = %self.id(), online, "User {} has joined the chat.", display_name);
        self.nickname = Some(display_name);
        SessionState::Active { nickname }
    }

    fn end(&self, outcome: &ReadOutcome) -> SessionState {
        match outcome {
            ReadOutcome::Failed(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                tracing::info!(connection = %self.id(), "Client disconnected.");
            },
            ReadOutcome::Failed(e) => {
                tracing::warn!(connection = %self.id(), error = %e, "error handling client");
            },
            ReadOutcome::EndOfStream | ReadOutcome::Data(_) => {
                tracing::debug!(connection = %self.id(), "end of stream");
            },
        }
        SessionState::Closed
    }

    async fn close(&mut self) {
        match self.broadcaster.registry().remove(self.id()).await {
            Ok(Some(entry)) => {
                tracing::info!(connection = %self.id(), "{} has left the chat.", entry.nickname);
            },
            Ok(None) => {
                tracing::debug!(connection = %self.id(), "closed before registering");
            },
            Err(e) => {
                tracing::error!(connection = %self.id(), error = %e, "deregistration failed");
            },
        }
    }
}

/// Spawn a [`ClientSession`] for an accepted stream.
///
/// Fire-and-forget: callers may drop the returned handle.
pub fn serve_connection<S>(
    stream: S,
    peer: SocketAddr,
    broadcaster: Broadcaster,
) -> JoinHandle<SessionSummary>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let session = ClientSession::new(stream, broadcaster);
    tracing::debug!(connection = %session.id(), %peer, "accepted connection");
    tokio::spawn(session.run())
}
