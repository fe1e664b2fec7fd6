//! Server error types.
//!
//! Two layers: [`RegistryError`] for the shared connection registry and
//! [`ServerError`] for everything the listen loop can surface to the binary.
//! Per-connection failures (resets, broken pipes) are not errors at this
//! level; sessions log them and move to `Closed`.

use std::io;

use thiserror::Error;

use crate::connection::ConnectionId;

/// Errors from [`ConnectionRegistry`](crate::ConnectionRegistry) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry lock was poisoned by a panicking holder.
    ///
    /// Not expected in practice: no code path panics while holding the lock.
    /// Fatal for the calling session.
    #[error("connection registry lock poisoned")]
    Poisoned,

    /// A connection with this identity is already registered.
    ///
    /// A connection appears at most once. Hitting this indicates a session
    /// tried to register twice, which is a logic bug.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}

/// Errors that can occur in the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error (unparsable bind address).
    ///
    /// Fatal at startup. Fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, address in use, etc.).
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Registry failure surfaced outside a session.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
