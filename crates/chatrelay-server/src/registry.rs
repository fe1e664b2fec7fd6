//! Connection registry for nickname-tagged live connections.
//!
//! The registry is an ordered list of `(nickname, connection)` entries behind
//! a single mutex. Every operation takes that lock for an O(entries) in-memory
//! critical section and never performs I/O while holding it: broadcast works
//! on a [`snapshot`](ConnectionRegistry::snapshot), and
//! [`remove`](ConnectionRegistry::remove) closes the removed connection only
//! after the lock is released.
//!
//! Nicknames are not unique. Connection identities are.

use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    connection::{ConnectionHandle, ConnectionId},
    error::RegistryError,
};

/// A registered connection and the nickname it announced.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Nickname from the handshake, decoded for display
    pub nickname: String,
    /// Shared write handle
    pub connection: ConnectionHandle,
}

impl RegistryEntry {
    /// Identity of the entry's connection.
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }
}

/// Registry of live, nickname-tagged connections.
///
/// One instance per server, shared by every session through an `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Entries in registration order
    entries: Mutex<Vec<RegistryEntry>>,
    /// Next connection id to hand out
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh connection identity.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<RegistryEntry>>, RegistryError> {
        self.entries.lock().map_err(|_| RegistryError::Poisoned)
    }

    /// Register a connection under `nickname`.
    ///
    /// Duplicate nicknames are accepted. A connection id that is already
    /// present is rejected. Returns the number of registered connections
    /// including the new one.
    pub fn add(
        &self,
        nickname: impl Into<String>,
        connection: ConnectionHandle,
    ) -> Result<usize, RegistryError> {
        let mut entries = self.lock()?;
        if entries.iter().any(|e| e.connection == connection) {
            return Err(RegistryError::AlreadyRegistered(connection.id()));
        }

        entries.push(RegistryEntry { nickname: nickname.into(), connection });
        Ok(entries.len())
    }

    /// Remove the entry for `id` and close its connection.
    ///
    /// Returns the removed entry, or `None` if `id` was not registered.
    /// Removing an absent id is not an error, so every exit path of a session
    /// may call this.
    pub async fn remove(&self, id: ConnectionId) -> Result<Option<RegistryEntry>, RegistryError> {
        let removed = {
            let mut entries = self.lock()?;
            entries.iter().position(|e| e.id() == id).map(|index| entries.remove(index))
        };

        if let Some(entry) = &removed {
            if let Err(e) = entry.connection.close().await {
                tracing::debug!(connection = %id, error = %e, "shutdown after removal failed");
            }
        }

        Ok(removed)
    }

    /// Point-in-time copy of all entries, in registration order.
    pub fn snapshot(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        Ok(self.lock()?.clone())
    }

    /// Check if a connection is registered.
    pub fn contains(&self, id: ConnectionId) -> Result<bool, RegistryError> {
        Ok(self.lock()?.iter().any(|e| e.id() == id))
    }

    /// Nicknames of all registered connections, in registration order.
    pub fn nicknames(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.lock()?.iter().map(|e| e.nickname.clone()).collect())
    }

    /// Number of registered connections.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.len())
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.lock()?.is_empty())
    }
}
