//! Simulated relay server for testing with turmoil.
//!
//! `SimRelay` runs the production session logic over turmoil's deterministic
//! TCP. Sessions are generic over the stream type, so the only
//! simulation-specific part is the accept loop.

use std::{io, sync::Arc};

use chatrelay_server::{Broadcaster, ConnectionRegistry, serve_connection};
use turmoil::net::TcpListener;

/// Host name the relay runs under in a simulation.
pub const RELAY_HOST: &str = "relay";

/// Port the simulated relay listens on.
pub const RELAY_PORT: u16 = 6667;

/// Relay server bound to a turmoil listener.
pub struct SimRelay {
    /// Listener for incoming simulated connections
    listener: TcpListener,
    /// Shared with every session spawned by this relay
    broadcaster: Broadcaster,
}

impl SimRelay {
    /// Bind a relay on `address` that registers connections in `registry`.
    ///
    /// The registry is supplied by the caller so simulated clients can
    /// observe it from outside the relay host.
    pub async fn bind(address: &str, registry: Arc<ConnectionRegistry>) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener, broadcaster: Broadcaster::new(registry) })
    }

    /// Registry of connections currently in the chat.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.broadcaster.registry()
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            serve_connection(stream, peer, self.broadcaster.clone());
        }
    }
}

/// Register a relay host on `sim` that shares `registry`.
///
/// The host is restartable: each (re)start binds a fresh listener over the
/// same registry.
pub fn host_relay(sim: &mut turmoil::Sim<'_>, registry: &Arc<ConnectionRegistry>) {
    let registry = Arc::clone(registry);
    sim.host(RELAY_HOST, move || {
        let registry = Arc::clone(&registry);
        async move {
            let relay = SimRelay::bind(&format!("0.0.0.0:{RELAY_PORT}"), registry).await?;
            tracing::debug!("simulated relay listening");
            relay.run().await?;
            Ok(())
        }
    });
}
