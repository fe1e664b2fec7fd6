//! TCP listen loop.

use std::{future::Future, net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;

use crate::{
    broadcaster::Broadcaster, error::ServerError, registry::ConnectionRegistry,
    session::serve_connection,
};

/// Port the relay listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 6667;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:6667")
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: format!("0.0.0.0:{DEFAULT_PORT}") }
    }
}

/// Chat relay server.
///
/// Owns the listening socket and the registry shared by every session it
/// spawns.
pub struct Server {
    listener: TcpListener,
    broadcaster: Broadcaster,
}

impl Server {
    /// Create and bind a new server.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let address = config.bind_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        let listener = TcpListener::bind(addr).await?;
        let broadcaster = Broadcaster::new(Arc::new(ConnectionRegistry::new()));

        Ok(Self { listener, broadcaster })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Registry of connections currently in the chat.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(self.broadcaster.registry())
    }

    /// Accept connections until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for interrupt: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Each connection gets its own session task. Sessions are not joined on
    /// the way out: they keep running until their peer leaves or the process
    /// exits. The listening socket is released however the loop ends.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            "Chat server is listening for incoming connections on {}",
            self.listener.local_addr()?
        );

        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Server shutting down.");
                    break Ok(());
                },
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        serve_connection(stream, peer, self.broadcaster.clone());
                    },
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                        break Err(ServerError::Transport(e));
                    },
                },
            }
        };

        drop(self.listener);
        result
    }
}
