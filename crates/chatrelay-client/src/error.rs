//! Client error types.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`RemoteClient`](crate::RemoteClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address that was dialled
        addr: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Socket or local I/O failed after connecting.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The receive task panicked.
    #[error("receive task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_names_address() {
        let err = ClientError::Connect {
            addr: "10.0.0.1:6667".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.to_string(), "failed to connect to 10.0.0.1:6667: refused");
        assert!(std::error::Error::source(&err).is_some());
    }
}
