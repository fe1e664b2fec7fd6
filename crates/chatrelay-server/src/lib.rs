//! Chatrelay server.
//!
//! A plain-TCP chat relay: every client announces a nickname, then every chunk
//! it sends is rebroadcast to all other connected clients as
//! `"<nickname>: <text>\n"`.
//!
//! # Architecture
//!
//! ```text
//!  TcpListener
//!      │ accept
//!      v
//!  ┌────────┐  spawn   ┌───────────────┐  chunk   ┌─────────────┐  snapshot  ┌────────────────────┐
//!  │ Server │─────────>│ ClientSession │─────────>│ Broadcaster │───────────>│ ConnectionRegistry │
//!  └────────┘  per     └───────────────┘          └─────────────┘            └────────────────────┘
//!              socket          │ add / remove                                        ^
//!                              └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ConnectionRegistry`]: mutex-guarded list of `(nickname, connection)`
//! - [`Broadcaster`]: snapshot-based fan-out with per-recipient failure
//!   isolation
//! - [`ClientSession`]: per-connection state machine (nickname, relay, close)
//! - [`Server`]: accept loop spawning one session task per connection
//!
//! Sessions are generic over the stream type, so the same code runs over
//! Tokio TCP in production and over simulated or in-memory streams in tests
//! (see [`serve_connection`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod broadcaster;
mod connection;
mod error;
mod registry;
mod server;
mod session;

pub use broadcaster::{BroadcastReport, Broadcaster, format_line};
pub use connection::{BoxedWriter, ConnectionHandle, ConnectionId};
pub use error::{RegistryError, ServerError};
pub use registry::{ConnectionRegistry, RegistryEntry};
pub use server::{DEFAULT_PORT, Server, ServerConfig};
pub use session::{
    ClientSession, MAX_CHUNK, ReadOutcome, SessionState, SessionSummary, serve_connection,
};
