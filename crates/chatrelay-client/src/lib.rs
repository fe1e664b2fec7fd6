//! Client
//!
//! Terminal-side counterpart of `chatrelay-server`. Connects over TCP,
//! announces a nickname, then concurrently prints relayed chat and sends
//! locally typed lines.
//!
//! # Components
//!
//! - [`RemoteClient`]: connected client; [`RemoteClient::run`] drives both
//!   directions until the user quits
//! - [`send_lines`]: input-to-socket loop, stops at [`QUIT_COMMAND`]
//! - [`receive_into`]: socket-to-output copy loop
//!
//! The loops are generic over Tokio I/O traits so the binary can wire them to
//! stdin/stdout and tests can wire them to in-memory buffers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{
    ClientConfig, ClientSummary, DEFAULT_PORT, QUIT_COMMAND, RemoteClient, receive_into,
    send_lines,
};
pub use error::ClientError;
