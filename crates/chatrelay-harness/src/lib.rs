//! Deterministic simulation harness for the chat relay.
//!
//! Runs the real relay sessions on turmoil's simulated network so multi-client
//! scenarios (joins, departures, interleaved chat) replay identically on
//! every run, without real sockets or wall-clock time.
//!
//! ```text
//! sim.client("peers") ──TCP──► host "relay" (SimRelay)
//!                                 └─ serve_connection per accept
//!                                       └─ shared ConnectionRegistry
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_server;

pub use sim_server::{RELAY_HOST, RELAY_PORT, SimRelay, host_relay};
