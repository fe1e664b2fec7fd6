//! Chat relay binary.
//!
//! # Usage
//!
//! ```bash
//! # Relay chat for everyone who connects on port 6667
//! chatrelay server
//!
//! # Join a relay; prompts for the server address and a nickname
//! chatrelay client --port 6667
//! ```
//!
//! In the client, every typed line is sent to the room. A line reading `:q`
//! leaves.

mod prompt;

use chatrelay_client::{ClientConfig, RemoteClient};
use chatrelay_server::{DEFAULT_PORT, Server, ServerConfig};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Minimal TCP chat relay
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(about = "Broadcast chat relay over plain TCP")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept connections and relay every message to all other participants
    Server {
        /// Address to bind to
        #[arg(short, long, default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
        bind: String,
    },
    /// Connect to a relay and chat from the terminal
    Client {
        /// Server port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.command {
        Command::Server { bind } => {
            tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
            run_server(bind).await
        },
        Command::Client { port } => {
            // stdout carries the conversation
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            run_client(port).await
        },
    }
}

async fn run_server(bind_address: String) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Chat relay starting");
    tracing::info!("Binding to {}", bind_address);

    let server = Server::bind(ServerConfig { bind_address }).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}

async fn run_client(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    let address =
        prompt::ask(&mut input, &mut output, "Enter the server's IP address: ", "address").await?;
    // The nickname goes out verbatim; the address only has to resolve
    let server_host = address.trim().to_string();
    let nickname =
        prompt::ask(&mut input, &mut output, "Enter your nickname: ", "nickname").await?;

    let config = ClientConfig { server_host, port, nickname };
    let client = RemoteClient::connect(&config).await?;

    let summary = client.run(input, output).await?;
    tracing::debug!(lines_sent = summary.lines_sent, "left the chat");

    Ok(())
}
