//! Connection to a chatrelay server.
//!
//! [`RemoteClient::connect`] dials the server and sends the nickname. After
//! that, [`RemoteClient::run`] runs two halves concurrently: a spawned task
//! copying everything the server relays to an output sink, and a send loop
//! forwarding each input line until [`QUIT_COMMAND`] or end of input.

use bytes::BytesMut;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::error::ClientError;

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 6667;

/// Input line that ends the session. Never transmitted.
pub const QUIT_COMMAND: &str = ":q";

/// Bytes read from the server per chunk.
const READ_CHUNK: usize = 1024;

/// Where to connect and who to be.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub server_host: String,
    /// Server port
    pub port: u16,
    /// Nickname announced on connect
    pub nickname: String,
}

impl ClientConfig {
    /// Config for `server_host` on the default port.
    pub fn new(server_host: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self { server_host: server_host.into(), port: DEFAULT_PORT, nickname: nickname.into() }
    }
}

/// What a finished client run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSummary {
    /// Lines transmitted to the server
    pub lines_sent: usize,
}

/// A connected chat client that has completed its handshake.
pub struct RemoteClient {
    nickname: String,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl RemoteClient {
    /// Connect to the server and send the nickname.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let addr = format!("{}:{}", config.server_host, config.port);
        let stream = TcpStream::connect((config.server_host.as_str(), config.port))
            .await
            .map_err(|source| ClientError::Connect { addr: addr.clone(), source })?;

        let (reader, mut writer) = stream.into_split();
        writer.write_all(config.nickname.as_bytes()).await?;

        tracing::debug!(%addr, nickname = %config.nickname, "connected");

        Ok(Self { nickname: config.nickname.clone(), reader, writer })
    }

    /// Nickname sent during the handshake.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Relay `input` lines to the server while copying broadcasts to `output`.
    ///
    /// Returns when the input yields [`QUIT_COMMAND`] or ends. The connection
    /// is closed on the way out and the receive task is stopped.
    pub async fn run<I, O>(self, input: I, output: O) -> Result<ClientSummary, ClientError>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Send + Unpin + 'static,
    {
        let Self { reader, mut writer, .. } = self;

        let receiver = tokio::spawn(receive_into(reader, output));
        let sent = send_lines(input, &mut writer).await;

        if let Err(e) = writer.shutdown().await {
            tracing::debug!(error = %e, "shutdown failed");
        }

        receiver.abort();
        match receiver.await {
            Ok(Ok(bytes)) => tracing::debug!(bytes, "receive task finished"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Error receiving message"),
            Err(e) if e.is_cancelled() => {},
            Err(e) => return Err(ClientError::Task(e.to_string())),
        }

        Ok(ClientSummary { lines_sent: sent? })
    }
}

/// Forward lines from `input` to `writer` until [`QUIT_COMMAND`] or end of
/// input.
///
/// Line terminators are stripped and nothing is appended: each line goes out
/// as bare text. Empty lines carry no bytes and are skipped. Returns the
/// number of lines sent.
pub async fn send_lines<I, W>(input: I, writer: &mut W) -> Result<usize, ClientError>
where
    I: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        if line == QUIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }

        writer.write_all(line.as_bytes()).await?;
        sent += 1;
    }

    Ok(sent)
}

/// Copy everything the server sends to `output` until the connection ends.
///
/// A reset connection counts as a normal end. Returns the number of bytes
/// copied.
pub async fn receive_into<R, O>(mut reader: R, mut output: O) -> Result<u64, ClientError>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut copied = 0u64;

    loop {
        buf.clear();
        buf.resize(READ_CHUNK, 0);

        let n = match reader.read(&mut buf[..]).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                tracing::info!("Connection has been closed.");
                break;
            },
            Err(e) => return Err(e.into()),
        };

        output.write_all(&buf[..n]).await?;
        output.flush().await?;
        copied += n as u64;
    }

    Ok(copied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::io::duplex;

    use super::*;

    #[tokio::test]
    async fn quit_command_stops_without_sending() {
        let input: &[u8] = b"hello\n:q\nnever sent\n";
        let mut wire = Vec::new();

        let sent = send_lines(input, &mut wire).await.unwrap();

        assert_eq!(sent, 1);
        assert_eq!(wire, b"hello");
    }

    #[tokio::test]
    async fn end_of_input_stops_the_loop() {
        let input: &[u8] = b"one\ntwo";
        let mut wire = Vec::new();

        let sent = send_lines(input, &mut wire).await.unwrap();

        assert_eq!(sent, 2);
        assert_eq!(wire, b"onetwo");
    }

    #[tokio::test]
    async fn quit_must_match_the_whole_line() {
        let input: &[u8] = b" :q\n:quit\n:q\r\n";
        let mut wire = Vec::new();

        let sent = send_lines(input, &mut wire).await.unwrap();

        assert_eq!(sent, 2);
        assert_eq!(wire, b" :q:quit");
    }

    #[tokio::test]
    async fn empty_lines_are_skipped() {
        let input: &[u8] = b"\n\nhi\n";
        let mut wire = Vec::new();

        assert_eq!(send_lines(input, &mut wire).await.unwrap(), 1);
        assert_eq!(wire, b"hi");
    }

    #[tokio::test]
    async fn receive_copies_until_end_of_stream() {
        let (mut server, client) = duplex(4096);
        let mut output = Vec::new();

        server.write_all(b"alice: hello\nbob: hi\n").await.unwrap();
        drop(server);

        let copied = receive_into(client, &mut output).await.unwrap();

        assert_eq!(copied, 21);
        assert_eq!(output, b"alice: hello\nbob: hi\n");
    }

    #[test]
    fn config_defaults_to_port_6667() {
        let config = ClientConfig::new("127.0.0.1", "alice");
        assert_eq!(config.port, 6667);
        assert_eq!(config.nickname, "alice");
    }
}
