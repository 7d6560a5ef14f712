//! Minimal HTTP control server.
//!
//! Understands exactly two requests:
//! - `GET /set?left=<int>&right=<int>[&stop=1]` updates the [`CommandCell`]
//!   and answers `OK`
//! - anything else gets the cached [`ControlPage`]
//!
//! At most `max_clients` connections are served at once. Extra connections
//! get a fixed 503 and are closed without being counted. Every served
//! connection holds a [`ConnectionGuard`] for its whole life, so the count is
//! right however the connection ends.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use f01_rover::services::{CommandCell, ControlPage, ControlServer};
//!
//! # async fn run() -> std::io::Result<()> {
//! let commands = Arc::new(CommandCell::new());
//! let server = ControlServer::bind("0.0.0.0:80", 2, commands, ControlPage::embedded()).await?;
//! match server.run().await {}
//! # }
//! ```

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::parsing::{CommandUpdate, Request};

use super::page::ControlPage;
use super::shared::{CommandCell, ConnectionCounter, ConnectionGuard};

/// Reply to a successful `/set` request.
pub const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nOK";

/// Reply when a connection fails mid-request.
pub const INTERNAL_ERROR_RESPONSE: &str =
    "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\n\r\nInternal Server Error";

const HTML_HEADER: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n";

/// Longest request or header line accepted, newline included.
pub const MAX_LINE_LEN: usize = 1024;

/// Pause after a failed `accept` so a persistent error doesn't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Reply sent to connections over the cap.
pub fn busy_response(max_clients: usize) -> String {
    format!(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Type: text/plain\r\n\r\n\
         Only {} controllers can be connected at the same time!",
        max_clients
    )
}

/// TCP listener feeding commands into a [`CommandCell`].
pub struct ControlServer {
    listener: TcpListener,
    commands: Arc<CommandCell>,
    connections: Arc<ConnectionCounter>,
    page: ControlPage,
}

impl ControlServer {
    /// Bind the listener. Nothing is accepted until [`run`](Self::run).
    pub async fn bind(
        addr: impl ToSocketAddrs,
        max_clients: usize,
        commands: Arc<CommandCell>,
        page: ControlPage,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            commands,
            connections: Arc::new(ConnectionCounter::new(max_clients)),
            page,
        })
    }

    /// Address actually bound (useful after binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Where accepted commands are published.
    pub fn command_cell(&self) -> &Arc<CommandCell> {
        &self.commands
    }

    /// Live connection count.
    pub fn connections(&self) -> &Arc<ConnectionCounter> {
        &self.connections
    }

    /// Accept connections forever, one task per connection.
    pub async fn run(self) -> Infallible {
        if let Ok(addr) = self.local_addr() {
            log::info!("[HTTP] F0.1 control server listening on http://{}", addr);
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::warn!("[HTTP] accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            // Slot taken here, before spawning, so the cap is exact
            match self.connections.try_acquire() {
                Some(guard) => {
                    log::debug!(
                        "[HTTP] {} connected ({}/{})",
                        peer,
                        self.connections.active(),
                        self.connections.max()
                    );
                    let commands = Arc::clone(&self.commands);
                    let page = self.page.clone();
                    tokio::spawn(serve(stream, peer, commands, page, guard));
                }
                None => {
                    log::info!("[HTTP] {} rejected, server full", peer);
                    tokio::spawn(reject(stream, self.connections.max()));
                }
            }
        }
    }
}

async fn reject(mut stream: TcpStream, max_clients: usize) {
    let _ = stream.write_all(busy_response(max_clients).as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn serve(
    mut stream: TcpStream,
    peer: SocketAddr,
    commands: Arc<CommandCell>,
    page: ControlPage,
    _guard: ConnectionGuard,
) {
    if let Err(e) = handle(&mut stream, &commands, &page).await {
        log::warn!("[HTTP] error handling request from {}: {}", peer, e);
        let _ = stream.write_all(INTERNAL_ERROR_RESPONSE.as_bytes()).await;
    }
    let _ = stream.shutdown().await;
    log::debug!("[HTTP] {} closed", peer);
}

/// Read one request and write its reply.
async fn handle(
    stream: &mut TcpStream,
    commands: &CommandCell,
    page: &ControlPage,
) -> io::Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    if read_bounded_line(&mut reader, &mut request_line).await? == 0 {
        return Ok(());
    }

    let mut header = String::new();
    loop {
        header.clear();
        let n = read_bounded_line(&mut reader, &mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    match Request::parse(&request_line) {
        Request::Set(query) => {
            let update = CommandUpdate::parse(query);
            let cmd = commands.update(|current| update.apply(current));
            log::debug!("[HTTP] set left={} right={}", cmd.left, cmd.right);
            writer.write_all(OK_RESPONSE.as_bytes()).await?;
        }
        Request::Page => {
            writer.write_all(HTML_HEADER.as_bytes()).await?;
            writer.write_all(page.html().as_bytes()).await?;
        }
    }
    writer.flush().await
}

/// `read_line` that gives up after [`MAX_LINE_LEN`] bytes without a newline.
async fn read_bounded_line<R>(reader: &mut R, line: &mut String) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let n = reader.take(MAX_LINE_LEN as u64).read_line(line).await?;
    if n == MAX_LINE_LEN && !line.ends_with('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "request line too long",
        ));
    }
    Ok(n)
}
