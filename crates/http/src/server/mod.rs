//! TCP listener, accept loop and per-connection workers.
//!
//! [`serve`] (or [`Server::builder`]) binds a listener and returns a
//! [`ServerHandle`] right away; the accept loop runs on its own task and
//! spawns one worker per accepted connection. Each worker drives a single
//! [`HttpConnection`] and closes the socket when the handler returns.
//!
//! Shutdown goes through a [`CancellationToken`] owned by the server, so
//! several servers can live in one process without sharing state.

mod error;

pub use error::{ServerBuildError, ServerError};

use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

use crate::connection::{HttpConnection, INIT_BUFFER_SIZE, is_peer_gone};
use crate::ensure;
use crate::handler::Handler;

/// Binds `0.0.0.0:port` and starts serving with `handler`.
///
/// # Errors
///
/// Fails when the listener can't be bound.
pub async fn serve<H>(port: u16, handler: H) -> Result<ServerHandle, ServerError>
where
    H: Handler<OwnedWriteHalf> + 'static,
{
    Server::builder().port(port).build()?.serve(handler).await
}

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    initial_buffer_size: usize,
    shutdown: Option<CancellationToken>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, initial_buffer_size: INIT_BUFFER_SIZE, shutdown: None }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Listens on every IPv4 interface at `port`.
    pub fn port(self, port: u16) -> Self {
        self.address(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Initial size of each connection's read buffer.
    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.initial_buffer_size = size;
        self
    }

    /// Uses `token` for shutdown instead of a fresh one, e.g. to tie the
    /// server to a parent token.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        ensure!(!address.is_empty(), ServerBuildError::MissingAddress);
        ensure!(self.initial_buffer_size > 0, ServerBuildError::InvalidBufferSize);

        Ok(Server { address, initial_buffer_size: self.initial_buffer_size, shutdown: self.shutdown.unwrap_or_default() })
    }
}

#[derive(Debug)]
pub struct Server {
    address: Vec<SocketAddr>,
    initial_buffer_size: usize,
    shutdown: CancellationToken,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when none of the addresses can be bound.
    pub async fn serve<H>(self, handler: H) -> Result<ServerHandle, ServerError>
    where
        H: Handler<OwnedWriteHalf> + 'static,
    {
        let tcp_listener = TcpListener::bind(self.address.as_slice()).await.map_err(|e| {
            error!(cause = %e, address = ?self.address, "bind server error");
            ServerError::bind(e)
        })?;
        let local_addr = tcp_listener.local_addr().map_err(ServerError::bind)?;
        info!(%local_addr, "start listening");

        let accept_loop = AcceptLoop {
            tcp_listener,
            handler: Arc::new(handler),
            shutdown: self.shutdown.clone(),
            initial_buffer_size: self.initial_buffer_size,
        };
        let task = tokio::spawn(accept_loop.run());

        Ok(ServerHandle { local_addr, shutdown: self.shutdown, task })
    }
}

struct AcceptLoop<H> {
    tcp_listener: TcpListener,
    handler: Arc<H>,
    shutdown: CancellationToken,
    initial_buffer_size: usize,
}

impl<H> AcceptLoop<H>
where
    H: Handler<OwnedWriteHalf> + 'static,
{
    async fn run(self) -> Result<(), ServerError> {
        loop {
            let (tcp_stream, remote_addr) = select! {
                biased;
                () = self.shutdown.cancelled() => {
                    info!("shutdown requested, stop accepting");
                    return Ok(());
                }
                accepted = self.tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) if self.shutdown.is_cancelled() => {
                        debug!(cause = %e, "accept failed during shutdown");
                        return Ok(());
                    }
                    Err(e) => {
                        error!(cause = %e, "failed to accept, stop serving");
                        return Err(ServerError::accept(e));
                    }
                },
            };

            let handler = Arc::clone(&self.handler);
            let initial_buffer_size = self.initial_buffer_size;
            let span = info_span!("connection", %remote_addr);

            tokio::spawn(
                async move {
                    let (reader, writer) = tcp_stream.into_split();
                    let connection = HttpConnection::with_capacity(reader, writer, initial_buffer_size);
                    match connection.process(handler).await {
                        Ok(()) => info!("finished process, connection shutdown"),
                        Err(e) if is_peer_gone(&e) => debug!(cause = %e, "peer gone, connection shutdown"),
                        Err(e) => error!(cause = %e, "service has error, connection shutdown"),
                    }
                }
                .instrument(span),
            );
        }
    }
}

/// Handle to a running server.
///
/// Dropping the handle leaves the server running; use [`ServerHandle::close`]
/// to stop it.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<Result<(), ServerError>>,
}

impl ServerHandle {
    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops accepting and waits for the accept loop to exit. The listener is
    /// closed when this returns; in-flight connections finish on their own.
    pub async fn close(self) -> Result<(), ServerError> {
        info!(local_addr = %self.local_addr, "closing server");
        self.shutdown.cancel();
        self.wait().await
    }

    /// Waits for the accept loop to exit without requesting shutdown.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.task.await?
    }
}
