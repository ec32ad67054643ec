//! Connection handling for the ID service.
//!
//! This module defines [`IdService`], which owns the shared generator, accepts
//! TCP connections and answers each `0x50` request byte with one encoded ID.
//!
//! ## Responsibilities
//!
//! - Accept connections until shutdown is requested.
//! - Decode pipelined opcodes and reply in request order.
//! - Close connections on reserved opcodes, generator errors and idle
//!   timeouts.
//! - Track in-flight connections so shutdown can wait for them.

use core::time::Duration;
use std::sync::Arc;

use flakeid::{FlakeGenerator, FlakeGeneratorAsyncExt, TokioSleep};
use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::{codec::Framed, sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

use crate::server::{
    error::{Error, Result},
    protocol::{IdCodec, Opcode},
};

/// Per-connection settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceConfig {
    /// Close a connection that sends nothing for this long.
    pub idle_timeout: Option<Duration>,
}

/// TCP front end for a shared [`FlakeGenerator`].
///
/// Cloning is cheap: clones share the generator, the shutdown token and the
/// connection tracker.
pub struct IdService<G> {
    generator: Arc<G>,
    config: ServiceConfig,
    shutdown_token: CancellationToken,
    connections: TaskTracker,
}

impl<G> Clone for IdService<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            config: self.config,
            shutdown_token: self.shutdown_token.clone(),
            connections: self.connections.clone(),
        }
    }
}

impl<G> IdService<G>
where
    G: FlakeGenerator + Send + Sync + 'static,
{
    pub fn new(generator: G, config: ServiceConfig) -> Self {
        Self {
            generator: Arc::new(generator),
            config,
            shutdown_token: CancellationToken::new(),
            connections: TaskTracker::new(),
        }
    }

    /// Accepts connections on `listener` until [`IdService::shutdown`] is
    /// called.
    ///
    /// Each connection runs on its own task. Accept errors are logged and do
    /// not stop the loop.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut incoming = TcpListenerStream::new(listener);

        loop {
            let accepted = tokio::select! {
                () = self.shutdown_token.cancelled() => break,
                accepted = incoming.next() => accepted,
            };

            match accepted {
                Some(Ok(stream)) => self.spawn_connection(stream),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    // Back off so a persistent error (e.g. EMFILE) does not spin.
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                None => break,
            }
        }

        tracing::debug!("accept loop stopped");
        Ok(())
    }

    /// Stops accepting, cancels in-flight connections and waits for their
    /// tasks to finish.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        self.connections.close();
        self.connections.wait().await;
    }

    fn spawn_connection(&self, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }

        let generator = Arc::clone(&self.generator);
        let shutdown = self.shutdown_token.child_token();
        let idle_timeout = self.config.idle_timeout;
        let span = tracing::debug_span!("connection", peer = ?peer);

        self.connections.spawn(
            async move {
                tracing::debug!("connection opened");
                match handle_connection(stream, &*generator, idle_timeout, shutdown).await {
                    Ok(served) => tracing::debug!(served, "connection closed"),
                    Err(Error::Generator(e)) => {
                        tracing::warn!(error = %e, "generator failed, closing connection");
                    }
                    Err(e) => tracing::debug!(error = %e, "connection closed"),
                }
            }
            .instrument(span),
        );
    }
}

/// Serves one connection until EOF, a reserved opcode, a generator error,
/// the idle timeout or cancellation, and returns how many IDs were sent.
///
/// Replies are written in request order. Replies to requests that arrived in
/// the same read are flushed together.
pub async fn handle_connection<IO, G>(
    io: IO,
    generator: &G,
    idle_timeout: Option<Duration>,
    shutdown: CancellationToken,
) -> Result<u64>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    G: FlakeGenerator + Sync,
{
    let mut framed = Framed::new(io, IdCodec);
    let outcome = serve_requests(&mut framed, generator, idle_timeout, &shutdown).await;

    // Replies already encoded belong to requests that succeeded.
    let flushed = framed.flush().await;
    let served = outcome?;
    flushed?;
    Ok(served)
}

async fn serve_requests<IO, G>(
    framed: &mut Framed<IO, IdCodec>,
    generator: &G,
    idle_timeout: Option<Duration>,
    shutdown: &CancellationToken,
) -> Result<u64>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    G: FlakeGenerator + Sync,
{
    let mut served = 0u64;

    loop {
        let request = tokio::select! {
            () = shutdown.cancelled() => break,
            request = next_request(framed, idle_timeout) => request?,
        };
        let Some(opcode) = request else {
            break;
        };

        match opcode? {
            Opcode::Generate => {
                let id = generator.try_next_id_async::<TokioSleep>().await?;
                framed.feed(id).await?;
                served += 1;
            }
        }

        if framed.read_buffer().is_empty() {
            framed.flush().await?;
        }
    }

    Ok(served)
}

async fn next_request<IO>(
    framed: &mut Framed<IO, IdCodec>,
    idle_timeout: Option<Duration>,
) -> Result<Option<Result<Opcode>>>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, framed.next())
            .await
            .map_err(|_| Error::IdleTimeout(limit)),
        None => Ok(framed.next().await),
    }
}
