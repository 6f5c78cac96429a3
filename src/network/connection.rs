//! Connection Handler
//!
//! Serves the requests of a single client connection inside a worker's
//! event loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::error::{PearError, Result};
use crate::protocol::{
    check_framing, keep_alive, read_body, read_request_head, write_response, Limits, Request,
    RequestHead, Response, Version, CONTINUE,
};
use crate::router::Router;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered; also holds pipelined requests)
    reader: BufReader<OwnedReadHalf>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<OwnedWriteHalf>,

    /// Shared request router
    router: Arc<Router>,

    /// Parser limits
    limits: Limits,

    /// Max wait for the next request head
    idle_timeout: Option<Duration>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Wrap an accepted stream
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(
        stream: std::net::TcpStream,
        router: Arc<Router>,
        limits: Limits,
        idle_timeout: Option<Duration>,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nonblocking(true)?;
        let stream = TcpStream::from_std(stream)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            router,
            limits,
            idle_timeout,
            peer_addr,
        })
    }

    /// Serve requests until the client disconnects or the connection closes
    pub async fn serve(mut self) {
        tracing::debug!("Connection established from {}", self.peer_addr);

        match self.handle().await {
            Ok(()) => tracing::debug!("Connection from {} closed", self.peer_addr),
            Err(PearError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
            }
            Err(e) => tracing::warn!("Connection from {} failed: {}", self.peer_addr, e),
        }

        let _ = self.writer.shutdown().await;
    }

    async fn handle(&mut self) -> Result<()> {
        loop {
            let head = match self.next_head().await {
                Ok(Some(head)) => head,
                Ok(None) => return Ok(()),
                Err(PearError::Protocol(msg)) => return self.reject(&msg).await,
                Err(e) => return Err(e),
            };

            if head.expects_continue() {
                // Refuse before inviting the client to upload the body
                match check_framing(&head, &self.limits) {
                    Ok(()) => {}
                    Err(PearError::Protocol(msg)) => return self.reject(&msg).await,
                    Err(e) => return Err(e),
                }
                self.writer.write_all(CONTINUE).await?;
                self.writer.flush().await?;
            }

            let body = match read_body(&mut self.reader, &head, &self.limits).await {
                Ok(body) => body,
                Err(PearError::Protocol(msg)) => return self.reject(&msg).await,
                Err(e) => return Err(e),
            };

            let request = Request::new(head, body);
            tracing::trace!(
                "{} {} {:?} ({} byte body)",
                self.peer_addr,
                request.method().as_str(),
                String::from_utf8_lossy(request.path()),
                request.body.len()
            );

            let response = self.router.route(&request);
            let persistent = keep_alive(&request.head, &response);

            write_response(&mut self.writer, &response, request.head.version, persistent).await?;

            if !persistent {
                return Ok(());
            }
        }
    }

    /// Read the next request head, honouring the idle timeout
    async fn next_head(&mut self) -> Result<Option<RequestHead>> {
        let read = read_request_head(&mut self.reader, &self.limits);

        match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!("Idle timeout for client {}", self.peer_addr);
                    Ok(None)
                }
            },
            None => read.await,
        }
    }

    /// Answer a protocol violation with 400 and close
    async fn reject(&mut self, msg: &str) -> Result<()> {
        tracing::warn!("Protocol error from {}: {}", self.peer_addr, msg);
        write_response(
            &mut self.writer,
            &Response::bad_request(),
            Version::Http11,
            false,
        )
        .await
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        kind,
        UnexpectedEof | ConnectionReset | ConnectionAborted | BrokenPipe
    )
}
