//! Single-task event loop.
//!
//! Each turn waits, with no timeout, until the listener or at least one
//! registered connection is ready, accepts at most one new connection, then
//! visits every ready connection once. Everything a request needs (socket
//! writes, session and static file I/O) finishes before the next wait, so
//! session operations apply in arrival order.

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::Poll;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::http::connection::{Connection, Received};
use crate::http::handler::Handler;
use crate::http::response::{Response, StatusCode};
use crate::http::writer;
use crate::server::registry::{ConnectionId, ReadySet, Registry};

/// What one readiness wait reported.
struct Readiness {
    accepted: Option<io::Result<(TcpStream, SocketAddr)>>,
    ready: ReadySet,
}

pub struct EventLoop {
    listener: TcpListener,
    registry: Registry,
    handler: Handler,
}

impl EventLoop {
    pub fn new(listener: TcpListener, handler: Handler) -> Self {
        Self {
            listener,
            registry: Registry::new(),
            handler,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs until an infrastructure failure. Every returned error is fatal.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            self.turn().await?;
        }
    }

    /// One wait/accept/dispatch iteration.
    pub async fn turn(&mut self) -> anyhow::Result<()> {
        let readiness = self.wait_on_clients().await;

        if let Some(accepted) = readiness.accepted {
            let (stream, peer) = accepted.context("accept failed")?;
            let id = self.registry.add(Connection::new(stream, peer));
            info!(%peer, connection = %id, "New connection");
        }

        for id in self.registry.ready_ids(&readiness.ready) {
            self.service(id).await?;
        }

        Ok(())
    }

    async fn wait_on_clients(&self) -> Readiness {
        let listener = &self.listener;
        let registry = &self.registry;

        poll_fn(|cx| {
            let accepted = match listener.poll_accept(cx) {
                Poll::Ready(result) => Some(result),
                Poll::Pending => None,
            };
            let ready = registry.poll_ready(cx);

            if accepted.is_none() && ready.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(Readiness { accepted, ready })
            }
        })
        .await
    }

    /// Feeds newly arrived bytes to one connection and dispatches its
    /// request once framed. Per-connection failures end in teardown; only
    /// registry errors propagate.
    async fn service(&mut self, id: ConnectionId) -> anyhow::Result<()> {
        let conn = self.registry.get_mut(id)?;
        let peer = conn.peer();

        match conn.receive() {
            Ok(Received::NotReady) => return Ok(()),
            Ok(Received::Closed) => {
                info!(%peer, "Unexpected disconnect");
                return self.teardown(id);
            }
            Err(e) => {
                warn!(%peer, error = %e, "Receive failed");
                return self.teardown(id);
            }
            Ok(Received::Data(n)) => {
                debug!(%peer, bytes = n, buffered = conn.buffered(), "Received");
            }
        }

        let written = match conn.frame() {
            Ok(None) => return Ok(()),
            Ok(Some(request)) => {
                info!(%peer, method = ?request.method, path = %request.path, "Request");
                self.handler.handle(&request, conn.stream_mut()).await
            }
            Err(e) => {
                warn!(%peer, error = %e, "Bad request");
                writer::send(conn.stream_mut(), &Response::bad_request())
                    .await
                    .map(|()| StatusCode::BadRequest)
            }
        };

        conn.mark_dispatched();
        match written {
            Ok(status) => debug!(%peer, status = status.as_u16(), "Response sent"),
            Err(e) => warn!(%peer, error = %e, "Failed to write response"),
        }

        self.teardown(id)
    }

    fn teardown(&mut self, id: ConnectionId) -> anyhow::Result<()> {
        self.registry.remove(id)?;
        debug!(connection = %id, open = self.registry.len(), "Connection closed");
        Ok(())
    }
}
