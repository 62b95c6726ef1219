use std::io::{BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ConnectionError, ParseError, ServerError};
use crate::http::parser;
use crate::router::{self, Route, Router};

/// How a connection ended when it ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dispatched(Route),
    BadRequest,
}

/// Blocking accept loop feeding a fixed-size worker pool.
///
/// Each connection carries exactly one request: it is parsed, dispatched,
/// answered and closed on a single worker.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    request_limit: usize,
    workers: Runtime,
}

impl Server {
    pub fn bind(config: &ServerConfig, router: Router) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let listener =
            TcpListener::bind(&address).map_err(|source| ServerError::Bind { address, source })?;

        // Only the blocking pool is used; it is capped at `workers` threads and
        // queues anything submitted beyond that.
        let workers = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.workers)
            .thread_name("http-worker")
            .build()
            .map_err(|source| ServerError::WorkerPool { source })?;

        Ok(Server {
            listener,
            router: Arc::new(router),
            request_limit: config.request_limit,
            workers,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the routing table, for registering handlers while serving.
    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.router)
    }

    /// Accepts connections until the listener fails permanently.
    ///
    /// A failed `accept` or a failed connection never stops the loop.
    pub fn listen(&self) -> Result<(), ServerError> {
        info!(address = %self.local_addr()?, "server listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let request_limit = self.request_limit;
                    self.workers
                        .spawn_blocking(move || handle_client(stream, &router, request_limit));
                }
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                }
            }
        }

        Ok(())
    }
}

fn handle_client(stream: TcpStream, router: &Router, request_limit: usize) {
    let peer = stream.peer_addr().ok();
    debug!(?peer, "connection accepted");

    match serve(&stream, router, request_limit) {
        Ok(outcome) => debug!(?peer, ?outcome, "connection dispatched"),
        Err(e @ ConnectionError::Transport(_)) => warn!(?peer, cause = %e, "connection rejected"),
        Err(e @ ConnectionError::Handler(_)) => error!(?peer, cause = %e, "handler failed"),
    }

    // the peer may already be gone
    let _ = stream.shutdown(Shutdown::Both);
    debug!(?peer, "connection closed");
}

/// Parses one request from `stream` and writes exactly one response.
pub fn serve(
    stream: &TcpStream,
    router: &Router,
    request_limit: usize,
) -> Result<Outcome, ConnectionError> {
    let mut reader = stream;
    let mut writer = BufWriter::new(stream);

    let request = match parser::read_request(&mut reader, request_limit) {
        Ok(request) => request,
        Err(ParseError::Io { source }) => return Err(ConnectionError::Transport(source)),
        Err(e) => {
            debug!(cause = %e, "bad request");
            router::bad_request(&mut writer).map_err(ConnectionError::Transport)?;
            return Ok(Outcome::BadRequest);
        }
    };

    let route = router.dispatch(&request, &mut writer)?;
    writer.flush().map_err(ConnectionError::Transport)?;
    Ok(Outcome::Dispatched(route))
}
