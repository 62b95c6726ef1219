use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::ConnectionError;
use crate::http::{Method, Request, Response, StatusCode};

/// Request-processing logic bound to a (method, path) pair, or the default
/// static handler.
///
/// A handler produces output only through `out`. An `Err` is logged by the
/// server and the connection is closed; whatever was already written stays
/// written.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, out: &mut dyn Write) -> io::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, out: &mut dyn Write) -> io::Result<()> {
        self(request, out)
    }
}

type RouteTable = HashMap<Method, HashMap<String, Arc<dyn Handler>>>;

/// Which handler a request was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Registered,
    Static,
    NotFound,
}

/// Exact (method, path) routing with a static allow-list fallback.
///
/// The table is an immutable snapshot; registration publishes a new copy, so
/// workers reading concurrently always see either the old or the new table.
pub struct Router {
    routes: ArcSwap<RouteTable>,
    static_paths: HashSet<String>,
    default_handler: Option<Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Router {
            routes: ArcSwap::from_pointee(RouteTable::new()),
            static_paths: HashSet::new(),
            default_handler: None,
        }
    }

    /// Sets the handler used for allow-listed paths without a registered handler.
    pub fn with_default_handler(mut self, handler: impl Handler) -> Self {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.default_handler = Some(handler);
        self
    }

    pub fn with_static_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Registers `handler` for `method` and `path`, replacing any previous one.
    ///
    /// Safe to call while the server is running.
    pub fn add_handler(&self, method: Method, path: &str, handler: impl Handler) {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        self.routes.rcu(|current| {
            let mut next = RouteTable::clone(current);
            next.entry(method)
                .or_default()
                .insert(path.to_string(), Arc::clone(&handler));
            next
        });
    }

    pub fn is_static_path(&self, path: &str) -> bool {
        self.static_paths.contains(path)
    }

    /// Resolves the handler for `request`, in order: registered, static, none.
    pub fn resolve(&self, request: &Request) -> (Route, Option<Arc<dyn Handler>>) {
        let registered = self
            .routes
            .load()
            .get(&request.method)
            .and_then(|paths| paths.get(&request.path))
            .cloned();
        if let Some(handler) = registered {
            return (Route::Registered, Some(handler));
        }

        match &self.default_handler {
            Some(handler) if self.is_static_path(&request.path) => {
                (Route::Static, Some(Arc::clone(handler)))
            }
            _ => (Route::NotFound, None),
        }
    }

    /// Runs the handler selected by [`Router::resolve`], or the built-in 404.
    pub fn dispatch(&self, request: &Request, out: &mut dyn Write) -> Result<Route, ConnectionError> {
        match self.resolve(request) {
            (route, Some(handler)) => {
                handler
                    .handle(request, out)
                    .map_err(ConnectionError::Handler)?;
                out.flush().map_err(ConnectionError::Transport)?;
                Ok(route)
            }
            (route, None) => {
                not_found(out).map_err(ConnectionError::Transport)?;
                Ok(route)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in response for requests that failed to parse.
pub fn bad_request(out: &mut dyn Write) -> io::Result<()> {
    Response::new(StatusCode::BadRequest).write_to(out)
}

/// Built-in response for requests no handler accepted.
pub fn not_found(out: &mut dyn Write) -> io::Result<()> {
    Response::new(StatusCode::NotFound).write_to(out)
}
