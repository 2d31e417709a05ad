//! Exact-path request routing.
//!
//! Routes are kept in registration order and resolved with a linear scan;
//! the first route whose path equals the request path wins. Paths are
//! compared byte for byte: no prefixes, wildcards or trailing-slash
//! normalization.

use std::fmt;
use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::Response;

/// Application callback for a route.
///
/// Returning `None` tells the server the handler failed; the client gets a
/// 500 response.
pub type Handler = Arc<dyn Fn(&Request) -> Option<Response> + Send + Sync + 'static>;

/// A registered (path, handler) pair.
#[derive(Clone)]
pub struct Route {
    path: String,
    handler: Handler,
}

impl Route {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Invokes the handler on the calling thread.
    pub fn call(&self, request: &Request) -> Option<Response> {
        (self.handler)(request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Ordered route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route.
    ///
    /// Duplicate paths are accepted; the earlier registration keeps winning
    /// and the later one is never reached.
    pub fn register<F>(&mut self, path: impl Into<String>, handler: F)
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            path: path.into(),
            handler: Arc::new(handler),
        });
    }

    /// Returns the first route registered for exactly `path`.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.path == path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
