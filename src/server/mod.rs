//! The server value and its accept loop.
//!
//! A `Server` owns the route table and settings. Routes are added before
//! the server starts; `run` and `serve` consume it and share it read-only
//! with every connection thread.

pub mod listener;

use std::io::{Read, Write};
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::router::Router;

#[derive(Debug, Default)]
pub struct Server {
    router: Router,
    config: Config,
}

impl Server {
    /// Creates a server with default settings and no routes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            router: Router::new(),
            config,
        }
    }

    /// Registers `handler` for requests whose path is exactly `path`.
    ///
    /// The handler returns `None` to signal failure, which is answered
    /// with a 500.
    pub fn add_handler<F>(&mut self, path: impl Into<String>, handler: F)
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        self.router.register(path, handler);
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Binds `address:port` and serves forever.
    ///
    /// Setup failures (bad address, bind, listen) are returned
    /// immediately; otherwise this only returns if the accept loop hits a
    /// fatal error.
    pub fn run(self, address: &str, port: u16) -> anyhow::Result<()> {
        let ip: IpAddr = address
            .parse()
            .with_context(|| format!("invalid bind address `{address}`"))?;
        let addr = SocketAddr::new(ip, port);

        let listener = listener::bind(addr, self.config.server.backlog)
            .with_context(|| format!("failed to listen on {addr}"))?;
        info!("Listening on http://{}", addr);

        self.serve(listener)
    }

    /// Runs the accept loop on an already bound listener.
    pub fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        listener::serve(listener, Arc::new(self))
    }

    /// Handles one connection on the calling thread.
    pub fn handle_connection<S: Read + Write>(&self, stream: S) -> anyhow::Result<()> {
        Connection::new(stream, &self.config.limits).run(&self.router)
    }
}
