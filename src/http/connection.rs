use std::io::{Read, Write};
use std::mem;

use anyhow::Context;
use bytes::BytesMut;
use tracing::{debug, error, info};

use crate::config::Limits;
use crate::http::parser::parse_request;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::{ResponseWriter, WriteError};
use crate::router::Router;

/// Handles exactly one request/response exchange on a stream.
///
/// All state lives in the connection itself, so any number of connections
/// can run side by side on different threads against one shared router.
pub struct Connection<S> {
    stream: S,
    request_capacity: usize,
    head_capacity: usize,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, AccessEntry),
    Closed,
}

/// What the access log records for a served request.
#[derive(Debug, Clone)]
pub struct AccessEntry {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, limits: &Limits) -> Self {
        Self {
            stream,
            request_capacity: limits.max_request_size,
            head_capacity: limits.max_response_head_size,
            state: ConnectionState::Reading,
        }
    }

    /// Runs the connection until it is closed.
    ///
    /// Requests that cannot be read or parsed end the connection without a
    /// response. Unknown paths get a 404 and handlers that return nothing
    /// get a 500.
    pub fn run(&mut self, router: &Router) -> anyhow::Result<()> {
        loop {
            match mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    if let Some(req) = self.read_request()? {
                        self.state = ConnectionState::Processing(req);
                    }
                }

                ConnectionState::Processing(req) => {
                    let response = dispatch(router, &req);
                    let (writer, status) = self.render(&response)?;
                    let entry = AccessEntry {
                        method: req.method,
                        path: req.path,
                        status,
                    };
                    self.state = ConnectionState::Writing(writer, entry);
                }

                ConnectionState::Writing(writer, entry) => {
                    let written = writer.write_to(&mut self.stream);

                    info!(
                        method = %entry.method,
                        path = %entry.path,
                        status = entry.status.as_u16(),
                        "request served"
                    );

                    written.context("failed to send response")?;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Performs the single bounded read and parses what arrived.
    ///
    /// Anything beyond the read buffer is left unread; the parser only ever
    /// sees what fit.
    pub fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let mut buf = BytesMut::zeroed(self.request_capacity);
        let n = self.stream.read(&mut buf).context("failed to read request")?;

        if n == 0 {
            debug!("read() returned 0");
            return Ok(None);
        }

        debug!(bytes = n, "read request");
        buf.truncate(n);
        let buf = buf.freeze();

        match parse_request(&buf) {
            Ok(req) => {
                log_request(&req);
                Ok(Some(req))
            }
            Err(e) => {
                debug!(error = %e, "request parse failed");
                Ok(None)
            }
        }
    }

    /// Renders the head of `response`, falling back to a 500 when it does
    /// not fit the head buffer.
    fn render(&self, response: &Response) -> anyhow::Result<(ResponseWriter, StatusCode)> {
        match ResponseWriter::new(response, self.head_capacity) {
            Ok(writer) => Ok((writer, response.status)),
            Err(WriteError::HeadTooLarge { capacity }) => {
                error!(capacity, "response head too large, sending 500 instead");
                let fallback = Response::internal_error();
                let writer = ResponseWriter::new(&fallback, self.head_capacity)
                    .context("fallback response does not fit the head buffer")?;
                Ok((writer, fallback.status))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }
}

/// Resolves and invokes the handler for `req`.
pub fn dispatch(router: &Router, req: &Request) -> Response {
    match router.resolve(&req.path) {
        Some(route) => route.call(req).unwrap_or_else(|| {
            debug!(path = %req.path, "route handler returned no response");
            Response::internal_error()
        }),
        None => {
            debug!(path = %req.path, "no handler for path");
            Response::not_found()
        }
    }
}

fn log_request(req: &Request) {
    debug!(method = %req.method, path = %req.path, body_len = req.body.len(), "parsed request");
    for (name, value) in req.query.iter() {
        debug!("  query {}={}", name, value);
    }
    for (name, value) in req.headers.iter() {
        debug!("  header {}: {}", name, value);
    }
}
