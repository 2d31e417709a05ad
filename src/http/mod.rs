//! HTTP protocol implementation.
//!
//! This module implements the restricted HTTP/1.1 subset the server speaks:
//! one request per connection, GET and POST only, no keep-alive.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection handler driving read, dispatch and write
//! - **`parser`**: Parses the bytes of a single read into a `Request`
//! - **`fields`**: Ordered header and query parameter containers
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Bounded serialization of the response head and the socket writes
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← One bounded read, then parse
//!        └──────┬──────┘
//!               │ Request parsed (read/parse failure → Closed, no response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and invoke handler (404 / 500 fallbacks)
//!        └──────┬───────────┘
//!               │ Response rendered
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Head, then body, then access log
//!        └──────┬───────────┘
//!               │
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use tinyhttp::config::Limits;
//! use tinyhttp::http::connection::Connection;
//! use tinyhttp::http::response::Response;
//! use tinyhttp::router::Router;
//!
//! let mut router = Router::new();
//! router.register("/", |_req| Some(Response::ok("hello")));
//!
//! let listener = TcpListener::bind("127.0.0.1:8080").unwrap();
//! for stream in listener.incoming() {
//!     let mut conn = Connection::new(stream.unwrap(), &Limits::default());
//!     if let Err(e) = conn.run(&router) {
//!         eprintln!("Connection error: {}", e);
//!     }
//! }
//! ```

pub mod connection;
pub mod fields;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
