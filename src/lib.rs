//! tinyhttp - a small blocking HTTP/1.1 server
//!
//! Accepts TCP connections, reads one request per connection, dispatches it
//! to a handler registered for the exact request path and writes back the
//! response before closing the connection. Every connection runs on its own
//! thread.
//!
//! ```no_run
//! use tinyhttp::http::response::Response;
//! use tinyhttp::server::Server;
//!
//! let mut server = Server::new();
//! server.add_handler("/hello", |_req| Some(Response::ok("hello\n")));
//! server.run("127.0.0.1", 8080).unwrap();
//! ```

pub mod config;
pub mod http;
pub mod router;
pub mod server;

pub use http::request::{Method, Request};
pub use http::response::{Response, ResponseBuilder, StatusCode};
pub use server::Server;
