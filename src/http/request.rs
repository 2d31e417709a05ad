use std::fmt;

use bytes::Bytes;

use crate::http::fields::{Headers, QueryParams};

/// HTTP request methods.
///
/// Only GET and POST are accepted on the wire; any other token is a parse
/// failure and the connection is closed without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
}

impl Method {
    /// Parses an HTTP method from its request-line token.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyhttp::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), None);
    /// assert_eq!(Method::from_token("PUT"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a parsed HTTP request from a client.
///
/// The path never contains the query suffix; query parameters and headers
/// keep the order in which they appeared. The body is whatever followed the
/// blank line in the bytes actually received, Content-Length is not
/// consulted.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET or POST)
    pub method: Method,
    /// The request path without the query string (e.g., "/data")
    pub path: String,
    /// Query string parameters in order of appearance
    pub query: QueryParams,
    /// Request headers in order of appearance
    pub headers: Headers,
    /// Request body, possibly empty
    pub body: Bytes,
}

/// Builder for constructing Request objects, mostly useful in handler tests.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    query: QueryParams,
    headers: Headers,
    body: Bytes,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            query: QueryParams::new(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.add(name, value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            query: self.query,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Retrieves the first query parameter with the given name.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyhttp::http::request::{Method, RequestBuilder};
    /// let req = RequestBuilder::new()
    ///     .method(Method::GET)
    ///     .path("/data")
    ///     .query("from", "100")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(req.query_param("from"), Some("100"));
    /// assert_eq!(req.query_param("to"), None);
    /// ```
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// Body interpreted as UTF-8, if it is valid.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
