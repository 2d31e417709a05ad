use std::fmt;

use bytes::Bytes;

use crate::http::fields::Headers;

/// HTTP status code of a response.
///
/// The named variants are the codes the server knows a reason phrase for.
/// Handlers may return any other numeric code through `Other`; it is
/// rendered with the reason phrase `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
    /// Any other numeric code
    Other(u16),
}

impl StatusCode {
    /// Maps a numeric code onto a status, falling back to `Other`.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::from_u16(404), StatusCode::NotFound);
    /// assert_eq!(StatusCode::from_u16(201), StatusCode::Other(201));
    /// ```
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => StatusCode::Ok,
            400 => StatusCode::BadRequest,
            404 => StatusCode::NotFound,
            405 => StatusCode::MethodNotAllowed,
            500 => StatusCode::InternalServerError,
            other => StatusCode::Other(other),
        }
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
            StatusCode::Other(code) => *code,
        }
    }

    /// Returns the reason phrase written on the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyhttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::from_u16(418).reason_phrase(), "Unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match StatusCode::from_u16(self.as_u16()) {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::Other(_) => "Unknown",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Headers are written in insertion order and nothing is added
/// automatically; a handler that wants `Content-Length` sets it.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers in the order they will be written
    pub headers: Headers,
    /// Response body, written after the head in a separate write
    pub body: Option<Bytes>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use tinyhttp::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body("{}")
///     .build();
/// assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Headers,
    body: Option<Bytes>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Appends a header. Duplicate names are kept.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a `Content-Length` header matching the current body.
    pub fn content_length(self) -> Self {
        let len = self.body.as_ref().map_or(0, |b| b.len());
        self.header("Content-Length", len.to_string())
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a response with no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::text(StatusCode::Ok, body)
    }

    /// Creates a response with the given status and body and no headers.
    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(status).body(body).build()
    }

    /// The response sent when no route matches the request path.
    pub fn not_found() -> Self {
        Self::text(StatusCode::NotFound, Bytes::from_static(b"Not Found"))
    }

    /// The response sent when a handler produced no response.
    pub fn internal_error() -> Self {
        Self::text(
            StatusCode::InternalServerError,
            Bytes::from_static(b"Internal Server Error"),
        )
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.len())
    }
}
