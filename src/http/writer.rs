use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("response head needs more than {capacity} bytes")]
    HeadTooLarge { capacity: usize },
    #[error("failed to write response: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the status line, headers and blank line of `resp` into `buf`.
///
/// `buf` is cleared first. Every append is checked against `capacity`;
/// a head that does not fit fails with `WriteError::HeadTooLarge` and
/// leaves `buf` holding a partial head that must not be sent. Returns the
/// number of bytes rendered.
pub fn write_head(
    resp: &Response,
    buf: &mut BytesMut,
    capacity: usize,
) -> Result<usize, WriteError> {
    buf.clear();

    // Status line
    let code = resp.status.as_u16().to_string();
    append(buf, capacity, &[
        HTTP_VERSION.as_bytes(),
        b" ",
        code.as_bytes(),
        b" ",
        resp.status.reason_phrase().as_bytes(),
        b"\r\n",
    ])?;

    // Headers
    for (name, value) in resp.headers.iter() {
        append(buf, capacity, &[name.as_bytes(), b": ", value.as_bytes(), b"\r\n"])?;
    }

    // Header/body separator
    append(buf, capacity, &[b"\r\n"])?;

    Ok(buf.len())
}

fn append(buf: &mut BytesMut, capacity: usize, parts: &[&[u8]]) -> Result<(), WriteError> {
    let needed: usize = parts.iter().map(|p| p.len()).sum();
    if buf.len() + needed > capacity {
        return Err(WriteError::HeadTooLarge { capacity });
    }
    for part in parts {
        buf.put_slice(part);
    }
    Ok(())
}

/// A rendered response waiting to be written to a stream.
///
/// The head and the body are sent as two separate writes. Each is retried
/// until every byte is accepted, so a short write never drops the tail of
/// a response.
#[derive(Debug)]
pub struct ResponseWriter {
    head: Bytes,
    body: Option<Bytes>,
}

impl ResponseWriter {
    /// Renders the head of `response` into a fresh buffer of
    /// `head_capacity` bytes.
    pub fn new(response: &Response, head_capacity: usize) -> Result<Self, WriteError> {
        let mut buf = BytesMut::with_capacity(head_capacity);
        write_head(response, &mut buf, head_capacity)?;

        Ok(Self {
            head: buf.freeze(),
            body: response.body.clone(),
        })
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Writes the head and then the body. Returns the total bytes written.
    pub fn write_to<W: Write>(&self, stream: &mut W) -> Result<usize, WriteError> {
        stream.write_all(&self.head)?;
        tracing::debug!(bytes = self.head.len(), "wrote response head");

        let mut written = self.head.len();

        if let Some(body) = &self.body {
            stream.write_all(body)?;
            tracing::debug!(bytes = body.len(), "wrote response body");
            written += body.len();
        }

        stream.flush()?;
        Ok(written)
    }
}
