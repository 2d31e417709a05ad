use bytes::Bytes;
use thiserror::Error;

use crate::http::fields::{Headers, QueryParams};
use crate::http::request::{Method, Request};

const HTTP_VERSION: &[u8] = b"HTTP/1.1";
const HEAD_END: &[u8] = b"\r\n\r\n";
const LINE_END: &[u8] = b"\r\n";
const HEADER_SEP: &[u8] = b": ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request method is missing")]
    MissingMethod,
    #[error("unsupported method `{0}`, only GET and POST are accepted")]
    UnsupportedMethod(String),
    #[error("request path is missing")]
    MissingPath,
    #[error("request version is missing")]
    MissingVersion,
    #[error("unsupported version `{0}`, only HTTP/1.1 is accepted")]
    UnsupportedVersion(String),
    #[error("malformed header line `{0}`")]
    MalformedHeader(String),
}

/// Parses one request out of the bytes received on a connection.
///
/// The buffer is only borrowed; the body of the returned request is a
/// cheap slice of it. Everything after the first blank line is the body,
/// whatever its length. A buffer without a blank line is treated as a head
/// with an empty body.
///
/// The head is tokenized as bytes. Path, query and header fields that are
/// not valid UTF-8 are converted lossily rather than rejected.
pub fn parse_request(buf: &Bytes) -> Result<Request, ParseError> {
    let (head, body) = match find(buf, HEAD_END) {
        Some(pos) => (&buf[..pos], buf.slice(pos + HEAD_END.len()..)),
        None => (&buf[..], Bytes::new()),
    };

    let mut lines = split_lines(head).into_iter();

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let (method_tok, rest) = next_token(request_line);
    if method_tok.is_empty() {
        return Err(ParseError::MissingMethod);
    }
    let method = std::str::from_utf8(method_tok)
        .ok()
        .and_then(Method::from_token)
        .ok_or_else(|| ParseError::UnsupportedMethod(lossy(method_tok)))?;

    let (target, rest) = next_token(rest);
    if target.is_empty() {
        return Err(ParseError::MissingPath);
    }

    let (path, query) = match target.iter().position(|&b| b == b'?') {
        Some(pos) => (&target[..pos], parse_query(&lossy(&target[pos + 1..]))),
        None => (target, QueryParams::new()),
    };

    let version = trim_leading_spaces(rest);
    if version.is_empty() {
        return Err(ParseError::MissingVersion);
    }
    if version != HTTP_VERSION {
        return Err(ParseError::UnsupportedVersion(lossy(version)));
    }

    // Headers
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = find(line, HEADER_SEP)
            .map(|pos| (&line[..pos], &line[pos + HEADER_SEP.len()..]))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| ParseError::MalformedHeader(lossy(line)))?;

        headers.add(lossy(name), lossy(value));
    }

    Ok(Request {
        method,
        path: lossy(path),
        query,
        headers,
        body,
    })
}

/// Splits `key=value&key=value` into parameters, in order.
///
/// A parameter missing its name or its value is dropped; it never fails
/// the request.
pub fn parse_query(query: &str) -> QueryParams {
    query
        .split('&')
        .filter_map(|param| param.split_once('='))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits the head on CRLF. A read that stopped right after a CR leaves
/// it dangling on the last line; it is dropped.
fn split_lines(head: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut rest = head;
    while let Some(pos) = find(rest, LINE_END) {
        lines.push(&rest[..pos]);
        rest = &rest[pos + LINE_END.len()..];
    }
    lines.push(rest.strip_suffix(b"\r").unwrap_or(rest));
    lines
}

fn trim_leading_spaces(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| b != b' ').unwrap_or(s.len());
    &s[start..]
}

/// Skips leading spaces, then splits at the next space.
fn next_token(s: &[u8]) -> (&[u8], &[u8]) {
    let s = trim_leading_spaces(s);
    match s.iter().position(|&b| b == b' ') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, &[]),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
