//! Parsed request types handed to handlers.

use std::fmt;

use bytes::Bytes;

use crate::protocol::Headers;

/// The first line of a request: `METHOD SP TARGET SP HTTP/VERSION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    /// The digits after `HTTP/`, e.g. `1.1`.
    pub version: String,
}

impl RequestLine {
    pub fn new<M, T, V>(method: M, target: T, version: V) -> Self
    where
        M: Into<String>,
        T: Into<String>,
        V: Into<String>,
    {
        Self { method: method.into(), target: target.into(), version: version.into() }
    }
}

/// A fully materialized request.
///
/// Produced by [`RequestDecoder`](crate::codec::RequestDecoder) once the
/// header section and any `content-length` bounded body have been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    line: RequestLine,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub fn new(line: RequestLine, headers: Headers, body: Bytes) -> Self {
        Self { line, headers, body }
    }

    pub fn line(&self) -> &RequestLine {
        &self.line
    }

    pub fn method(&self) -> &str {
        &self.line.method
    }

    pub fn target(&self) -> &str {
        &self.line.target
    }

    pub fn version(&self) -> &str {
        &self.line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (RequestLine, Headers, Bytes) {
        (self.line, self.headers, self.body)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request line:")?;
        writeln!(f, "- Method: {}", self.line.method)?;
        writeln!(f, "- Target: {}", self.line.target)?;
        writeln!(f, "- Version: {}", self.line.version)?;
        writeln!(f, "Headers:")?;
        for (name, value) in &self.headers {
            writeln!(f, "- {}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
        }
        writeln!(f, "Body:")?;
        write!(f, "{}", String::from_utf8_lossy(&self.body))
    }
}
