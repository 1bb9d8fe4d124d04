use std::error::Error as StdError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("handler error: {source}")]
    HandlerError { source: Box<dyn StdError + Send + Sync> },
}

impl HttpError {
    pub fn handler<E: Into<Box<dyn StdError + Send + Sync>>>(e: E) -> Self {
        Self::HandlerError { source: e.into() }
    }
}

/// Failures while decoding an inbound request.
///
/// The variants fall into three groups: malformed input (the peer sent bytes
/// that are not a valid request), premature termination (the peer hung up
/// before the message was complete) and transport failures.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http version: {version:?}")]
    InvalidVersion { version: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("received more body than content-length provided, content-length: {content_length}, received: {received}")]
    BodyOverrun { content_length: usize, received: usize },

    #[error("request already fully parsed")]
    AlreadyDone,

    #[error("connection closed before the request header section completed")]
    ConnectionClosed,

    #[error("connection closed after {received} of {content_length} body bytes")]
    TruncatedBody { content_length: usize, received: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_version<S: ToString>(str: S) -> Self {
        Self::InvalidVersion { version: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn body_overrun(content_length: usize, received: usize) -> Self {
        Self::BodyOverrun { content_length, received }
    }

    pub fn truncated_body(content_length: usize, received: usize) -> Self {
        Self::TruncatedBody { content_length, received }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true when the peer closed the stream before the request completed.
    pub fn is_premature_close(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::TruncatedBody { .. })
    }

    /// Returns true when the peer sent bytes that do not form a valid request.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequestLine { .. }
                | Self::InvalidVersion { .. }
                | Self::InvalidHeader { .. }
                | Self::InvalidContentLength { .. }
                | Self::BodyOverrun { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    /// A write was attempted out of order; nothing was written.
    #[error("unsupported operation: {operation} while expecting {expected}")]
    Unsupported { operation: &'static str, expected: &'static str },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn unsupported(operation: &'static str, expected: &'static str) -> Self {
        Self::Unsupported { operation, expected }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
