//! HTTP request decoder module
//!
//! The decoder is a state machine re-entered every time more bytes arrive:
//!
//! ```text
//! Initialized --request line--> ParsingHeaders --blank line--> ParsingBody --content-length reached--> Done
//! ```
//!
//! [`RequestDecoder::advance`] performs one transition against the bytes
//! buffered so far and reports how many of them it consumed. Returning `0`
//! means no progress is possible until the caller supplies more bytes.
//!
//! # Example
//!
//! ```
//! use raw_http::codec::{ParseState, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let consumed = decoder.advance(b"GET / HTTP/1.1\r\nHost: localhost\r\n").unwrap();
//! assert_eq!(consumed, 16);
//! assert_eq!(decoder.state(), ParseState::ParsingHeaders);
//! ```

use std::mem;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::LengthDecoder;
use crate::codec::request_line_decoder::decode_request_line;
use crate::protocol::{Headers, ParseError, Request, RequestLine};

/// Where the decoder is within the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

/// A decoder for a single HTTP request.
///
/// Bodies are only read when a `content-length` header is present; without
/// one the body is empty. Chunked request bodies are not decoded.
#[derive(Debug)]
pub struct RequestDecoder {
    state: ParseState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Option<LengthDecoder>,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Default::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Headers decoded so far.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Performs one state transition against `src`.
    ///
    /// Returns the number of bytes consumed from the front of `src`; the caller
    /// must drop them before the next call. In `ParsingBody` every byte of `src`
    /// is consumed.
    ///
    /// # Errors
    ///
    /// - Malformed request line, header line or Content-Length value
    /// - [`ParseError::BodyOverrun`] when more body bytes arrive than declared
    /// - [`ParseError::AlreadyDone`] when called after the request completed
    pub fn advance(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParseState::Initialized => match decode_request_line(src)? {
                Some((request_line, consumed)) => {
                    self.request_line = Some(request_line);
                    self.state = ParseState::ParsingHeaders;
                    Ok(consumed)
                }
                None => Ok(0),
            },

            ParseState::ParsingHeaders => {
                let status = self.headers.parse_one(src)?;
                if status.is_end() {
                    self.body = self.headers.content_length()?.map(LengthDecoder::new);
                    trace!(content_length = ?self.body.as_ref().map(LengthDecoder::length), "header section finished");
                    self.state = ParseState::ParsingBody;
                }
                Ok(status.consumed())
            }

            ParseState::ParsingBody => match &mut self.body {
                // no content-length: the body is empty
                None => {
                    self.state = ParseState::Done;
                    Ok(0)
                }
                Some(body) => {
                    let consumed = body.feed(src)?;
                    if body.is_finish() {
                        trace!(body_size = body.length(), "body finished");
                        self.state = ParseState::Done;
                    }
                    Ok(consumed)
                }
            },

            ParseState::Done => Err(ParseError::AlreadyDone),
        }
    }

    /// Advances as far as the buffered bytes allow, dropping consumed bytes
    /// from the front of `src` after each step.
    pub fn advance_buffered(&mut self, src: &mut BytesMut) -> Result<(), ParseError> {
        while self.state != ParseState::Done {
            let consumed = self.advance(src)?;
            if consumed == 0 {
                break;
            }
            src.advance(consumed);
        }
        Ok(())
    }

    /// Applies the end-of-stream policy once the peer has closed its side.
    ///
    /// A body without Content-Length (or with Content-Length 0) is complete at
    /// end of stream. A positive Content-Length that was not satisfied is a
    /// [`ParseError::TruncatedBody`]; any other unfinished state is a
    /// [`ParseError::ConnectionClosed`].
    pub fn end_of_stream(&mut self) -> Result<(), ParseError> {
        match (self.state, &self.body) {
            (ParseState::Done, _) => Ok(()),
            (ParseState::ParsingBody, None) => {
                self.state = ParseState::Done;
                Ok(())
            }
            (ParseState::ParsingBody, Some(body)) if body.length() == 0 => {
                self.state = ParseState::Done;
                Ok(())
            }
            (ParseState::ParsingBody, Some(body)) => Err(ParseError::truncated_body(body.length(), body.received())),
            (ParseState::Initialized | ParseState::ParsingHeaders, _) => Err(ParseError::ConnectionClosed),
        }
    }

    /// Takes the finished request out of the decoder.
    ///
    /// Returns `None` unless the state is `Done`, or if the request was already taken.
    pub fn take_request(&mut self) -> Option<Request> {
        if self.state != ParseState::Done {
            return None;
        }

        let request_line = self.request_line.take()?;
        let headers = mem::take(&mut self.headers);
        let body = self.body.take().map_or_else(Bytes::new, LengthDecoder::into_body);
        Some(Request::new(request_line, headers, body))
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { state: ParseState::Initialized, request_line: None, headers: Headers::new(), body: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode a complete request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the request is complete
    /// - `Ok(None)`: need more data to proceed, or the request was already returned
    /// - `Err(_)`: encountered a parsing error
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.state == ParseState::Done && self.request_line.is_none() {
            // trailing bytes after a returned request would start a pipelined request
            return if src.is_empty() { Ok(None) } else { Err(ParseError::AlreadyDone) };
        }

        self.advance_buffered(src)?;
        Ok(self.take_request())
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(buf)? {
            return Ok(Some(request));
        }
        if self.state == ParseState::Done {
            return Ok(None);
        }

        self.end_of_stream()?;
        Ok(self.take_request())
    }
}
