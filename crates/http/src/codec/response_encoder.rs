//! Response encoder enforcing the legal write order.
//!
//! A response is written as
//!
//! ```text
//! status line -> header section -> body*
//!                               -> chunked segment* -> terminator -> trailers
//! ```
//!
//! The encoder tracks the position in this sequence with a [`WriteCursor`]. An
//! item that is not legal at the current position is rejected with
//! [`SendError::Unsupported`] before anything is written to the destination.

use std::io::Write;

use bytes::BytesMut;
use http::{StatusCode, header};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::{ChunkedEncoder, ChunkedItem};
use crate::codec::header::HeaderEncoder;
use crate::ensure;
use crate::utils::BytesWriter;
use crate::protocol::{Headers, SendError};

/// What the next write must be. The cursor only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCursor {
    StatusLine,
    Headers,
    Body,
    Chunked,
    Trailers,
    Complete,
}

impl WriteCursor {
    fn expected(self) -> &'static str {
        match self {
            WriteCursor::StatusLine => "status line",
            WriteCursor::Headers => "headers",
            WriteCursor::Body => "body",
            WriteCursor::Chunked => "chunked segment or terminator",
            WriteCursor::Trailers => "trailers",
            WriteCursor::Complete => "nothing, the response is complete",
        }
    }
}

/// One write of a response.
#[derive(Debug, Clone, Copy)]
pub enum ResponseItem<'a> {
    StatusLine(StatusCode),
    Headers(&'a Headers),
    Body(&'a [u8]),
    ChunkedSegment(&'a [u8]),
    ChunkedTerminator,
    Trailers(&'a Headers),
}

impl ResponseItem<'_> {
    fn operation(&self) -> &'static str {
        match self {
            ResponseItem::StatusLine(_) => "write_status_line",
            ResponseItem::Headers(_) => "write_headers",
            ResponseItem::Body(_) => "write_body",
            ResponseItem::ChunkedSegment(_) => "write_chunked_segment",
            ResponseItem::ChunkedTerminator => "write_chunked_terminator",
            ResponseItem::Trailers(_) => "write_trailers",
        }
    }
}

#[derive(Debug)]
pub struct ResponseEncoder {
    cursor: WriteCursor,
    header_encoder: HeaderEncoder,
    chunked_encoder: ChunkedEncoder,
    /// headers declared `transfer-encoding: chunked`
    chunked: bool,
    /// headers declared a `trailer` field
    trailer_declared: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn cursor(&self) -> WriteCursor {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == WriteCursor::Complete
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self {
            cursor: WriteCursor::StatusLine,
            header_encoder: HeaderEncoder,
            chunked_encoder: ChunkedEncoder::new(),
            chunked: false,
            trailer_declared: false,
        }
    }
}

impl Encoder<ResponseItem<'_>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ResponseItem<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match (self.cursor, item) {
            (WriteCursor::StatusLine, ResponseItem::StatusLine(status)) => {
                let reason = status.canonical_reason().unwrap_or("");
                write!(BytesWriter(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason)?;
                self.cursor = WriteCursor::Headers;
                Ok(())
            }

            (WriteCursor::Headers, ResponseItem::Headers(headers)) => {
                self.chunked = headers.is_chunked();
                self.trailer_declared = headers.contains_key(header::TRAILER);
                self.header_encoder.encode(headers, dst)?;
                self.cursor = WriteCursor::Body;
                Ok(())
            }

            (WriteCursor::Body, ResponseItem::Body(bytes)) => {
                ensure!(!self.chunked, SendError::unsupported("write_body", "chunked segment, transfer-encoding is chunked"));
                dst.extend_from_slice(bytes);
                Ok(())
            }

            (WriteCursor::Body | WriteCursor::Chunked, ResponseItem::ChunkedSegment(bytes)) => {
                ensure!(self.chunked, SendError::unsupported("write_chunked_segment", "body, transfer-encoding is not chunked"));
                self.chunked_encoder.encode(ChunkedItem::Segment(bytes), dst)?;
                self.cursor = WriteCursor::Chunked;
                Ok(())
            }

            (WriteCursor::Body | WriteCursor::Chunked, ResponseItem::ChunkedTerminator) => {
                ensure!(self.chunked, SendError::unsupported("write_chunked_terminator", "body, transfer-encoding is not chunked"));
                self.chunked_encoder.encode(ChunkedItem::<&[u8]>::Terminator, dst)?;
                self.cursor = WriteCursor::Trailers;
                Ok(())
            }

            (WriteCursor::Trailers, ResponseItem::Trailers(trailers)) => {
                ensure!(
                    trailers.is_empty() || self.trailer_declared,
                    SendError::unsupported("write_trailers", "no trailers, the headers declared no trailer field")
                );
                self.header_encoder.encode(trailers, dst)?;
                self.cursor = WriteCursor::Complete;
                Ok(())
            }

            (cursor, item) => {
                error!(operation = item.operation(), expected = cursor.expected(), "response write out of order");
                Err(SendError::unsupported(item.operation(), cursor.expected()))
            }
        }
    }
}
