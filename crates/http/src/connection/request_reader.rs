//! Reads one request from a byte stream.
//!
//! The reader owns a growable buffer that starts small and doubles whenever
//! it fills up before the decoder can make progress. After every read the
//! decoder is re-entered over the buffered bytes, and consumed bytes are
//! dropped so the buffer always starts at the first unconsumed byte.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::codec::{ParseState, RequestDecoder};
use crate::protocol::{ParseError, Request};

/// Initial read buffer size in bytes.
pub const INIT_BUFFER_SIZE: usize = 8;

#[derive(Debug)]
pub struct RequestReader<R> {
    reader: R,
    buffer: BytesMut,
    decoder: RequestDecoder,
}

impl<R> RequestReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buffer: BytesMut::with_capacity(capacity.max(1)), decoder: RequestDecoder::new() }
    }

    pub fn state(&self) -> ParseState {
        self.decoder.state()
    }

    /// Current capacity of the read buffer.
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> RequestReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Reads until a full request has been decoded.
    ///
    /// # Errors
    ///
    /// Returns the decoder's [`ParseError`] for malformed input,
    /// [`ParseError::ConnectionClosed`] or [`ParseError::TruncatedBody`] when
    /// the peer closes early, and [`ParseError::Io`] when a read fails.
    pub async fn read_request(&mut self) -> Result<Request, ParseError> {
        loop {
            self.decoder.advance_buffered(&mut self.buffer)?;
            if self.decoder.state() == ParseState::Done {
                break;
            }

            if self.buffer.len() == self.buffer.capacity() {
                let additional = self.buffer.capacity().max(INIT_BUFFER_SIZE);
                self.buffer.reserve(additional);
                trace!(capacity = self.buffer.capacity(), "grow read buffer");
            }

            let read = self.reader.read_buf(&mut self.buffer).await.map_err(ParseError::io)?;
            trace!(read, state = ?self.decoder.state(), "read from stream");

            if read == 0 {
                self.decoder.end_of_stream()?;
                break;
            }
        }

        self.decoder.take_request().ok_or(ParseError::AlreadyDone)
    }
}
