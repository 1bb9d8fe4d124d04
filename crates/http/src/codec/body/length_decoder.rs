//! Decoder for request bodies bounded by a Content-Length header.
//!
//! Unlike a streaming decoder, this accumulates the whole body: every byte
//! offered is taken, and receiving more than the declared length is a protocol
//! violation rather than the start of a next message.

use bytes::{Bytes, BytesMut};

use crate::ensure;
use crate::protocol::ParseError;

/// Upper bound on the up-front allocation; larger bodies grow as they arrive.
const MAX_PREALLOCATE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    /// Declared Content-Length
    length: usize,
    body: BytesMut,
}

impl LengthDecoder {
    pub fn new(length: usize) -> Self {
        Self { length, body: BytesMut::with_capacity(length.min(MAX_PREALLOCATE)) }
    }

    /// Appends all of `src` to the body and returns the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BodyOverrun`] if the body would exceed the declared
    /// length. Nothing is appended in that case.
    pub fn feed(&mut self, src: &[u8]) -> Result<usize, ParseError> {
        let received = self.body.len() + src.len();
        ensure!(received <= self.length, ParseError::body_overrun(self.length, received));

        self.body.extend_from_slice(src);
        Ok(src.len())
    }

    #[inline]
    pub fn is_finish(&self) -> bool {
        self.body.len() == self.length
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn received(&self) -> usize {
        self.body.len()
    }

    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}
