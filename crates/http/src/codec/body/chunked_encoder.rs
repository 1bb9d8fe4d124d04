use bytes::{Buf, BufMut, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;

use crate::protocol::SendError;
use crate::utils::BytesWriter;

/// An item of a chunked transfer-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkedItem<D: Buf> {
    /// One `HEX-SIZE CRLF data CRLF` segment
    Segment(D),
    /// The zero-size `0 CRLF` chunk; trailers follow it
    Terminator,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Total payload bytes sent in segments, excluding framing.
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl<D: Buf> Encoder<ChunkedItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ChunkedItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Err(SendError::unsupported("chunked segment", "trailers"));
        }

        match item {
            ChunkedItem::Segment(mut bytes) => {
                if !bytes.has_remaining() {
                    return Err(SendError::unsupported("empty chunked segment", "a non-empty segment"));
                }
                let size = bytes.remaining();
                write!(BytesWriter(dst), "{size:X}\r\n")?;
                dst.reserve(size + 2);
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.put_slice(chunk);
                    bytes.advance(len);
                }
                dst.put_slice(b"\r\n");
                self.send_size += size;
                Ok(())
            }
            ChunkedItem::Terminator => {
                self.eof = true;
                dst.put_slice(b"0\r\n");
                Ok(())
            }
        }
    }
}
