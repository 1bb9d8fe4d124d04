//! Serialization of a header table into a header section or trailer block.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{Headers, SendError};

/// Writes one `name: value\r\n` line per entry followed by the blank `\r\n`
/// line that closes the block.
///
/// Used for both the response header section and the trailer block after a
/// chunked body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<&Headers> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, headers: &Headers, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = headers.iter().map(|(name, value)| name.as_str().len() + value.len() + 4).sum::<usize>() + 2;
        dst.reserve(size);

        for (name, value) in headers {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
