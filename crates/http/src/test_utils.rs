//! Scripted IO for tests.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// A reader that hands out its data in fixed size pieces.
///
/// Every read returns at most `chunk_size` bytes, and when `pending_between`
/// is set each piece is preceded by a `Pending` poll to simulate a peer that
/// has not sent anything yet.
#[derive(Debug)]
pub(crate) struct ChunkReader {
    chunks: VecDeque<Vec<u8>>,
    pending_between: bool,
    pending_next: bool,
    fail_at_end: bool,
}

impl ChunkReader {
    pub(crate) fn new(data: &[u8], chunk_size: usize) -> Self {
        Self {
            chunks: data.chunks(chunk_size).map(<[u8]>::to_vec).collect(),
            pending_between: false,
            pending_next: false,
            fail_at_end: false,
        }
    }

    pub(crate) fn with_pending(mut self) -> Self {
        self.pending_between = true;
        self.pending_next = true;
        self
    }

    /// Fail with `ConnectionReset` instead of reporting end of stream.
    pub(crate) fn with_reset(mut self) -> Self {
        self.fail_at_end = true;
        self
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if self.pending_next {
            self.pending_next = false;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        self.pending_next = self.pending_between;

        let Some(mut chunk) = self.chunks.pop_front() else {
            if self.fail_at_end {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
            }
            return Poll::Ready(Ok(()));
        };

        let amt = chunk.len().min(buf.remaining());
        buf.put_slice(&chunk[..amt]);
        if amt < chunk.len() {
            let rest = chunk.split_off(amt);
            self.chunks.push_front(rest);
        }
        Poll::Ready(Ok(()))
    }
}
