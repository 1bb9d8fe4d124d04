//! Typestate response writer handed to handlers.
//!
//! Each stage type only exposes the writes that may legally come next, so a
//! handler cannot send a body before its headers:
//!
//! ```compile_fail
//! # use raw_http::connection::ResponseWriter;
//! # async fn f(writer: ResponseWriter<Vec<u8>>) {
//! let mut writer = writer;
//! writer.write_body(b"too early").await;
//! # }
//! ```
//!
//! Checks that depend on runtime values, such as whether the headers declared
//! chunked framing, are still enforced by the underlying [`ResponseEncoder`]
//! and reported as [`SendError::Unsupported`].

use std::marker::PhantomData;

use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::{ResponseEncoder, ResponseItem, WriteCursor};
use crate::protocol::{Headers, SendError};

/// Marker types for the stages of a response.
pub mod stage {
    /// Nothing has been written yet.
    #[derive(Debug)]
    pub struct StatusLine;

    /// The status line is out, the header section comes next.
    #[derive(Debug)]
    pub struct HeaderSection;

    /// Headers are out, body bytes or chunked segments may follow.
    #[derive(Debug)]
    pub struct Body;

    /// At least one chunked segment was written.
    #[derive(Debug)]
    pub struct Chunked;

    /// The chunked terminator was written, trailers come next.
    #[derive(Debug)]
    pub struct Trailers;

    /// The message is complete.
    #[derive(Debug)]
    pub struct Complete;
}

#[derive(Debug)]
pub struct ResponseWriter<W, S = stage::StatusLine> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    written: usize,
    stage: PhantomData<S>,
}

impl<W> ResponseWriter<W, stage::StatusLine> {
    pub fn new(writer: W) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(256), encoder: ResponseEncoder::new(), written: 0, stage: PhantomData }
    }
}

impl<W, S> ResponseWriter<W, S> {
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Total bytes written to the underlying stream so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn cursor(&self) -> WriteCursor {
        self.encoder.cursor()
    }

    fn into_stage<T>(self) -> ResponseWriter<W, T> {
        ResponseWriter { writer: self.writer, buffer: self.buffer, encoder: self.encoder, written: self.written, stage: PhantomData }
    }
}

impl<W, S> ResponseWriter<W, S>
where
    W: AsyncWrite + Unpin,
{
    async fn send(&mut self, item: ResponseItem<'_>) -> Result<(), SendError> {
        self.encoder.encode(item, &mut self.buffer)?;
        let bytes = self.buffer.split();
        self.writer.write_all(&bytes).await.map_err(SendError::io)?;
        self.writer.flush().await.map_err(SendError::io)?;
        self.written += bytes.len();
        trace!(len = bytes.len(), cursor = ?self.encoder.cursor(), "response bytes flushed");
        Ok(())
    }
}

impl<W> ResponseWriter<W, stage::StatusLine>
where
    W: AsyncWrite + Unpin,
{
    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(mut self, status: StatusCode) -> Result<ResponseWriter<W, stage::HeaderSection>, SendError> {
        self.send(ResponseItem::StatusLine(status)).await?;
        Ok(self.into_stage())
    }
}

impl<W> ResponseWriter<W, stage::HeaderSection>
where
    W: AsyncWrite + Unpin,
{
    /// Writes every header line followed by the blank line ending the section.
    pub async fn write_headers(mut self, headers: &Headers) -> Result<ResponseWriter<W, stage::Body>, SendError> {
        self.send(ResponseItem::Headers(headers)).await?;
        Ok(self.into_stage())
    }
}

impl<W> ResponseWriter<W, stage::Body>
where
    W: AsyncWrite + Unpin,
{
    /// Writes raw body bytes. May be called any number of times.
    ///
    /// # Errors
    ///
    /// Fails with [`SendError::Unsupported`] when the headers declared
    /// `transfer-encoding: chunked`.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.send(ResponseItem::Body(body)).await?;
        Ok(body.len())
    }

    /// Writes the first chunked segment.
    pub async fn write_chunked_segment(mut self, data: &[u8]) -> Result<ResponseWriter<W, stage::Chunked>, SendError> {
        self.send(ResponseItem::ChunkedSegment(data)).await?;
        Ok(self.into_stage())
    }

    /// Ends a chunked body that carried no segments.
    pub async fn write_chunked_terminator(mut self) -> Result<ResponseWriter<W, stage::Trailers>, SendError> {
        self.send(ResponseItem::ChunkedTerminator).await?;
        Ok(self.into_stage())
    }
}

impl<W> ResponseWriter<W, stage::Chunked>
where
    W: AsyncWrite + Unpin,
{
    /// Writes `HEX\r\ndata\r\n`. Empty segments are rejected.
    pub async fn write_chunked_segment(&mut self, data: &[u8]) -> Result<usize, SendError> {
        self.send(ResponseItem::ChunkedSegment(data)).await?;
        Ok(data.len())
    }

    pub async fn write_chunked_terminator(mut self) -> Result<ResponseWriter<W, stage::Trailers>, SendError> {
        self.send(ResponseItem::ChunkedTerminator).await?;
        Ok(self.into_stage())
    }
}

impl<W> ResponseWriter<W, stage::Trailers>
where
    W: AsyncWrite + Unpin,
{
    /// Writes the trailer fields and the final CRLF.
    ///
    /// # Errors
    ///
    /// A non-empty `trailers` table needs a `trailer` header in the header
    /// section, otherwise [`SendError::Unsupported`] is returned.
    pub async fn write_trailers(mut self, trailers: &Headers) -> Result<ResponseWriter<W, stage::Complete>, SendError> {
        self.send(ResponseItem::Trailers(trailers)).await?;
        Ok(self.into_stage())
    }

    /// Completes a chunked message without trailers.
    pub async fn finish(self) -> Result<ResponseWriter<W, stage::Complete>, SendError> {
        self.write_trailers(&Headers::new()).await
    }
}
