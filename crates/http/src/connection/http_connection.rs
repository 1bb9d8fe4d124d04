use std::sync::Arc;

use http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::connection::{RequestReader, ResponseWriter};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, SendError, default_headers};

/// A single-request HTTP connection.
///
/// `HttpConnection` reads one request from `R`, hands it to a [`Handler`]
/// together with a [`ResponseWriter`] over `W`, and closes once the handler
/// returns. Malformed requests are answered with `400 Bad Request` before the
/// connection closes; a peer that hangs up early just gets closed.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: RequestReader<R>,
    writer: W,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader: RequestReader::new(reader), writer }
    }

    /// Uses an initial read buffer of `capacity` bytes instead of the default.
    pub fn with_capacity(reader: R, writer: W, capacity: usize) -> Self {
        Self { reader: RequestReader::with_capacity(reader, capacity), writer }
    }

    pub async fn process<H>(self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler<W>,
    {
        let Self { mut reader, writer } = self;

        let request = match reader.read_request().await {
            Ok(request) => request,
            Err(e) if e.is_malformed() => {
                warn!(cause = %e, "malformed request, respond bad request");
                if let Err(send_error) = send_bad_request(writer).await {
                    error!(cause = %send_error, "failed to send bad request response");
                }
                return Err(e.into());
            }
            Err(e) => {
                if e.is_premature_close() {
                    info!(cause = %e, "peer closed before the request was complete");
                } else {
                    error!(cause = %e, "can't receive request");
                }
                return Err(e.into());
            }
        };

        debug!("received request\n{request}");

        let result = handler.call(ResponseWriter::new(writer), request).await;
        // the write half went down with the handler's writer
        drop(reader);

        result.map_err(HttpError::handler)
    }
}

async fn send_bad_request<W>(writer: W) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    let writer = ResponseWriter::new(writer).write_status_line(StatusCode::BAD_REQUEST).await?;
    writer.write_headers(&default_headers(0)).await?;
    Ok(())
}

/// Returns true when `error` only means the peer went away.
pub(crate) fn is_peer_gone(error: &HttpError) -> bool {
    matches!(error, HttpError::RequestError { source } if source.is_premature_close() || matches!(source, ParseError::Io { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::Request;
    use crate::test_utils::ChunkReader;
    use indoc::indoc;

    async fn echo_target(writer: ResponseWriter<Vec<u8>>, request: Request) -> Result<(), SendError> {
        let body = request.target().as_bytes();
        let writer = writer.write_status_line(StatusCode::OK).await?;
        let mut writer = writer.write_headers(&default_headers(body.len())).await?;
        writer.write_body(body).await?;
        Ok(())
    }

    async fn run(input: &[u8]) -> (Result<(), HttpError>, Vec<u8>) {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handler = Arc::new(make_handler(move |writer: ResponseWriter<Vec<u8>>, request: Request| {
            let tx = tx.clone();
            async move {
                let writer = capture(writer, request).await?;
                tx.send(writer).map_err(|_| SendError::io(std::io::ErrorKind::BrokenPipe))?;
                Ok::<_, SendError>(())
            }
        }));

        let connection = HttpConnection::new(ChunkReader::new(input, 8), Vec::new());
        let result = connection.process(handler).await;
        let output = rx.try_recv().unwrap_or_default();
        (result, output)
    }

    async fn capture(writer: ResponseWriter<Vec<u8>>, request: Request) -> Result<Vec<u8>, SendError> {
        let body = request.target().as_bytes().to_vec();
        let writer = writer.write_status_line(StatusCode::OK).await?;
        let mut writer = writer.write_headers(&default_headers(body.len())).await?;
        writer.write_body(&body).await?;
        Ok(writer.into_inner())
    }

    #[tokio::test]
    async fn handler_writes_response() {
        let input = indoc! {"
            GET /coffee HTTP/1.1\r
            Host: localhost:42069\r
            \r
        "};

        let (result, output) = run(input.as_bytes()).await;

        assert!(result.is_ok());
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\n/coffee"));
    }

    #[tokio::test]
    async fn handler_fn_is_a_handler() {
        let handler = Arc::new(make_handler(echo_target));
        let connection = HttpConnection::new(ChunkReader::new(b"GET /tea HTTP/1.1\r\n\r\n", 8), Vec::new());

        assert!(connection.process(handler).await.is_ok());
    }

    #[tokio::test]
    async fn handler_error_is_reported() {
        let handler = Arc::new(make_handler(|_writer: ResponseWriter<Vec<u8>>, _request: Request| async move {
            Err::<(), _>(SendError::unsupported("write_body", "status line"))
        }));
        let connection = HttpConnection::new(ChunkReader::new(b"GET / HTTP/1.1\r\n\r\n", 8), Vec::new());

        let error = connection.process(handler).await.unwrap_err();
        assert!(matches!(error, HttpError::HandlerError { .. }));
    }

    #[tokio::test]
    async fn malformed_request_is_not_handled() {
        let (result, output) = run(b"GET / HTTP/1.1\r\nHost : localhost\r\n\r\n").await;

        let error = result.unwrap_err();
        assert!(matches!(error, HttpError::RequestError { source: ParseError::InvalidHeader { .. } }));
        assert!(!is_peer_gone(&error));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn bad_request_response_format() {
        let mut out = Vec::new();
        send_bad_request(&mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\ncontent-type: text/plain\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn premature_close_skips_handler() {
        let (result, output) = run(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel").await;

        let error = result.unwrap_err();
        assert!(is_peer_gone(&error));
        assert!(output.is_empty());
    }
}
