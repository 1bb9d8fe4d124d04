//! Request routing for the demo server.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, TRAILER, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use raw_http::connection::{ResponseWriter, stage};
use raw_http::handler::Handler;
use raw_http::protocol::{Headers, Request, SendError, default_headers};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tracing::{error, info, warn};

use crate::config::Config;

const PROXY_PREFIX: &str = "/httpbin";

/// Request headers that describe this hop only and are never forwarded.
const HOP_BY_HOP: &[&str] =
    &["connection", "keep-alive", "proxy-connection", "te", "trailer", "transfer-encoding", "upgrade", "host", "content-length"];

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>
";

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>
";

const INTERNAL_SERVER_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>
";

const BAD_GATEWAY_PAGE: &str = "<html>
  <head>
    <title>502 Bad Gateway</title>
  </head>
  <body>
    <h1>Bad Gateway</h1>
    <p>The upstream server could not be reached.</p>
  </body>
</html>
";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("send response error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("upstream error: {source}")]
    Upstream {
        #[from]
        source: reqwest::Error,
    },

    #[error("invalid header value: {source}")]
    InvalidHeader {
        #[from]
        source: http::header::InvalidHeaderValue,
    },
}

#[derive(Debug)]
pub struct App {
    client: reqwest::Client,
    upstream: String,
    video: PathBuf,
}

impl App {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, upstream: config.upstream.trim_end_matches('/').to_string(), video: config.video.clone() })
    }

    async fn video<W>(&self, writer: ResponseWriter<W>) -> Result<(), AppError>
    where
        W: AsyncWrite + Unpin,
    {
        match tokio::fs::read(&self.video).await {
            Ok(video) => Ok(respond(writer, StatusCode::OK, "video/mp4", &video).await?),
            Err(e) => {
                error!(cause = %e, path = ?self.video, "can't read video file");
                Ok(html(writer, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_PAGE).await?)
            }
        }
    }

    /// Forwards the request upstream and re-streams the response body as
    /// chunked segments, followed by the body's digest and length as trailers.
    async fn proxy<W>(&self, writer: ResponseWriter<W>, request: Request, path: &str) -> Result<(), AppError>
    where
        W: AsyncWrite + Unpin,
    {
        let url = format!("{}{path}", self.upstream);
        let Ok(method) = reqwest::Method::from_bytes(request.method().as_bytes()) else {
            return Ok(html(writer, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await?);
        };

        let mut upstream_request = self.client.request(method, &url).headers(forwarded_headers(request.headers()));
        if request.headers().contains_key(CONTENT_LENGTH) {
            upstream_request = upstream_request.body(request.body().clone());
        }

        let response = match upstream_request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(cause = %e, %url, "upstream request failed");
                return Ok(html(writer, StatusCode::BAD_GATEWAY, BAD_GATEWAY_PAGE).await?);
            }
        };
        info!(%url, status = %response.status(), "proxying upstream response");

        let mut headers = Headers::from(response.headers().clone());
        headers.remove(CONTENT_LENGTH);
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        headers.insert(TRAILER, HeaderValue::from_static("X-Content-SHA256, X-Content-Length"));

        let writer = writer.write_status_line(response.status()).await?;
        let writer = writer.write_headers(&headers).await?;

        let stream = response.bytes_stream();
        futures::pin_mut!(stream);
        let (writer, digest, length) = stream_chunked(writer, &mut stream).await?;

        let mut trailers = Headers::new();
        trailers.insert("x-content-sha256", HeaderValue::try_from(digest)?);
        trailers.insert("x-content-length", HeaderValue::from(length));
        writer.write_trailers(&trailers).await?;
        Ok(())
    }
}

#[async_trait]
impl<W> Handler<W> for App
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Error = AppError;

    async fn call(&self, writer: ResponseWriter<W>, request: Request) -> Result<(), Self::Error> {
        let target = request.target().to_string();
        match target.as_str() {
            "/yourproblem" => Ok(html(writer, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await?),
            "/myproblem" => Ok(html(writer, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_PAGE).await?),
            "/video" => self.video(writer).await,
            target => match target.strip_prefix(PROXY_PREFIX) {
                Some(path) if path.is_empty() || path.starts_with('/') => self.proxy(writer, request, path).await,
                _ => Ok(html(writer, StatusCode::OK, OK_PAGE).await?),
            },
        }
    }
}

/// End-to-end request headers to send upstream: everything except the
/// hop-by-hop set and any field the `connection` header names.
fn forwarded_headers(headers: &Headers) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get(CONNECTION)
        .map(|value| value.split(',').map(|name| name.trim().to_ascii_lowercase()).collect())
        .unwrap_or_default();

    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if !HOP_BY_HOP.contains(&name_str) && !connection_listed.iter().any(|listed| listed == name_str) {
            forwarded.insert(HeaderName::clone(name), value.clone());
        }
    }
    forwarded
}

/// Writes every non-empty piece of `stream` as a chunked segment, then the
/// terminator. Returns the hex SHA-256 and length of everything written.
async fn stream_chunked<W, S>(
    writer: ResponseWriter<W, stage::Body>,
    stream: &mut S,
) -> Result<(ResponseWriter<W, stage::Trailers>, String, usize), AppError>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let mut hasher = Sha256::new();
    let mut length = 0;

    let writer = match next_chunk(stream).await? {
        None => writer.write_chunked_terminator().await?,
        Some(first) => {
            hasher.update(&first);
            length += first.len();
            let mut writer = writer.write_chunked_segment(&first).await?;
            while let Some(chunk) = next_chunk(stream).await? {
                hasher.update(&chunk);
                length += writer.write_chunked_segment(&chunk).await?;
            }
            writer.write_chunked_terminator().await?
        }
    };

    Ok((writer, hex::encode(hasher.finalize()), length))
}

async fn next_chunk<S>(stream: &mut S) -> Result<Option<Bytes>, reqwest::Error>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if !chunk.is_empty() {
            return Ok(Some(chunk));
        }
    }
    Ok(None)
}

async fn html<W>(writer: ResponseWriter<W>, status: StatusCode, page: &str) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    respond(writer, status, "text/html", page.as_bytes()).await
}

async fn respond<W>(writer: ResponseWriter<W>, status: StatusCode, content_type: &'static str, body: &[u8]) -> Result<(), SendError>
where
    W: AsyncWrite + Unpin,
{
    let mut headers = default_headers(body.len());
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

    let writer = writer.write_status_line(status).await?;
    let mut writer = writer.write_headers(&headers).await?;
    writer.write_body(body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_http::handler::make_handler;
    use raw_http::protocol::RequestLine;
    use raw_http::server::serve;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::net::tcp::OwnedWriteHalf;

    fn app(upstream: &str, video: PathBuf) -> App {
        let config = Config { port: 0, video, upstream: upstream.to_string(), buffer_size: 8 };
        App::new(&config).unwrap()
    }

    fn get(target: &str) -> Request {
        Request::new(RequestLine::new("GET", target, "1.1"), Headers::new(), Bytes::new())
    }

    async fn call(app: &App, request: Request) -> String {
        let (mut client, server) = tokio::io::duplex(1 << 20);
        Handler::<DuplexStream>::call(app, ResponseWriter::new(server), request).await.unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn your_problem_is_bad_request() {
        let response = call(&app("http://127.0.0.1:1", PathBuf::new()), get("/yourproblem")).await;

        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("content-type: text/html\r\n"));
        assert!(response.contains(&format!("content-length: {}\r\n", BAD_REQUEST_PAGE.len())));
        assert!(response.ends_with(BAD_REQUEST_PAGE));
    }

    #[tokio::test]
    async fn my_problem_is_internal_server_error() {
        let response = call(&app("http://127.0.0.1:1", PathBuf::new()), get("/myproblem")).await;

        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.ends_with(INTERNAL_SERVER_ERROR_PAGE));
    }

    #[tokio::test]
    async fn anything_else_is_ok() {
        let response = call(&app("http://127.0.0.1:1", PathBuf::new()), get("/httpbinary")).await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with(OK_PAGE));
    }

    #[tokio::test]
    async fn serves_video_file() {
        let path = std::env::temp_dir().join(format!("raw-http-video-{}.mp4", std::process::id()));
        std::fs::write(&path, b"not really a video").unwrap();

        let response = call(&app("http://127.0.0.1:1", path.clone()), get("/video")).await;
        std::fs::remove_file(&path).unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("content-type: video/mp4\r\n"));
        assert!(response.ends_with("\r\n\r\nnot really a video"));
    }

    #[tokio::test]
    async fn missing_video_is_internal_server_error() {
        let response = call(&app("http://127.0.0.1:1", PathBuf::from("/nonexistent/video.mp4")), get("/video")).await;

        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let response = call(&app("http://127.0.0.1:1", PathBuf::new()), get("/httpbin/get")).await;

        assert!(response.starts_with("HTTP/1.1 502 Bad Gateway\r\n"));
    }

    #[test]
    fn hop_by_hop_headers_are_not_forwarded() {
        let mut headers = Headers::new();
        headers.insert("host", HeaderValue::from_static("localhost:42069"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive, X-Hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-hop", HeaderValue::from_static("1"));
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.insert("user-agent", HeaderValue::from_static("curl/7.81.0"));

        let forwarded = forwarded_headers(&headers);

        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded.get("accept").unwrap(), "*/*");
        assert_eq!(forwarded.get("user-agent").unwrap(), "curl/7.81.0");
    }

    async fn echo_header_names(writer: ResponseWriter<OwnedWriteHalf>, request: Request) -> Result<(), SendError> {
        let mut names: Vec<&str> = request.headers().iter().map(|(name, _)| name.as_str()).collect();
        names.sort_unstable();
        let body = names.join(",");
        let writer = writer.write_status_line(StatusCode::OK).await?;
        let mut writer = writer.write_headers(&default_headers(body.len())).await?;
        writer.write_body(body.as_bytes()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn proxy_drops_transfer_encoding_sent_by_client() {
        let handle = serve(0, make_handler(echo_header_names)).await.unwrap();
        let upstream_url = format!("http://127.0.0.1:{}", handle.local_addr().port());

        let mut headers = Headers::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(CONNECTION, HeaderValue::from_static("x-hop"));
        headers.insert("x-hop", HeaderValue::from_static("1"));
        headers.insert("x-end-to-end", HeaderValue::from_static("1"));
        let request = Request::new(RequestLine::new("POST", "/httpbin/post", "1.1"), headers, Bytes::from_static(b"hello"));

        let response = call(&app(&upstream_url, PathBuf::new()), request).await;
        handle.close().await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("x-end-to-end"));
        assert!(!response.contains("x-hop"));
        assert!(!response.contains("transfer-encoding,"));
    }

    async fn upstream(writer: ResponseWriter<OwnedWriteHalf>, request: Request) -> Result<(), SendError> {
        let body = format!("{} {} {}", request.method(), request.target(), String::from_utf8_lossy(request.body()));
        let writer = writer.write_status_line(StatusCode::CREATED).await?;
        let mut writer = writer.write_headers(&default_headers(body.len())).await?;
        writer.write_body(body.as_bytes()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn proxies_as_chunked_with_trailers() {
        let handle = serve(0, make_handler(upstream)).await.unwrap();
        let upstream_url = format!("http://127.0.0.1:{}/", handle.local_addr().port());

        let mut headers = Headers::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        let request = Request::new(RequestLine::new("POST", "/httpbin/post", "1.1"), headers, Bytes::from_static(b"hello"));

        let response = call(&app(&upstream_url, PathBuf::new()), request).await;
        handle.close().await.unwrap();

        let expected_body = "POST /post hello";
        let digest = hex::encode(Sha256::digest(expected_body.as_bytes()));

        assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(response.contains("transfer-encoding: chunked\r\n"));
        assert!(response.contains("trailer: X-Content-SHA256, X-Content-Length\r\n"));
        let head = &response[..response.find("\r\n\r\n").unwrap()];
        assert!(!head.contains("\r\ncontent-length:"));
        assert!(response.ends_with(&format!(
            "0\r\nx-content-sha256: {digest}\r\nx-content-length: {}\r\n\r\n",
            expected_body.len()
        )));
    }
}
