//! An HTTP/1.1 server built directly on TCP byte streams.
//!
//! The crate parses requests incrementally from a stream that may deliver
//! bytes in arbitrarily small pieces, hands each request to a user handler
//! together with a writer that enforces the order of response parts, and
//! serves one request per connection.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use raw_http::connection::ResponseWriter;
//! use raw_http::handler::make_handler;
//! use raw_http::protocol::{Request, SendError, default_headers};
//! use raw_http::server::serve;
//! use tokio::net::tcp::OwnedWriteHalf;
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = serve(42069, make_handler(hello_world)).await.unwrap();
//!     info!(local_addr = %handle.local_addr(), "server started");
//!
//!     tokio::signal::ctrl_c().await.unwrap();
//!     handle.close().await.unwrap();
//! }
//!
//! async fn hello_world(writer: ResponseWriter<OwnedWriteHalf>, request: Request) -> Result<(), SendError> {
//!     info!(target = request.target(), "request received");
//!
//!     let body = b"Hello World!\r\n";
//!     let writer = writer.write_status_line(StatusCode::OK).await?;
//!     let mut writer = writer.write_headers(&default_headers(body.len())).await?;
//!     writer.write_body(body).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: sans-IO request decoding and response encoding
//! - [`protocol`]: headers, requests and error types
//! - [`connection`]: request reading and response writing over async streams
//! - [`handler`]: the handler trait and the [`handler::make_handler`] adapter
//! - [`server`]: listener, accept loop, workers and shutdown
//!
//! # Limitations
//!
//! - One request per connection, the connection is closed after the response
//! - No chunked request bodies; request bodies are framed by `Content-Length`
//! - No timeouts and no TLS

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;

#[cfg(test)]
mod test_utils;
