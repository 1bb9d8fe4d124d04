//! The request handler abstraction.
//!
//! A handler is invoked once per connection with the parsed [`Request`] and a
//! [`ResponseWriter`] positioned at the status line. It owns the whole
//! response; the connection is closed once the returned future resolves.

use std::error::Error;

use async_trait::async_trait;

use crate::connection::ResponseWriter;
use crate::protocol::Request;

#[async_trait]
pub trait Handler<W>: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, writer: ResponseWriter<W>, request: Request) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<W, Err, F, Fut> Handler<W> for HandlerFn<F>
where
    W: Send + 'static,
    F: Fn(ResponseWriter<W>, Request) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<(), Err>> + Send,
{
    type Error = Err;

    async fn call(&self, writer: ResponseWriter<W>, request: Request) -> Result<(), Self::Error> {
        (self.f)(writer, request).await
    }
}

/// Adapts an async function or closure into a [`Handler`].
///
/// ```
/// use raw_http::connection::ResponseWriter;
/// use raw_http::handler::make_handler;
/// use raw_http::protocol::{Request, SendError, default_headers};
/// use http::StatusCode;
/// use tokio::net::tcp::OwnedWriteHalf;
///
/// async fn hello(writer: ResponseWriter<OwnedWriteHalf>, _request: Request) -> Result<(), SendError> {
///     let writer = writer.write_status_line(StatusCode::OK).await?;
///     let mut writer = writer.write_headers(&default_headers(5)).await?;
///     writer.write_body(b"hello").await?;
///     Ok(())
/// }
///
/// let _handler = make_handler(hello);
/// ```
pub fn make_handler<F, W, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<(), Err>>,
    F: Fn(ResponseWriter<W>, Request) -> Ret,
{
    HandlerFn { f }
}
