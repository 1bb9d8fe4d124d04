//! Connection handling over async byte streams.
//!
//! - [`RequestReader`]: reads one request through a growing buffer
//! - [`ResponseWriter`]: typestate response writer handed to handlers
//! - [`HttpConnection`]: ties both to a [`Handler`](crate::handler::Handler)

mod http_connection;
mod request_reader;
mod response_writer;

pub(crate) use http_connection::is_peer_gone;
pub use http_connection::HttpConnection;
pub use request_reader::{INIT_BUFFER_SIZE, RequestReader};
pub use response_writer::{ResponseWriter, stage};
