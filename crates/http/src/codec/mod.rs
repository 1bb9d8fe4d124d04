//! Sans-IO request decoding and response encoding.
//!
//! Nothing in this module touches a socket: decoders work on buffered bytes
//! and report how much they consumed, encoders append to a `BytesMut`. The
//! [`connection`](crate::connection) module drives them over real streams.
//!
//! - Request handling:
//!   - [`RequestDecoder`]: the request state machine
//!   - [`Headers::parse_one`](crate::protocol::Headers::parse_one) and
//!     [`LineStatus`]: incremental header line decoding
//!   - [`LengthDecoder`]: Content-Length bounded bodies
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: order-enforcing response encoder
//!   - [`HeaderEncoder`]: header sections and trailer blocks
//!   - [`ChunkedEncoder`]: chunked transfer-encoding framing
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use raw_http::codec::{RequestDecoder, ResponseEncoder, ResponseItem};
//! use raw_http::protocol::default_headers;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let mut src = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//! let request = decoder.decode(&mut src).unwrap().unwrap();
//! assert_eq!(request.target(), "/");
//!
//! let mut encoder = ResponseEncoder::new();
//! let mut dst = BytesMut::new();
//! let headers = default_headers(2);
//! encoder.encode(ResponseItem::StatusLine(http::StatusCode::OK), &mut dst).unwrap();
//! encoder.encode(ResponseItem::Headers(&headers), &mut dst).unwrap();
//! encoder.encode(ResponseItem::Body(b"ok"), &mut dst).unwrap();
//! ```

mod body;
mod header;
mod request_decoder;
mod request_line_decoder;
mod response_encoder;

pub use body::{ChunkedEncoder, ChunkedItem, LengthDecoder};
pub use header::{HeaderEncoder, LineStatus};
pub use request_decoder::{ParseState, RequestDecoder};
pub use response_encoder::{ResponseEncoder, ResponseItem, WriteCursor};
