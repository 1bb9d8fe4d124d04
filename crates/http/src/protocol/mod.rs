//! Protocol types shared by the codec and connection layers.
//!
//! - [`Headers`]: the single-valued, case-insensitive header table
//! - [`Request`] and [`RequestLine`]: the parsed inbound request
//! - [`default_headers`]: baseline response headers
//! - [`HttpError`], [`ParseError`], [`SendError`]: error types

mod headers;
pub use headers::Headers;

mod request;
pub use request::Request;
pub use request::RequestLine;

mod response;
pub use response::default_headers;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
