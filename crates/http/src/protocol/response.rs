//! Response helpers.

use http::HeaderValue;
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};

use crate::protocol::Headers;

/// Baseline headers for a response with a `content_length` byte body.
///
/// Callers may override any entry before writing the header section.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(content_length));
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers
}
