//! Decoding of the request line, `METHOD SP TARGET SP HTTP/VERSION CRLF`.

use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, RequestLine};
use crate::utils::{find_crlf, is_token};

const VERSION_PREFIX: &str = "HTTP/";

/// Decodes the request line at the front of `src`.
///
/// Returns `Ok(None)` while no CRLF is buffered. On success returns the line
/// and the number of bytes consumed, which is the line length plus the CRLF.
pub(crate) fn decode_request_line(src: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(src) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&src[..line_end]).map_err(|_e| ParseError::invalid_request_line("not valid utf-8"))?;

    let fields = line.split(' ').collect::<Vec<_>>();
    ensure!(fields.len() == 3, ParseError::invalid_request_line(format!("expected 3 fields, found {}: {line:?}", fields.len())));

    let (method, target, version) = (fields[0], fields[1], fields[2]);
    ensure!(is_token(method.as_bytes()), ParseError::invalid_request_line(format!("invalid method {method:?}")));
    ensure!(!target.is_empty(), ParseError::invalid_request_line("empty request target"));

    let version_number = version.strip_prefix(VERSION_PREFIX).ok_or_else(|| ParseError::invalid_version(version))?;
    ensure!(
        !version_number.is_empty() && version_number.bytes().all(|b| b.is_ascii_digit() || b == b'.'),
        ParseError::invalid_version(version)
    );

    trace!(method, target, version = version_number, "parsed request line");
    Ok(Some((RequestLine::new(method, target, version_number), line_end + 2)))
}
