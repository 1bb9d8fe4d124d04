//! Incremental decoding of header field lines.
//!
//! A header section is decoded one line at a time so the caller can feed it
//! whatever bytes have arrived so far. Each call reports exactly how many bytes
//! it consumed, letting the caller slide its buffer forward.

use http::{HeaderName, HeaderValue};
use tracing::trace;

use crate::protocol::{Headers, ParseError};
use crate::utils::{find_crlf, is_token};
use crate::ensure;

/// Outcome of decoding a single header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// No complete line is buffered yet; nothing was consumed.
    Partial,
    /// A field line was stored.
    Field { consumed: usize },
    /// The blank line terminating the header section.
    End { consumed: usize },
}

impl LineStatus {
    /// Number of bytes the caller should drop from the front of its buffer.
    #[inline]
    pub fn consumed(&self) -> usize {
        match self {
            LineStatus::Partial => 0,
            LineStatus::Field { consumed } | LineStatus::End { consumed } => *consumed,
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, LineStatus::End { .. })
    }
}

impl Headers {
    /// Decodes the next header line from the front of `src`.
    ///
    /// This is restartable: when no CRLF is buffered yet it returns
    /// [`LineStatus::Partial`] and may be called again once more bytes arrive.
    /// On error nothing is consumed and the table is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidHeader`] if the line has no colon, an empty
    /// name, whitespace before the colon, or a name with non-token characters.
    pub fn parse_one(&mut self, src: &[u8]) -> Result<LineStatus, ParseError> {
        let Some(line_end) = find_crlf(src) else {
            return Ok(LineStatus::Partial);
        };
        let consumed = line_end + 2;

        let line = src[..line_end].trim_ascii();
        if line.is_empty() {
            return Ok(LineStatus::End { consumed });
        }

        let colon = line.iter().position(|b| *b == b':').ok_or_else(|| ParseError::invalid_header("missing colon"))?;
        ensure!(colon > 0, ParseError::invalid_header("empty header name"));
        ensure!(line[colon - 1] != b' ', ParseError::invalid_header("whitespace between header name and colon"));

        let name = &line[..colon];
        ensure!(
            is_token(name),
            ParseError::invalid_header(format!("header name {:?} contains invalid characters", String::from_utf8_lossy(name)))
        );
        let value = line[colon + 1..].trim_ascii();

        let name = HeaderName::from_bytes(name).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(value).map_err(ParseError::invalid_header)?;

        trace!(name = %name, consumed, "parsed header line");
        self.insert(name, value);

        Ok(LineStatus::Field { consumed })
    }
}
