//! The header table shared by requests, responses and trailers.
//!
//! Names are stored as [`HeaderName`], which is always lower case, so
//! `Host`, `HOST` and `host` all address the same entry. Each name holds a
//! single value: inserting a name that is already present replaces it.

use http::header::{self, AsHeaderName, IntoHeaderName};
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::protocol::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HeaderMap,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored for `name` if it is visible ASCII.
    pub fn get<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.inner.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn get_value<K: AsHeaderName>(&self, name: K) -> Option<&HeaderValue> {
        self.inner.get(name)
    }

    /// Stores `value` under `name`, returning the value it replaced.
    pub fn insert<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) -> Option<HeaderValue> {
        self.inner.insert(name, value)
    }

    pub fn remove<K: AsHeaderName>(&mut self, name: K) -> Option<HeaderValue> {
        self.inner.remove(name)
    }

    pub fn contains_key<K: AsHeaderName>(&self, name: K) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> header::Iter<'_, HeaderValue> {
        self.inner.iter()
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.inner
    }

    /// Parses the `content-length` header.
    ///
    /// Returns `Ok(None)` when the header is absent.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(value) = self.inner.get(header::CONTENT_LENGTH) else {
            return Ok(None);
        };

        let value = value.to_str().map_err(|_e| ParseError::invalid_content_length("value can't to_str"))?;
        value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_e| ParseError::invalid_content_length(format!("value {value} is not usize")))
    }

    /// Returns true if the last listed transfer coding is `chunked`.
    pub fn is_chunked(&self) -> bool {
        const CHUNKED: &[u8] = b"chunked";
        self.inner
            .get(header::TRANSFER_ENCODING)
            .and_then(|value| value.as_bytes().rsplit(|b| *b == b',').next())
            .is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(CHUNKED))
    }
}

/// Converts a multi-valued map, keeping the last value appended for each name.
impl From<HeaderMap> for Headers {
    fn from(map: HeaderMap) -> Self {
        let mut inner = HeaderMap::with_capacity(map.keys_len());
        for name in map.keys() {
            if let Some(value) = map.get_all(name).iter().next_back() {
                inner.insert(name.clone(), value.clone());
            }
        }
        Self { inner }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = header::Iter<'a, HeaderValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
