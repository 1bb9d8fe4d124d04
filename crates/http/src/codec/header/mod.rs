//! Header section decoding and encoding.
//!
//! - [`LineStatus`] with [`Headers::parse_one`](crate::protocol::Headers::parse_one):
//!   incremental, one line at a time decoding
//! - [`HeaderEncoder`]: writes a header section or trailer block

mod header_decoder;
mod header_encoder;

pub use header_decoder::LineStatus;
pub use header_encoder::HeaderEncoder;
