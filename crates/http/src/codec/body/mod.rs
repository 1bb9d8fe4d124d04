//! Body framing.
//!
//! - [`LengthDecoder`]: accumulates a request body bounded by Content-Length
//! - [`ChunkedEncoder`]: frames response segments with chunked transfer encoding

mod chunked_encoder;
mod length_decoder;

pub use chunked_encoder::ChunkedEncoder;
pub use chunked_encoder::ChunkedItem;
pub use length_decoder::LengthDecoder;
