//! DEFLATE encoding and the encode half of zlib framing (RFC 1950/1951),
//! the encode side of the pnglite PNG codec's compression layer.

pub mod bitstream;
pub mod constants;
pub mod encoder;
pub mod errors;
pub mod huffman;
pub mod lz77;

pub use encoder::{deflate, encode_zlib, CompressionLevel};
pub use errors::DeflateError;
