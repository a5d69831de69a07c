//! DEFLATE inflate and zlib decoding (RFC 1950/1951), the decode half of
//! the pnglite PNG codec's compression layer.

pub mod bitstream;
pub mod constants;
pub mod decoder;
pub mod errors;
pub mod huffman;

pub use decoder::{decode_zlib, decode_zlib_capped, inflate, inflate_capped};
pub use errors::InflateError;
