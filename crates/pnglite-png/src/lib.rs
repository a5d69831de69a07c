//! PNG chunk framing and the pixel pipeline (C9-C14): chunk codec,
//! scanline filters, Adam7 interlacing, and the decoder/encoder
//! pipelines that sit on top of `pnglite-inflate`/`pnglite-deflate`.

pub mod adam7;
pub mod chunk;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod filter;
pub mod image;
pub mod metadata;
pub mod options;
pub mod pixel;

pub use chunk::ChunkIter;
pub use errors::PngError;
pub use image::{Image, Interlace, PaletteEntry, Transparency};
pub use metadata::{
    Background, Chromaticities, IccProfile, ModificationTime, PhysicalPixelDimensions, TextEntry,
};
pub use options::{DecoderOptions, EncoderOptions, FilterStrategy};
pub use pnglite_core::{BitDepth, ColorType};

/// §6's public API surface: `decode(bytes) -> Image | Error`, default options.
pub fn decode(data: &[u8]) -> Result<Image, PngError> {
    decoder::decode(data, &DecoderOptions::default())
}

/// `decode` with caller-supplied options (max pixels, ancillary CRC policy, ...).
pub fn decode_with_options(data: &[u8], options: &DecoderOptions) -> Result<Image, PngError> {
    decoder::decode(data, options)
}

/// §6's public API surface: `encode(image, options) -> bytes | Error`.
pub fn encode(image: &Image, options: &EncoderOptions) -> Result<Vec<u8>, PngError> {
    encoder::encode(image, options)
}
