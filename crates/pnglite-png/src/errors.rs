//! The closed error taxonomy (C14), one variant per failure kind named
//! in spec.md §7. Hand-written `Debug`/`Display`, matching
//! `zune_png::error::PngErrors`'s shape rather than pulling in
//! `thiserror`.

use core::fmt;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PngError {
    BadSignature,
    TruncatedInput,
    UnexpectedEof,

    ChunkTooLarge { length: u64, max: u64 },
    CrcMismatch { chunk_type: [u8; 4], expected: u32, found: u32 },
    InvalidChunkOrder(&'static str),
    DuplicateChunk(&'static str),
    MissingRequiredChunk(&'static str),

    InvalidIhdr(&'static str),
    UnsupportedInterlace(u8),

    InvalidPalette(&'static str),
    PaletteIndexOutOfRange { index: u8, palette_len: usize },

    InvalidFilter(u8),
    InvalidBlockType,
    InvalidHuffmanCode(&'static str),
    InvalidDistanceTooFar,
    InvalidBackReference(&'static str),

    UnsupportedZlibFeature(&'static str),
    ChecksumMismatch { expected: u32, found: u32 },

    TruncatedImage { expected: usize, found: usize },
    ExtraImageData { expected: usize, found: usize },
    TrailingData { offset: usize },

    ImageTooLarge { pixels: u64, max: u64 },
    DecompressedDataTooLarge { produced: usize, cap: usize },
    AllocationFailed,

    BufferOverflow,
}

impl fmt::Display for PngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngError::BadSignature => write!(f, "not a PNG file: bad 8-byte signature"),
            PngError::TruncatedInput => write!(f, "input ended before a complete chunk could be read"),
            PngError::UnexpectedEof => write!(f, "unexpected end of input"),
            PngError::ChunkTooLarge { length, max } => {
                write!(f, "chunk length {length} exceeds configured maximum {max}")
            }
            PngError::CrcMismatch { chunk_type, expected, found } => write!(
                f,
                "CRC mismatch in {:?} chunk: expected {expected:08x}, computed {found:08x}",
                String::from_utf8_lossy(chunk_type)
            ),
            PngError::InvalidChunkOrder(why) => write!(f, "invalid chunk order: {why}"),
            PngError::DuplicateChunk(which) => write!(f, "duplicate {which} chunk"),
            PngError::MissingRequiredChunk(which) => write!(f, "missing required {which} chunk"),
            PngError::InvalidIhdr(why) => write!(f, "invalid IHDR: {why}"),
            PngError::UnsupportedInterlace(m) => write!(f, "unsupported interlace method {m}"),
            PngError::InvalidPalette(why) => write!(f, "invalid palette: {why}"),
            PngError::PaletteIndexOutOfRange { index, palette_len } => write!(
                f,
                "palette index {index} out of range for a {palette_len}-entry palette"
            ),
            PngError::InvalidFilter(b) => write!(f, "unknown scanline filter byte {b}"),
            PngError::InvalidBlockType => write!(f, "invalid DEFLATE block type (11)"),
            PngError::InvalidHuffmanCode(why) => write!(f, "invalid Huffman code: {why}"),
            PngError::InvalidDistanceTooFar => {
                write!(f, "back-reference distance precedes start of stream")
            }
            PngError::InvalidBackReference(why) => write!(f, "invalid back-reference: {why}"),
            PngError::UnsupportedZlibFeature(feat) => write!(f, "unsupported zlib feature: {feat}"),
            PngError::ChecksumMismatch { expected, found } => write!(
                f,
                "Adler-32 mismatch: expected {expected:08x}, computed {found:08x}"
            ),
            PngError::TruncatedImage { expected, found } => write!(
                f,
                "inflated data too short: expected {expected} bytes, got {found}"
            ),
            PngError::ExtraImageData { expected, found } => write!(
                f,
                "inflated data too long: expected {expected} bytes, got {found}"
            ),
            PngError::TrailingData { offset } => {
                write!(f, "trailing data after IEND at offset {offset}")
            }
            PngError::ImageTooLarge { pixels, max } => {
                write!(f, "image has {pixels} pixels, exceeding the configured cap of {max}")
            }
            PngError::DecompressedDataTooLarge { produced, cap } => write!(
                f,
                "decompressed IDAT data reached {produced} bytes, exceeding the expected cap of {cap}"
            ),
            PngError::AllocationFailed => write!(f, "allocation failed"),
            PngError::BufferOverflow => write!(f, "fixed-size output buffer overflowed"),
        }
    }
}

impl std::error::Error for PngError {}

impl From<pnglite_inflate::InflateError> for PngError {
    fn from(e: pnglite_inflate::InflateError) -> Self {
        use pnglite_inflate::InflateError as E;
        match e {
            E::UnexpectedEof => PngError::UnexpectedEof,
            E::InvalidBlockType => PngError::InvalidBlockType,
            E::InvalidHuffmanCode(why) => PngError::InvalidHuffmanCode(why),
            E::InvalidDistanceTooFar => PngError::InvalidDistanceTooFar,
            E::InvalidBackReference(why) => PngError::InvalidBackReference(why),
            E::UnsupportedZlibFeature(why) => PngError::UnsupportedZlibFeature(why),
            E::ChecksumMismatch { expected, found } => PngError::ChecksumMismatch { expected, found },
            E::OutputTooLarge { produced, cap } => {
                PngError::DecompressedDataTooLarge { produced, cap }
            }
        }
    }
}

impl From<pnglite_deflate::DeflateError> for PngError {
    fn from(e: pnglite_deflate::DeflateError) -> Self {
        match e {
            pnglite_deflate::DeflateError::BufferOverflow => PngError::BufferOverflow,
        }
    }
}

impl From<pnglite_core::bytes::UnexpectedEof> for PngError {
    fn from(_: pnglite_core::bytes::UnexpectedEof) -> Self {
        PngError::UnexpectedEof
    }
}
