//! Per-direction configuration (§6, §9), matching the teacher's
//! `PngOptions` shape: a handful of named knobs plus a `chunk_handler`
//! callback for chunks the decoder doesn't itself parse.

use crate::chunk::Chunk;
use crate::errors::PngError;
use crate::image::Interlace;
use pnglite_core::DEFAULT_MAX_PIXELS;
use pnglite_deflate::CompressionLevel;

pub const DEFAULT_MAX_CHUNK_LEN: u64 = (1u64 << 31) - 1;

/// §4.12's filter-selection policy.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum FilterStrategy {
    /// Always filter type 0 (fastest, usually worst ratio).
    Fixed(crate::filter::FilterType),
    /// Per spec.md §4.9/§4.12's recommended heuristic: pick whichever of
    /// the five candidates minimises the sum of absolute differences.
    #[default]
    MinimumSumOfAbsoluteDifferences,
}

#[derive(Clone)]
pub struct DecoderOptions {
    /// Reject ancillary chunks with a bad CRC (critical chunks always
    /// are). §4.8: "on ancillary chunks, behaviour is configurable
    /// (default: reject)".
    pub confirm_ancillary_crc: bool,
    /// §9's open question on trailing bytes after IEND: default strict.
    pub strict_trailing_data: bool,
    /// Preserve unrecognised ancillary chunks as opaque `(type, bytes)`
    /// pairs instead of silently dropping them.
    pub keep_unknown_chunks: bool,
    pub max_pixels: u64,
    pub max_chunk_len: u64,
    /// Called for every chunk type this crate doesn't itself interpret,
    /// mirroring `zune_png`'s `chunk_handler` callback. Given the raw
    /// chunk; returning `Err` aborts the decode.
    pub chunk_handler: fn(&Chunk<'_>) -> Result<(), PngError>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            confirm_ancillary_crc: true,
            strict_trailing_data: true,
            keep_unknown_chunks: false,
            max_pixels: DEFAULT_MAX_PIXELS,
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            chunk_handler: |_| Ok(()),
        }
    }
}

impl DecoderOptions {
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = max;
        self
    }

    pub fn with_max_chunk_len(mut self, max: u64) -> Self {
        self.max_chunk_len = max;
        self
    }

    pub fn with_keep_unknown_chunks(mut self, keep: bool) -> Self {
        self.keep_unknown_chunks = keep;
        self
    }

    pub fn with_strict_trailing_data(mut self, strict: bool) -> Self {
        self.strict_trailing_data = strict;
        self
    }

    pub fn with_confirm_ancillary_crc(mut self, confirm: bool) -> Self {
        self.confirm_ancillary_crc = confirm;
        self
    }

    pub fn with_chunk_handler(mut self, handler: fn(&Chunk<'_>) -> Result<(), PngError>) -> Self {
        self.chunk_handler = handler;
        self
    }
}

#[derive(Copy, Clone, Debug)]
pub struct EncoderOptions {
    pub compression_level: CompressionLevel,
    pub filter_strategy: FilterStrategy,
    pub interlace: Interlace,
    /// IDAT payload is split into chunks of this size (§4.12: "typical
    /// cap 8192 or 32768 bytes").
    pub idat_chunk_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            compression_level: CompressionLevel::Default,
            filter_strategy: FilterStrategy::default(),
            interlace: Interlace::None,
            idat_chunk_size: 32 * 1024,
        }
    }
}

impl EncoderOptions {
    pub fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_filter_strategy(mut self, strategy: FilterStrategy) -> Self {
        self.filter_strategy = strategy;
        self
    }

    pub fn with_interlace(mut self, interlace: Interlace) -> Self {
        self.interlace = interlace;
        self
    }

    pub fn with_idat_chunk_size(mut self, size: usize) -> Self {
        self.idat_chunk_size = size;
        self
    }
}
