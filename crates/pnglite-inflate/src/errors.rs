use core::fmt;

/// Errors from the DEFLATE/zlib layer. Named the way spec.md §7 closes
/// the set for this layer; `PngErrors` (in `pnglite-png`) wraps these
/// rather than re-stating them.
#[derive(Clone, Eq, PartialEq)]
pub enum InflateError {
    UnexpectedEof,
    InvalidBlockType,
    InvalidHuffmanCode(&'static str),
    InvalidDistanceTooFar,
    InvalidBackReference(&'static str),
    UnsupportedZlibFeature(&'static str),
    ChecksumMismatch { expected: u32, found: u32 },
    /// Output reached a caller-supplied cap before the stream finished;
    /// used by `pnglite-png` to enforce `DecoderOptions::max_pixels`
    /// before allocating further. `produced` is the output length at the
    /// point the cap tripped; `cap` is `max_output_bytes` as passed to
    /// `inflate_capped`/`decode_zlib_capped`.
    OutputTooLarge { produced: usize, cap: usize },
}

impl fmt::Debug for InflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InflateError::UnexpectedEof => write!(f, "unexpected end of deflate stream"),
            InflateError::InvalidBlockType => write!(f, "BTYPE=11 is reserved and invalid"),
            InflateError::InvalidHuffmanCode(why) => write!(f, "invalid huffman code: {why}"),
            InflateError::InvalidDistanceTooFar => {
                write!(f, "back-reference distance precedes start of output")
            }
            InflateError::InvalidBackReference(why) => write!(f, "invalid back-reference: {why}"),
            InflateError::UnsupportedZlibFeature(what) => {
                write!(f, "unsupported zlib feature: {what}")
            }
            InflateError::ChecksumMismatch { expected, found } => write!(
                f,
                "adler-32 mismatch: expected {expected:08x}, computed {found:08x}"
            ),
            InflateError::OutputTooLarge { produced, cap } => {
                write!(f, "inflate output of {produced} bytes exceeded cap of {cap} bytes")
            }
        }
    }
}

impl fmt::Display for InflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for InflateError {}

impl From<crate::bitstream::UnexpectedEof> for InflateError {
    fn from(_: crate::bitstream::UnexpectedEof) -> Self {
        InflateError::UnexpectedEof
    }
}
