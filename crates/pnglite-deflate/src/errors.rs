use core::fmt;

/// Errors the deflate/zlib encoder can raise. In practice a growable
/// sink (the only kind this crate writes into) never runs out of
/// capacity; `BufferOverflow` exists for symmetry with spec.md §4.2 and
/// is reachable only through [`crate::bitstream::BitWriter`]'s fixed-size
/// sink variants, which this crate doesn't currently expose.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DeflateError {
    BufferOverflow,
}

impl fmt::Display for DeflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeflateError::BufferOverflow => write!(f, "fixed-size output buffer overflowed"),
        }
    }
}

impl std::error::Error for DeflateError {}
