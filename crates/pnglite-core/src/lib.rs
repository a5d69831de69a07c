//! Primitives shared by every `pnglite-*` crate: the pixel data model
//! (C11), a big-endian byte cursor used by the chunk codec, and the two
//! checksum engines PNG depends on (CRC-32 for chunks, Adler-32 for the
//! zlib wrapper).

pub mod adler32;
pub mod bytes;
pub mod crc32;
pub mod pixel;

pub use adler32::Adler32;
pub use crc32::Crc32;
pub use pixel::{BitDepth, ColorType};

/// Maximum pixel count a decoder will allocate for without being told
/// otherwise (`DecoderOptions::max_pixels`). Chosen so that a 4-byte
/// RGBA image one can allocate at this cap is 4 GiB, a generous but
/// bounded default.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 30;

/// Multiply `width * height * bytes_per_pixel` using checked arithmetic,
/// per spec.md's "width x height x bytes-per-pixel must not overflow"
/// invariant and the §9 design note requiring checked arithmetic for
/// pixel-cap enforcement.
pub fn checked_pixel_bytes(width: u32, height: u32, bytes_per_pixel: u32) -> Option<u64> {
    let w = u64::from(width);
    let h = u64::from(height);
    let bpp = u64::from(bytes_per_pixel);
    w.checked_mul(h)?.checked_mul(bpp)
}
