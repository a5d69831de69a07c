//! The pixel model (C11): which (colour type, bit depth) combinations are
//! legal, and how many samples make up one pixel at each.

/// PNG colour type, tagged with its on-the-wire byte value (IHDR byte 9).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ColorType {
    Grayscale,
    Rgb,
    Palette,
    GrayscaleAlpha,
    Rgba,
}

impl ColorType {
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Palette),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::Rgba),
            _ => None,
        }
    }

    pub const fn to_wire(self) -> u8 {
        match self {
            ColorType::Grayscale => 0,
            ColorType::Rgb => 2,
            ColorType::Palette => 3,
            ColorType::GrayscaleAlpha => 4,
            ColorType::Rgba => 6,
        }
    }

    /// Samples per pixel, per spec.md §4.10 (a palette index counts as
    /// one sample even though it expands to 3-4 output bytes via PLTE).
    pub const fn samples_per_pixel(self) -> u8 {
        match self {
            ColorType::Grayscale | ColorType::Palette => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    /// Bit depths legal for this colour type, per the spec.md §4.10 table.
    pub const fn allowed_bit_depths(self) -> &'static [u8] {
        match self {
            ColorType::Grayscale => &[1, 2, 4, 8, 16],
            ColorType::Palette => &[1, 2, 4, 8],
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => &[8, 16],
        }
    }

    pub fn is_bit_depth_valid(self, depth: u8) -> bool {
        self.allowed_bit_depths().contains(&depth)
    }

    pub const fn has_palette(self) -> bool {
        matches!(self, ColorType::Palette)
    }

    pub const fn has_alpha_channel(self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::Rgba)
    }
}

/// Bit depth of a single sample, as declared in IHDR.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum BitDepth {
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

impl BitDepth {
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(BitDepth::One),
            2 => Some(BitDepth::Two),
            4 => Some(BitDepth::Four),
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            _ => None,
        }
    }

    pub const fn to_wire(self) -> u8 {
        match self {
            BitDepth::One => 1,
            BitDepth::Two => 2,
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    pub const fn bits(self) -> u32 {
        self.to_wire() as u32
    }

    /// Bytes needed to hold one sample at this depth once unpacked to the
    /// in-memory representation (sub-byte samples are unpacked to a full
    /// byte; 16-bit samples need two).
    pub const fn unpacked_sample_bytes(self) -> usize {
        match self {
            BitDepth::Sixteen => 2,
            _ => 1,
        }
    }
}

/// Bytes needed for one packed scanline (the filter's view, before
/// unfiltering), per spec.md §4.10: `ceil(width * samples_per_pixel *
/// bit_depth / 8)`.
pub fn packed_row_bytes(width: u32, samples_per_pixel: u8, bit_depth: u8) -> u64 {
    let bits = u64::from(width) * u64::from(samples_per_pixel) * u64::from(bit_depth);
    bits.div_ceil(8)
}
