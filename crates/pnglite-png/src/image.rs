//! The public data model (§3): a decoded/to-be-encoded `Image`, its
//! palette, transparency, and the interlace method it was (or will be)
//! stored with.

use crate::metadata::Metadata;
use pnglite_core::{BitDepth, ColorType};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Interlace {
    None,
    Adam7,
}

impl Interlace {
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Interlace::None),
            1 => Some(Interlace::Adam7),
            _ => None,
        }
    }

    pub const fn to_wire(self) -> u8 {
        match self {
            Interlace::None => 0,
            Interlace::Adam7 => 1,
        }
    }
}

/// A tRNS chunk's meaning depends on the image's colour type (§6).
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Transparency {
    /// Palette per-entry alpha, length <= palette length.
    Palette(Vec<u8>),
    /// Grayscale transparent sample value.
    Grayscale(u16),
    /// RGB transparent colour key.
    Rgb { r: u16, g: u16, b: u16 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub color_type: ColorType,
    pub bit_depth: BitDepth,
    pub interlace: Interlace,
    pub palette: Option<Vec<PaletteEntry>>,
    pub transparency: Option<Transparency>,
    /// Row-major, top-down samples at the image's native bit depth,
    /// one `u16` slot per sample (so a 1-bit grayscale pixel is stored
    /// as 0 or 1, not scaled up to 0/255 -- scaling is a presentation
    /// concern the Non-goals exclude). Length is always
    /// `width * height * color_type.samples_per_pixel()`.
    pub samples: Vec<u16>,
    pub metadata: Metadata,
}

impl Image {
    pub fn samples_per_pixel(&self) -> u8 {
        self.color_type.samples_per_pixel()
    }

    /// The samples at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u16]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let spp = self.samples_per_pixel() as usize;
        let row_start = (y as usize) * (self.width as usize) * spp;
        let idx = row_start + (x as usize) * spp;
        self.samples.get(idx..idx + spp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;

    #[test]
    fn pixel_reads_the_right_samples() {
        let image = Image {
            width: 2,
            height: 2,
            color_type: ColorType::Rgb,
            bit_depth: BitDepth::Eight,
            interlace: Interlace::None,
            palette: None,
            transparency: None,
            samples: vec![
                0, 0, 0, // (0,0)
                1, 1, 1, // (1,0)
                2, 2, 2, // (0,1)
                3, 3, 3, // (1,1)
            ],
            metadata: Metadata::default(),
        };
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0].as_slice()));
        assert_eq!(image.pixel(1, 1), Some([3, 3, 3].as_slice()));
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let image = Image {
            width: 1,
            height: 1,
            color_type: ColorType::Grayscale,
            bit_depth: BitDepth::Eight,
            interlace: Interlace::None,
            palette: None,
            transparency: None,
            samples: vec![5],
            metadata: Metadata::default(),
        };
        assert!(image.pixel(1, 0).is_none());
        assert!(image.pixel(0, 1).is_none());
    }
}
