//! Typed ancillary-chunk fields (the "parse, don't just skip" decision
//! recorded in DESIGN.md). Values that encode colour/gamma information
//! are carried verbatim and never applied to pixels, per spec.md §1's
//! Non-goal on colour-space correction.

#[derive(Clone, Default, Debug, PartialEq)]
pub struct Metadata {
    /// gAMA: the raw 100000x-scaled gamma value.
    pub gamma: Option<u32>,
    /// cHRM: white point then R/G/B primaries, each (x, y) as
    /// 100000x-scaled integers.
    pub chromaticities: Option<Chromaticities>,
    /// sRGB: rendering intent byte (0..=3).
    pub srgb_rendering_intent: Option<u8>,
    /// iCCP: profile name plus the zlib-compressed profile, decompressed.
    pub icc_profile: Option<IccProfile>,
    /// bKGD: background colour, shape depends on the image's colour type.
    pub background: Option<Background>,
    /// pHYs: pixel density.
    pub physical_pixel_dimensions: Option<PhysicalPixelDimensions>,
    /// sBIT: significant bits per sample, as declared (1..=16 each).
    pub significant_bits: Option<Vec<u8>>,
    /// tIME: last modification time.
    pub modification_time: Option<ModificationTime>,
    /// tEXt/zTXt/iTXt, in file order, text decompressed where applicable.
    pub text: Vec<TextEntry>,
    /// Ancillary chunks not recognised by any of the above, kept opaque
    /// when `DecoderOptions::keep_unknown_chunks` is set.
    pub unknown_chunks: Vec<([u8; 4], Vec<u8>)>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Chromaticities {
    pub white_point: (u32, u32),
    pub red: (u32, u32),
    pub green: (u32, u32),
    pub blue: (u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IccProfile {
    pub name: String,
    pub profile: Vec<u8>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Background {
    Grayscale(u16),
    Rgb { r: u16, g: u16, b: u16 },
    PaletteIndex(u8),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PhysicalPixelDimensions {
    pub x_pixels_per_unit: u32,
    pub y_pixels_per_unit: u32,
    /// 0 = unspecified, 1 = metre.
    pub unit_is_meter: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModificationTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEntry {
    pub keyword: String,
    pub text: String,
    pub language_tag: Option<String>,
    pub translated_keyword: Option<String>,
}
